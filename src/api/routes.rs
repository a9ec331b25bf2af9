use super::handlers::{analysis, health};
use super::middleware::cors::add_cors;
use crate::imagery::ImageryPlatform;
use crate::services::AnalysisService;
use axum::{
    Router,
    routing::{get, post},
};

#[derive(Clone)]
pub struct AppState<P> {
    pub analysis_service: AnalysisService<P>,
}

pub fn create_router<P: ImageryPlatform>(analysis_service: AnalysisService<P>) -> Router {
    let state = AppState { analysis_service };

    let api_routes = Router::new()
        // Health check
        .route("/", get(health::health_check))
        // Vegetation index
        .route("/analyze", post(analysis::analyze::<P>))
        .with_state(state);

    add_cors(api_routes)
}
