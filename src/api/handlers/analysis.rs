use crate::api::dto::analysis::{AnalysisRequest, AnalysisResponse};
use crate::api::routes::AppState;
use crate::error::Result;
use crate::imagery::ImageryPlatform;
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};

pub async fn analyze<P: ImageryPlatform>(
    State(state): State<AppState<P>>,
    payload: std::result::Result<Json<AnalysisRequest>, JsonRejection>,
) -> Result<Json<AnalysisResponse>> {
    let Json(req) = payload?;
    let outcome = state
        .analysis_service
        .analyze(req.polygon, &req.start_date, &req.end_date)
        .await?;
    Ok(Json(AnalysisResponse::from(outcome)))
}
