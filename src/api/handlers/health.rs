use crate::api::dto::health::HealthResponse;
use axum::Json;

pub const SERVICE_NAME: &str = "NDVI Engine";

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: SERVICE_NAME,
    })
}
