use crate::imagery::PlatformError;
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Imagery platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    pub const AUTHENTICATION_DETAIL: &'static str = "GEE Authentication Failed";
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            AppError::InvalidInput(message) => (StatusCode::UNPROCESSABLE_ENTITY, message),
            AppError::Platform(PlatformError::Authentication(message)) => {
                tracing::error!("Imagery platform authentication failed: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Self::AUTHENTICATION_DETAIL.to_string(),
                )
            }
            AppError::Platform(err @ PlatformError::Timeout(_)) => {
                tracing::error!("{}", err);
                (StatusCode::GATEWAY_TIMEOUT, err.to_string())
            }
            AppError::Platform(PlatformError::Computation(message)) => {
                tracing::error!("Analysis error: {}", message);
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
            AppError::Config(message) => {
                tracing::error!("Configuration error: {}", message);
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
            AppError::Io(e) => {
                tracing::error!("IO error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        };

        let body = json!({
            "detail": detail
        });

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
