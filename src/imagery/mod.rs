//! Boundary to the remote satellite-imagery analytics platform.
//!
//! The service only ever talks to the platform through [`ImageryPlatform`],
//! so request handling can be exercised without network access.

pub mod credentials;
pub mod earth_engine;
pub mod expression;

pub use credentials::{ServiceAccountKey, TokenSource};
pub use earth_engine::EarthEngineClient;

use crate::models::{DateRange, Polygon};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Sentinel-2 top-of-atmosphere collection, harmonized across baselines.
pub const COLLECTION_ID: &str = "COPERNICUS/S2_HARMONIZED";
pub const NIR_BAND: &str = "B8";
pub const RED_BAND: &str = "B4";
pub const INDEX_BAND: &str = "NDVI";
pub const CLOUD_COVER_PROPERTY: &str = "CLOUDY_PIXEL_PERCENTAGE";
pub const DEFAULT_CLOUD_COVER_THRESHOLD: f64 = 20.0;
pub const SCALE_METERS: f64 = 10.0;
pub const MAX_PIXELS: f64 = 1e9;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlatformError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Imagery platform did not answer within {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    Computation(String),
}

impl PlatformError {
    /// Classifies a structured error answer from the platform.
    pub fn from_status(http_status: u16, status: Option<&str>, message: String) -> Self {
        if matches!(http_status, 401 | 403)
            || matches!(status, Some("UNAUTHENTICATED") | Some("PERMISSION_DENIED"))
        {
            return Self::Authentication(message);
        }
        Self::from_message(message)
    }

    /// Best-effort classification when only a message is available.
    pub fn from_message(message: String) -> Self {
        if message.contains("Authentication") || message.contains("credential") {
            Self::Authentication(message)
        } else {
            Self::Computation(message)
        }
    }
}

pub type PlatformResult<T> = std::result::Result<T, PlatformError>;

pub(crate) fn transport_error(err: reqwest::Error, timeout: Duration) -> PlatformError {
    if err.is_timeout() {
        PlatformError::Timeout(timeout)
    } else {
        PlatformError::Computation(format!("Imagery platform request failed: {}", err))
    }
}

/// Catalog filter for one analysis request.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageQuery {
    pub geometry: Polygon,
    pub dates: DateRange,
    /// Images with a cloud-cover percentage at or above this are excluded.
    pub cloud_cover_threshold: f64,
}

/// Region statistics of the median index composite. The platform omits a
/// statistic when no pixel inside the region was valid.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IndexStatistics {
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

pub trait ImageryPlatform: Clone + Send + Sync + 'static {
    /// Number of catalog images matching the query.
    fn collection_size(
        &self,
        query: &ImageQuery,
    ) -> impl Future<Output = PlatformResult<u64>> + Send;

    /// Mean/min/max of the per-pixel median vegetation index over the query geometry.
    fn index_statistics(
        &self,
        query: &ImageQuery,
    ) -> impl Future<Output = PlatformResult<IndexStatistics>> + Send;

    /// Geodesic area of the polygon in square meters.
    fn area_square_meters(
        &self,
        geometry: &Polygon,
    ) -> impl Future<Output = PlatformResult<f64>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_auth_statuses_are_authentication_errors() {
        let err = PlatformError::from_status(401, None, "Request had invalid credentials".into());
        assert!(matches!(err, PlatformError::Authentication(_)));

        let err = PlatformError::from_status(400, Some("PERMISSION_DENIED"), "denied".into());
        assert!(matches!(err, PlatformError::Authentication(_)));
    }

    #[test]
    fn message_fallback_detects_authentication() {
        let err = PlatformError::from_status(500, None, "Authentication token expired".into());
        assert!(matches!(err, PlatformError::Authentication(_)));

        let err = PlatformError::from_message("missing credential file".into());
        assert!(matches!(err, PlatformError::Authentication(_)));
    }

    #[test]
    fn other_failures_keep_their_message() {
        let err = PlatformError::from_status(400, Some("INVALID_ARGUMENT"), "Image.select: bad band".into());
        assert_eq!(err, PlatformError::Computation("Image.select: bad band".into()));
        assert_eq!(err.to_string(), "Image.select: bad band");
    }
}
