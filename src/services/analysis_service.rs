use crate::error::Result;
use crate::imagery::{ImageQuery, ImageryPlatform};
use crate::models::{AnalysisOutcome, DateRange, NoImagery, Polygon, VegetationStats};

const SQUARE_METERS_PER_HECTARE: f64 = 10_000.0;

/// Translates an analysis request into platform queries and shapes the answer.
///
/// The platform handle is decided once at startup. Without one, every request
/// is answered with [`VegetationStats::mock`] until the process restarts.
#[derive(Clone)]
pub struct AnalysisService<P> {
    platform: Option<P>,
    cloud_cover_threshold: f64,
}

impl<P: ImageryPlatform> AnalysisService<P> {
    pub fn new(platform: Option<P>, cloud_cover_threshold: f64) -> Self {
        Self {
            platform,
            cloud_cover_threshold,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.platform.is_none()
    }

    pub async fn analyze(
        &self,
        polygon: Polygon,
        start_date: &str,
        end_date: &str,
    ) -> Result<AnalysisOutcome> {
        let Some(platform) = &self.platform else {
            tracing::debug!("Imagery platform unavailable, returning mock results");
            return Ok(AnalysisOutcome::Stats(VegetationStats::mock()));
        };

        polygon.validate()?;
        let dates = DateRange::parse(start_date, end_date)?;
        let query = ImageQuery {
            geometry: polygon,
            dates,
            cloud_cover_threshold: self.cloud_cover_threshold,
        };

        let collection_size = platform.collection_size(&query).await?;
        tracing::info!(
            "Matched {} image(s) between {} and {}",
            collection_size,
            query.dates.start,
            query.dates.end
        );
        if collection_size == 0 {
            return Ok(AnalysisOutcome::NoImagery(NoImagery::default()));
        }

        let stats = platform.index_statistics(&query).await?;
        let area = platform.area_square_meters(&query.geometry).await?;

        Ok(AnalysisOutcome::Stats(VegetationStats {
            area_hectares: round_to(area / SQUARE_METERS_PER_HECTARE, 2),
            mean_ndvi: round_to(stats.mean.unwrap_or(0.0), 3),
            min_ndvi: round_to(stats.min.unwrap_or(0.0), 3),
            max_ndvi: round_to(stats.max.unwrap_or(0.0), 3),
            collection_size,
            status: "Success".to_string(),
        }))
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
