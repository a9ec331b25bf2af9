use crate::models::{AnalysisOutcome, DateRange, Polygon};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct AnalysisRequest {
    pub polygon: Polygon,
    #[serde(rename = "startDate", default = "default_start_date")]
    pub start_date: String,
    #[serde(rename = "endDate", default = "default_end_date")]
    pub end_date: String,
}

fn default_start_date() -> String {
    DateRange::DEFAULT_START.to_string()
}

fn default_end_date() -> String {
    DateRange::DEFAULT_END.to_string()
}

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub success: bool,
    pub data: AnalysisOutcome,
}

impl From<AnalysisOutcome> for AnalysisResponse {
    fn from(data: AnalysisOutcome) -> Self {
        Self {
            success: true,
            data,
        }
    }
}
