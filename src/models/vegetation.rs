use serde::{Deserialize, Serialize};

/// Body of a successful `/analyze` response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum AnalysisOutcome {
    Stats(VegetationStats),
    NoImagery(NoImagery),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VegetationStats {
    #[serde(rename = "areaHectares")]
    pub area_hectares: f64,
    #[serde(rename = "meanNDVI")]
    pub mean_ndvi: f64,
    #[serde(rename = "minNDVI")]
    pub min_ndvi: f64,
    #[serde(rename = "maxNDVI")]
    pub max_ndvi: f64,
    #[serde(rename = "collectionSize")]
    pub collection_size: u64,
    pub status: String,
}

impl VegetationStats {
    pub const MOCK_STATUS: &'static str = "Mock Results (GEE Not Auth)";

    /// Fixed placeholder returned while the imagery platform is unavailable.
    pub fn mock() -> Self {
        Self {
            area_hectares: 12.5,
            mean_ndvi: 0.45,
            min_ndvi: 0.1,
            max_ndvi: 0.8,
            collection_size: 0,
            status: Self::MOCK_STATUS.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NoImagery {
    pub error: String,
    #[serde(rename = "collectionSize")]
    pub collection_size: u64,
}

impl Default for NoImagery {
    fn default() -> Self {
        Self {
            error: "No images found".to_string(),
            collection_size: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn mock_serializes_with_wire_names() {
        let value = serde_json::to_value(AnalysisOutcome::Stats(VegetationStats::mock())).unwrap();
        assert_eq!(
            value,
            json!({
                "areaHectares": 12.5,
                "meanNDVI": 0.45,
                "minNDVI": 0.1,
                "maxNDVI": 0.8,
                "collectionSize": 0,
                "status": "Mock Results (GEE Not Auth)"
            })
        );
    }

    #[test]
    fn no_imagery_has_no_statistics() {
        let value = serde_json::to_value(AnalysisOutcome::NoImagery(NoImagery::default())).unwrap();
        assert_eq!(value, json!({"error": "No images found", "collectionSize": 0}));
        assert!(value.get("meanNDVI").is_none());
    }
}
