use crate::error::{AppError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

const POLYGON_TYPE: &str = "Polygon";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// GeoJSON-style polygon: a list of linear rings of `[lng, lat]` positions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Polygon {
    #[serde(rename = "type", default = "default_polygon_type")]
    pub kind: String,
    pub coordinates: Vec<Vec<Vec<f64>>>,
}

fn default_polygon_type() -> String {
    POLYGON_TYPE.to_string()
}

impl Polygon {
    pub fn validate(&self) -> Result<()> {
        if self.kind != POLYGON_TYPE {
            return Err(AppError::InvalidInput(format!(
                "Unsupported geometry type '{}', expected '{}'",
                self.kind, POLYGON_TYPE
            )));
        }

        if self.coordinates.is_empty() {
            return Err(AppError::InvalidInput(
                "Polygon must contain at least one ring".to_string(),
            ));
        }

        for (index, ring) in self.coordinates.iter().enumerate() {
            // A closed ring repeats its first position, so a triangle has four.
            if ring.len() < 4 {
                return Err(AppError::InvalidInput(format!(
                    "Ring {} must have at least 4 positions, got {}",
                    index,
                    ring.len()
                )));
            }
            if let Some(position) = ring.iter().find(|position| position.len() < 2) {
                return Err(AppError::InvalidInput(format!(
                    "Ring {} has a position with {} value(s), expected [lng, lat]",
                    index,
                    position.len()
                )));
            }
        }

        Ok(())
    }
}

/// Inclusive start, exclusive end, as the imagery catalog filters by date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub const DEFAULT_START: &'static str = "2023-01-01";
    pub const DEFAULT_END: &'static str = "2023-12-31";

    pub fn parse(start: &str, end: &str) -> Result<Self> {
        let start = parse_date("startDate", start)?;
        let end = parse_date("endDate", end)?;

        if start >= end {
            return Err(AppError::InvalidInput(format!(
                "startDate {} must be before endDate {}",
                start, end
            )));
        }

        Ok(Self { start, end })
    }

    pub fn start_string(&self) -> String {
        self.start.format(DATE_FORMAT).to_string()
    }

    pub fn end_string(&self) -> String {
        self.end.format(DATE_FORMAT).to_string()
    }
}

fn parse_date(field: &str, raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|e| {
        AppError::InvalidInput(format!("{} '{}' is not a YYYY-MM-DD date: {}", field, raw, e))
    })
}
