pub mod geometry;
pub mod report;
pub mod vegetation;

pub use geometry::{DateRange, Polygon};
pub use report::{ApplyStatus, SchemaApplyReport};
pub use vegetation::{AnalysisOutcome, NoImagery, VegetationStats};
