pub mod analyzer;
pub mod attributes;
pub mod composer;
pub mod extractors;
pub mod palette;
pub mod stats;

pub use analyzer::GarmentAnalyzer;
pub use attributes::{GarmentAttributes, GarmentCategory, GarmentClassification};
pub use composer::{compose_record, GarmentMetadata, GarmentRecord};
