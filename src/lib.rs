pub mod common;
pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;

pub use common::ImageUpload;
pub use config::Settings;
pub use error::{AnalysisDegraded, AppError, CompositionError, ValidationError};
pub use logging::init_logging;
pub use pipeline::avatar::{AvatarConfig, AvatarMeasurements, AvatarModelBundle};
pub use pipeline::garment::{GarmentAttributes, GarmentRecord};
pub use pipeline::services::{
    AvatarCreationRequest, AvatarCreationResponse, GarmentUploadRequest, GarmentUploadResponse,
};
pub use pipeline::{avatar_pipeline, garment_pipeline};
