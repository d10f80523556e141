pub mod avatar_service;
pub mod factory;
pub mod garment_service;

pub use avatar_service::{AvatarCreationRequest, AvatarCreationResponse, AvatarCreationService};
pub use factory::{avatar_pipeline, garment_pipeline, AvatarPipeline, GarmentPipeline};
pub use garment_service::{GarmentAnalysisService, GarmentUploadRequest, GarmentUploadResponse};
