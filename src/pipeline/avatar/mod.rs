pub mod geometry;
pub mod photo;
pub mod synthesizer;

pub use geometry::{generate_model, AvatarModelBundle, PbrMaterial};
pub use photo::{PhotoAnalysis, PhotoAnalyzer};
pub use synthesizer::{AvatarConfig, AvatarConfigSynthesizer, AvatarMeasurements, BodyProportions};
