pub mod avatar;
pub mod fields;
pub mod garment;
pub mod services;
pub mod validation;

pub use fields::FieldMap;
pub use services::{avatar_pipeline, garment_pipeline, AvatarPipeline, GarmentPipeline};
pub use validation::{ImageUse, ImageValidator};
