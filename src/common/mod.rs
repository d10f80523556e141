pub mod upload;

pub use upload::ImageUpload;
