use image::{DynamicImage, GenericImageView};
use tracing::info;

use crate::common::ImageUpload;
use crate::config::ValidationLimits;
use crate::error::ValidationError;

/// What the uploaded image is going to be used for. Each use has its own
/// minimum pixel dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageUse {
    Portrait,
    Garment,
}

#[derive(Debug, Clone)]
pub struct ImageValidator {
    limits: ValidationLimits,
}

impl Default for ImageValidator {
    fn default() -> Self {
        Self::new(ValidationLimits::default())
    }
}

impl ImageValidator {
    pub fn new(limits: ValidationLimits) -> Self {
        Self { limits }
    }

    pub fn min_dimension(&self, image_use: ImageUse) -> u32 {
        match image_use {
            ImageUse::Portrait => self.limits.min_portrait_dimension,
            ImageUse::Garment => self.limits.min_garment_dimension,
        }
    }

    /// Checks format, declared size and pixel dimensions. The upload is left
    /// untouched and can be decoded again afterwards.
    pub fn validate(
        &self,
        upload: &ImageUpload,
        image_use: ImageUse,
    ) -> Result<(), ValidationError> {
        self.validate_and_decode(upload, image_use).map(|_| ())
    }

    /// Same checks as [`validate`](Self::validate), handing back the decoded
    /// image so the pipeline does not pay for a second decode.
    pub fn validate_and_decode(
        &self,
        upload: &ImageUpload,
        image_use: ImageUse,
    ) -> Result<DynamicImage, ValidationError> {
        let result = self.check(upload, image_use);
        if let Err(e) = &result {
            info!("Rejected upload '{}': {}", upload.filename(), e);
        }
        result
    }

    fn check(
        &self,
        upload: &ImageUpload,
        image_use: ImageUse,
    ) -> Result<DynamicImage, ValidationError> {
        self.check_extension(upload)?;

        if upload.declared_len() > self.limits.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size: upload.declared_len(),
                max_mib: self.limits.max_file_size / (1024 * 1024),
            });
        }

        let image = image::load_from_memory(upload.bytes()).map_err(|e| {
            ValidationError::CorruptImage {
                reason: e.to_string(),
            }
        })?;

        let (width, height) = image.dimensions();
        let min = self.min_dimension(image_use);
        if width < min || height < min {
            return Err(ValidationError::ImageTooSmall { width, height, min });
        }

        Ok(image)
    }

    fn check_extension(&self, upload: &ImageUpload) -> Result<(), ValidationError> {
        let extension = upload.extension().unwrap_or_default();
        let allowed = self
            .limits
            .allowed_extensions
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(&extension));

        if allowed {
            Ok(())
        } else {
            Err(ValidationError::UnsupportedFormat {
                extension,
                supported: self.limits.allowed_extensions.join(", "),
            })
        }
    }
}
