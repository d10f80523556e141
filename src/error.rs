use thiserror::Error;

// Main Application Error Type

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation Error: {0}")]
    Validation(#[from] ValidationError),
    #[error("Composition Error: {0}")]
    Composition(#[from] CompositionError),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Analysis worker failed: {0}")]
    Worker(String),
    #[error("Analysis timed out")]
    Timeout,
}

impl AppError {
    /// Stable name of the failure, suitable for logs and API payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(e) => e.kind(),
            AppError::Composition(_) => "CompositionError",
            AppError::Config(_) => "ConfigError",
            AppError::Worker(_) => "WorkerError",
            AppError::Timeout => "Timeout",
        }
    }

    /// True when the caller can fix the request and try again.
    pub fn is_client_error(&self) -> bool {
        matches!(self, AppError::Validation(_) | AppError::Composition(_))
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<tower::BoxError> for AppError {
    fn from(err: tower::BoxError) -> Self {
        if err.is::<tower::timeout::error::Elapsed>() {
            return AppError::Timeout;
        }
        match err.downcast::<AppError>() {
            Ok(app_error) => *app_error,
            Err(other) => AppError::Worker(other.to_string()),
        }
    }
}

// Upload Validation Error Type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Unsupported file format '{extension}'. Supported: {supported}")]
    UnsupportedFormat { extension: String, supported: String },
    #[error("File too large ({size} bytes). Maximum size: {max_mib}MB")]
    FileTooLarge { size: u64, max_mib: u64 },
    #[error("Invalid image file: {reason}")]
    CorruptImage { reason: String },
    #[error("Image too small ({width}x{height}). Minimum dimensions: {min}x{min} pixels")]
    ImageTooSmall { width: u32, height: u32, min: u32 },
}

impl ValidationError {
    pub fn kind(&self) -> &'static str {
        match self {
            ValidationError::UnsupportedFormat { .. } => "UnsupportedFormat",
            ValidationError::FileTooLarge { .. } => "FileTooLarge",
            ValidationError::CorruptImage { .. } => "CorruptImage",
            ValidationError::ImageTooSmall { .. } => "ImageTooSmall",
        }
    }
}

/// A heuristic could not compute its statistic. Never leaves the extractor
/// that raised it: the extractor swaps in its fallback value instead.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{extractor} degraded: {reason}")]
pub struct AnalysisDegraded {
    pub extractor: &'static str,
    pub reason: String,
}

impl AnalysisDegraded {
    pub fn new(extractor: &'static str, reason: impl Into<String>) -> Self {
        Self {
            extractor,
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompositionError {
    #[error("Field '{field}' must be {expected}")]
    InvalidField {
        field: String,
        expected: &'static str,
    },
    #[error("No valid updates provided")]
    NoValidUpdates,
}

impl CompositionError {
    pub fn invalid(field: impl Into<String>, expected: &'static str) -> Self {
        CompositionError::InvalidField {
            field: field.into(),
            expected,
        }
    }
}
