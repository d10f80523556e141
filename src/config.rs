use serde::Deserialize;
use std::path::Path;

use crate::error::AppError;

const ENV_PREFIX: &str = "WARDROBE";
const ENV_LIST_SEPARATOR: &str = ",";
/// Settings that hold lists; their environment values are comma separated.
const ENV_LIST_KEYS: [&str; 1] = ["validation.allowed_extensions"];

/// Every tunable of the vision pipeline. Loaded once at startup and shared
/// read-only between requests.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub validation: ValidationLimits,
    pub garment: GarmentThresholds,
    pub avatar: AvatarDefaults,
    pub worker: WorkerSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ValidationLimits {
    pub allowed_extensions: Vec<String>,
    pub max_file_size: u64,
    pub min_portrait_dimension: u32,
    pub min_garment_dimension: u32,
}

/// Numeric cut-offs for the garment heuristics. Replacing a heuristic with a
/// trained model only needs to touch the extractor reading these.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GarmentThresholds {
    pub quantize_size: u32,
    pub sample_stride: usize,
    pub max_dominant_colors: usize,

    pub wide_aspect_ratio: f64,
    pub tall_aspect_ratio: f64,
    pub wide_confidence: f32,
    pub tall_confidence: f32,
    pub default_confidence: f32,

    pub light_style_luminance: f64,
    pub dark_style_luminance: f64,

    pub patterned_variance: f64,
    pub textured_variance: f64,
    pub geometric_variance: f64,

    pub denim_variance: f64,
    pub cotton_channel_min: f64,
    pub denim_confidence: f32,
    pub cotton_confidence: f32,
    pub polyester_confidence: f32,

    pub daytime_luminance: f64,
    pub evening_luminance: f64,

    pub warm_season_intensity: f64,
    pub cold_season_intensity: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AvatarDefaults {
    pub height: f64,
    pub build: String,
    pub skin_tone: String,
    pub hair_color: String,
    pub eye_color: String,
    pub weight: f64,
    pub chest: f64,
    pub waist: f64,
    pub hips: f64,
    pub shoulder_width: f64,
    pub skin_tone_thresholds: SkinToneThresholds,
}

/// Minimum (R, G, B) averages for each skin tone class, checked lightest
/// first. Anything below `medium_dark` is classified as dark.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SkinToneThresholds {
    pub light: [f64; 3],
    pub medium: [f64; 3],
    pub medium_dark: [f64; 3],
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WorkerSettings {
    pub max_concurrent_analyses: usize,
    /// Zero disables the per-request timeout.
    pub analysis_timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            allowed_extensions: ["jpg", "jpeg", "png", "webp"]
                .into_iter()
                .map(String::from)
                .collect(),
            max_file_size: 10 * 1024 * 1024,
            min_portrait_dimension: 200,
            min_garment_dimension: 100,
        }
    }
}

impl Default for GarmentThresholds {
    fn default() -> Self {
        Self {
            quantize_size: 150,
            sample_stride: 10,
            max_dominant_colors: 3,

            wide_aspect_ratio: 1.5,
            tall_aspect_ratio: 0.7,
            wide_confidence: 0.6,
            tall_confidence: 0.7,
            default_confidence: 0.5,

            light_style_luminance: 200.0,
            dark_style_luminance: 100.0,

            patterned_variance: 1000.0,
            textured_variance: 500.0,
            geometric_variance: 800.0,

            denim_variance: 800.0,
            cotton_channel_min: 200.0,
            denim_confidence: 0.6,
            cotton_confidence: 0.5,
            polyester_confidence: 0.4,

            daytime_luminance: 180.0,
            evening_luminance: 120.0,

            warm_season_intensity: 150.0,
            cold_season_intensity: 120.0,
        }
    }
}

impl Default for AvatarDefaults {
    fn default() -> Self {
        Self {
            height: 170.0,
            build: "medium".to_string(),
            skin_tone: "medium".to_string(),
            hair_color: "brown".to_string(),
            eye_color: "brown".to_string(),
            weight: 70.0,
            chest: 90.0,
            waist: 75.0,
            hips: 95.0,
            shoulder_width: 40.0,
            skin_tone_thresholds: SkinToneThresholds::default(),
        }
    }
}

impl Default for SkinToneThresholds {
    fn default() -> Self {
        Self {
            light: [200.0, 180.0, 160.0],
            medium: [160.0, 130.0, 100.0],
            medium_dark: [120.0, 90.0, 70.0],
        }
    }
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            max_concurrent_analyses: 4,
            analysis_timeout_ms: 30_000,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

fn environment() -> config::Environment {
    ENV_LIST_KEYS.iter().fold(
        config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
            .list_separator(ENV_LIST_SEPARATOR),
        |env, key| env.with_list_parse_key(key),
    )
}

impl Settings {
    /// Layers an optional settings file and `WARDROBE__*` environment
    /// variables over the built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        Self::load_with(path, environment())
    }

    fn load_with(path: Option<&Path>, env: config::Environment) -> Result<Self, AppError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder = builder.add_source(env);

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), AppError> {
        let garment = &self.garment;

        if self.validation.allowed_extensions.is_empty() {
            return Err(AppError::Config(
                "At least one image extension must be allowed".to_string(),
            ));
        }

        if garment.quantize_size == 0 || garment.sample_stride == 0 {
            return Err(AppError::Config(
                "Quantize size and sample stride must be greater than 0".to_string(),
            ));
        }

        if garment.max_dominant_colors == 0 {
            return Err(AppError::Config(
                "At least one dominant color must be reported".to_string(),
            ));
        }

        if garment.tall_aspect_ratio >= garment.wide_aspect_ratio {
            return Err(AppError::Config(
                "Tall aspect ratio must be below the wide aspect ratio".to_string(),
            ));
        }

        if garment.textured_variance > garment.patterned_variance {
            return Err(AppError::Config(
                "Textured variance must not exceed patterned variance".to_string(),
            ));
        }

        let confidences = [
            garment.wide_confidence,
            garment.tall_confidence,
            garment.default_confidence,
            garment.denim_confidence,
            garment.cotton_confidence,
            garment.polyester_confidence,
        ];
        if confidences.iter().any(|c| !(0.0..=1.0).contains(c)) {
            return Err(AppError::Config(
                "Confidence values must be between 0.0 and 1.0".to_string(),
            ));
        }

        if self.avatar.height <= 0.0 {
            return Err(AppError::Config(
                "Default avatar height must be positive".to_string(),
            ));
        }

        if self.worker.max_concurrent_analyses == 0 {
            return Err(AppError::Config(
                "Worker concurrency must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn with_max_concurrent_analyses(mut self, limit: usize) -> Self {
        self.worker.max_concurrent_analyses = limit;
        self
    }

    pub fn with_analysis_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.worker.analysis_timeout_ms = timeout_ms;
        self
    }
}
