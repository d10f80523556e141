use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

use super::photo::PhotoAnalysis;
use crate::config::AvatarDefaults;
use crate::error::CompositionError;
use crate::pipeline::fields::{number_field, object_field, string_field, FieldMap};

const HEAD_RATIO: f64 = 0.125;
const TORSO_RATIO: f64 = 0.375;
const LEG_RATIO: f64 = 0.5;
const ARM_RATIO: f64 = 0.375;
const SHOULDER_RATIO: f64 = 0.235;
const HIP_RATIO: f64 = 0.188;

/// Derived, never accepted from callers.
const PROPORTIONS_KEY: &str = "body_proportions";

/// Fields a caller may change on an existing avatar config.
pub const UPDATABLE_FIELDS: [&str; 7] = [
    "height",
    "build",
    "skin_tone",
    "hair_color",
    "eye_color",
    "measurements",
    "preferences",
];

/// User-supplied body measurements in centimetres (weight in kg).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvatarMeasurements {
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub chest: Option<f64>,
    pub waist: Option<f64>,
    pub hips: Option<f64>,
    pub shoulder_width: Option<f64>,
}

impl AvatarMeasurements {
    pub fn from_map(map: &FieldMap) -> Result<Self, CompositionError> {
        Ok(Self {
            height: number_field(map, "height")?,
            weight: number_field(map, "weight")?,
            chest: number_field(map, "chest")?,
            waist: number_field(map, "waist")?,
            hips: number_field(map, "hips")?,
            shoulder_width: number_field(map, "shoulder_width")?,
        })
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyProportions {
    pub head_height: f64,
    pub torso_height: f64,
    pub leg_height: f64,
    pub arm_length: f64,
    pub shoulder_width: f64,
    pub hip_width_ratio: f64,
}

impl BodyProportions {
    pub fn derive(height: f64, shoulder_width: Option<f64>, hips: Option<f64>) -> Self {
        Self {
            head_height: height * HEAD_RATIO,
            torso_height: height * TORSO_RATIO,
            leg_height: height * LEG_RATIO,
            arm_length: height * ARM_RATIO,
            shoulder_width: shoulder_width.unwrap_or(height * SHOULDER_RATIO),
            hip_width_ratio: hips.unwrap_or(height * HIP_RATIO) / height,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvatarConfig {
    pub height: f64,
    pub build: String,
    pub skin_tone: String,
    pub hair_color: String,
    pub eye_color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face_shape: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chest: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waist: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hips: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shoulder_width: Option<f64>,

    /// Preference keys with no dedicated field, kept verbatim.
    #[serde(flatten)]
    pub extras: BTreeMap<String, Value>,

    pub body_proportions: BodyProportions,
}

impl AvatarConfig {
    fn refresh_proportions(&mut self) {
        self.body_proportions =
            BodyProportions::derive(self.height, self.shoulder_width, self.hips);
    }
}

/// Builds avatar configs by layering, lowest precedence first: defaults,
/// photo estimates, measurements, preferences. Proportions are derived last.
pub struct AvatarConfigSynthesizer {
    defaults: AvatarDefaults,
}

impl Default for AvatarConfigSynthesizer {
    fn default() -> Self {
        Self::new(&AvatarDefaults::default())
    }
}

impl AvatarConfigSynthesizer {
    pub fn new(defaults: &AvatarDefaults) -> Self {
        Self {
            defaults: defaults.clone(),
        }
    }

    /// The config produced when nothing but defaults is known.
    pub fn default_config(&self) -> AvatarConfig {
        let d = &self.defaults;
        AvatarConfig {
            height: d.height,
            build: d.build.clone(),
            skin_tone: d.skin_tone.clone(),
            hair_color: d.hair_color.clone(),
            eye_color: d.eye_color.clone(),
            face_shape: None,
            weight: None,
            chest: None,
            waist: None,
            hips: None,
            shoulder_width: None,
            extras: BTreeMap::new(),
            body_proportions: BodyProportions::derive(d.height, None, None),
        }
    }

    pub fn synthesize(
        &self,
        photo: &PhotoAnalysis,
        measurements: Option<&AvatarMeasurements>,
        preferences: Option<&FieldMap>,
    ) -> Result<AvatarConfig, CompositionError> {
        let mut config = self.default_config();

        if photo.face_detected {
            apply_photo(&mut config, photo);
        }
        if let Some(measurements) = measurements.filter(|m| !m.is_empty()) {
            self.apply_measurements(&mut config, measurements)?;
        }
        if let Some(preferences) = preferences {
            apply_preferences(&mut config, preferences)?;
        }

        config.refresh_proportions();
        debug!(
            height = config.height,
            skin_tone = %config.skin_tone,
            face = photo.face_detected,
            "Synthesized avatar config"
        );
        Ok(config)
    }

    /// Returns a new config with the updatable fields from `updates` applied.
    /// Direct fields first, then `measurements`, then `preferences`.
    pub fn update(
        &self,
        config: &AvatarConfig,
        updates: &FieldMap,
    ) -> Result<AvatarConfig, CompositionError> {
        if !UPDATABLE_FIELDS.iter().any(|field| updates.contains_key(*field)) {
            return Err(CompositionError::NoValidUpdates);
        }

        let mut updated = config.clone();
        if let Some(height) = number_field(updates, "height")? {
            updated.height = positive_height(height)?;
        }
        apply_strings(&mut updated, updates)?;

        if let Some(map) = object_field(updates, "measurements")? {
            let measurements = AvatarMeasurements::from_map(map)?;
            if !measurements.is_empty() {
                self.apply_measurements(&mut updated, &measurements)?;
            }
        }
        if let Some(map) = object_field(updates, "preferences")? {
            apply_preferences(&mut updated, map)?;
        }

        updated.refresh_proportions();
        Ok(updated)
    }

    /// Missing measurements take their own default rather than the value
    /// already in the config. Height is the exception.
    fn apply_measurements(
        &self,
        config: &mut AvatarConfig,
        measurements: &AvatarMeasurements,
    ) -> Result<(), CompositionError> {
        let d = &self.defaults;
        if let Some(height) = measurements.height {
            config.height = positive_height(height)?;
        }
        config.weight = Some(measurements.weight.unwrap_or(d.weight));
        config.chest = Some(measurements.chest.unwrap_or(d.chest));
        config.waist = Some(measurements.waist.unwrap_or(d.waist));
        config.hips = Some(measurements.hips.unwrap_or(d.hips));
        config.shoulder_width = Some(measurements.shoulder_width.unwrap_or(d.shoulder_width));
        Ok(())
    }
}

fn apply_photo(config: &mut AvatarConfig, photo: &PhotoAnalysis) {
    let estimates = [
        (&mut config.skin_tone, &photo.skin_tone),
        (&mut config.hair_color, &photo.hair_color),
        (&mut config.eye_color, &photo.eye_color),
    ];
    for (field, estimate) in estimates {
        if let Some(value) = estimate {
            field.clone_from(value);
        }
    }
    if photo.face_shape.is_some() {
        config.face_shape.clone_from(&photo.face_shape);
    }
}

/// Preferences may overwrite any field. Unrecognized keys land in `extras`.
fn apply_preferences(
    config: &mut AvatarConfig,
    preferences: &FieldMap,
) -> Result<(), CompositionError> {
    if let Some(height) = number_field(preferences, "height")? {
        config.height = positive_height(height)?;
    }
    apply_strings(config, preferences)?;
    if let Some(face_shape) = string_field(preferences, "face_shape")? {
        config.face_shape = Some(face_shape);
    }

    let numbers = [
        ("weight", &mut config.weight),
        ("chest", &mut config.chest),
        ("waist", &mut config.waist),
        ("hips", &mut config.hips),
        ("shoulder_width", &mut config.shoulder_width),
    ];
    for (key, field) in numbers {
        if let Some(value) = number_field(preferences, key)? {
            *field = Some(value);
        }
    }

    for (key, value) in preferences {
        if !is_known_key(key) {
            config.extras.insert(key.clone(), value.clone());
        }
    }
    Ok(())
}

fn apply_strings(config: &mut AvatarConfig, source: &FieldMap) -> Result<(), CompositionError> {
    let strings = [
        ("build", &mut config.build),
        ("skin_tone", &mut config.skin_tone),
        ("hair_color", &mut config.hair_color),
        ("eye_color", &mut config.eye_color),
    ];
    for (key, field) in strings {
        if let Some(value) = string_field(source, key)? {
            *field = value;
        }
    }
    Ok(())
}

fn is_known_key(key: &str) -> bool {
    matches!(
        key,
        "height"
            | "build"
            | "skin_tone"
            | "hair_color"
            | "eye_color"
            | "face_shape"
            | "weight"
            | "chest"
            | "waist"
            | "hips"
            | "shoulder_width"
            | PROPORTIONS_KEY
    )
}

fn positive_height(height: f64) -> Result<f64, CompositionError> {
    if height.is_finite() && height > 0.0 {
        Ok(height)
    } else {
        Err(CompositionError::invalid("height", "a positive number"))
    }
}
