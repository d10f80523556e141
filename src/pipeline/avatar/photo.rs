use image::{DynamicImage, GenericImageView};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{AvatarDefaults, SkinToneThresholds};

pub const SKIN_LIGHT: &str = "light";
pub const SKIN_MEDIUM: &str = "medium";
pub const SKIN_MEDIUM_DARK: &str = "medium_dark";
pub const SKIN_DARK: &str = "dark";

const DETECTED_FACE_SHAPE: &str = "oval";
const DETECTED_HAIR_COLOR: &str = "brown";
const DETECTED_EYE_COLOR: &str = "brown";
const DETECTED_AGE: u32 = 25;

/// Estimates taken from a user portrait. Every estimate is `None` when no
/// face was detected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoAnalysis {
    pub face_detected: bool,
    pub face_shape: Option<String>,
    pub estimated_age: Option<u32>,
    pub skin_tone: Option<String>,
    pub hair_color: Option<String>,
    pub eye_color: Option<String>,
    pub resolution: String,
}

impl PhotoAnalysis {
    pub fn undetected(width: u32, height: u32) -> Self {
        Self {
            face_detected: false,
            face_shape: None,
            estimated_age: None,
            skin_tone: None,
            hair_color: None,
            eye_color: None,
            resolution: format!("{width}x{height}"),
        }
    }
}

/// Mocked face analysis: the middle half of the frame stands in for the face
/// and its average colour drives the skin tone estimate.
pub struct PhotoAnalyzer {
    thresholds: SkinToneThresholds,
}

impl Default for PhotoAnalyzer {
    fn default() -> Self {
        Self::new(&AvatarDefaults::default())
    }
}

impl PhotoAnalyzer {
    pub fn new(defaults: &AvatarDefaults) -> Self {
        Self {
            thresholds: defaults.skin_tone_thresholds.clone(),
        }
    }

    pub fn analyze(&self, image: &DynamicImage) -> PhotoAnalysis {
        let (width, height) = image.dimensions();
        let Some(average) = center_average(image) else {
            debug!(width, height, "Empty center region, no face detected");
            return PhotoAnalysis::undetected(width, height);
        };

        let skin_tone = self.classify_skin_tone(average);
        debug!(?average, skin_tone, "Estimated skin tone");

        PhotoAnalysis {
            face_detected: true,
            face_shape: Some(DETECTED_FACE_SHAPE.to_string()),
            estimated_age: Some(DETECTED_AGE),
            skin_tone: Some(skin_tone.to_string()),
            hair_color: Some(DETECTED_HAIR_COLOR.to_string()),
            eye_color: Some(DETECTED_EYE_COLOR.to_string()),
            resolution: format!("{width}x{height}"),
        }
    }

    pub fn classify_skin_tone(&self, average: [f64; 3]) -> &'static str {
        let above = |min: &[f64; 3]| average.iter().zip(min).all(|(value, min)| value > min);

        if above(&self.thresholds.light) {
            SKIN_LIGHT
        } else if above(&self.thresholds.medium) {
            SKIN_MEDIUM
        } else if above(&self.thresholds.medium_dark) {
            SKIN_MEDIUM_DARK
        } else {
            SKIN_DARK
        }
    }
}

/// Mean RGB of rows `h/4..3h/4` and columns `w/4..3w/4`.
fn center_average(image: &DynamicImage) -> Option<[f64; 3]> {
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();
    let (x0, x1) = (width / 4, 3 * width / 4);
    let (y0, y1) = (height / 4, 3 * height / 4);

    let count = u64::from(x1 - x0) * u64::from(y1 - y0);
    if count == 0 {
        return None;
    }

    let mut sums = [0u64; 3];
    for y in y0..y1 {
        for x in x0..x1 {
            let pixel = rgb.get_pixel(x, y);
            for (sum, value) in sums.iter_mut().zip(pixel.0) {
                *sum += u64::from(value);
            }
        }
    }

    Some(sums.map(|sum| sum as f64 / count as f64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn solid(width: u32, height: u32, color: [u8; 3]) -> DynamicImage {
        DynamicImage::ImageRgb8(ImageBuffer::from_pixel(width, height, Rgb(color)))
    }

    #[test]
    fn skin_tone_classes_follow_thresholds() {
        let analyzer = PhotoAnalyzer::default();
        assert_eq!(analyzer.classify_skin_tone([230.0, 200.0, 180.0]), "light");
        assert_eq!(analyzer.classify_skin_tone([180.0, 150.0, 120.0]), "medium");
        assert_eq!(analyzer.classify_skin_tone([140.0, 100.0, 80.0]), "medium_dark");
        assert_eq!(analyzer.classify_skin_tone([60.0, 40.0, 30.0]), "dark");
        // thresholds are strict
        assert_eq!(analyzer.classify_skin_tone([200.0, 181.0, 161.0]), "medium");
    }

    #[test]
    fn only_the_center_region_is_sampled() {
        let mut buffer = ImageBuffer::from_pixel(200, 200, Rgb([20u8, 20, 20]));
        for y in 50..150 {
            for x in 50..150 {
                buffer.put_pixel(x, y, Rgb([230, 200, 180]));
            }
        }
        let analysis = PhotoAnalyzer::default().analyze(&DynamicImage::ImageRgb8(buffer));

        assert!(analysis.face_detected);
        assert_eq!(analysis.skin_tone.as_deref(), Some("light"));
        assert_eq!(analysis.face_shape.as_deref(), Some("oval"));
        assert_eq!(analysis.estimated_age, Some(25));
        assert_eq!(analysis.resolution, "200x200");
    }

    #[test]
    fn degenerate_photo_is_undetected() {
        let analysis = PhotoAnalyzer::default().analyze(&solid(1, 1, [200, 200, 200]));
        assert_eq!(analysis, PhotoAnalysis::undetected(1, 1));
    }
}
