use image::{DynamicImage, RgbImage};
use std::sync::Arc;

use crate::error::AnalysisDegraded;

/// Whole-image pixel statistics shared by the garment heuristics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageStats {
    /// Mean over every channel value of every pixel.
    pub luminance: f64,
    /// Per-channel means, R G B.
    pub channel_means: [f64; 3],
    /// Population variance over every channel value.
    pub texture_variance: f64,
    /// Population variance of the ITU-R 601 luma of each pixel.
    pub grayscale_variance: f64,
}

/// Integer ITU-R 601 luma, rounded the same way as PIL's `convert("L")`.
fn luma(r: u64, g: u64, b: u64) -> u64 {
    (r * 19595 + g * 38470 + b * 7471 + 0x8000) >> 16
}

impl ImageStats {
    pub fn compute(image: &DynamicImage) -> Result<Self, AnalysisDegraded> {
        let rgb = image.to_rgb8();
        let pixel_count = rgb.width() as u64 * rgb.height() as u64;

        if pixel_count == 0 {
            return Err(AnalysisDegraded::new("ImageStats", "image has no pixels"));
        }

        let mut channel_sums = [0u64; 3];
        let mut sum_sq = 0u64;
        let mut gray_sum = 0u64;
        let mut gray_sum_sq = 0u64;
        for pixel in rgb.pixels() {
            let [r, g, b] = pixel.0.map(u64::from);
            for (channel, v) in [r, g, b].into_iter().enumerate() {
                channel_sums[channel] += v;
                sum_sq += v * v;
            }
            let gray = luma(r, g, b);
            gray_sum += gray;
            gray_sum_sq += gray * gray;
        }

        let value_count = (pixel_count * 3) as f64;
        let total: u64 = channel_sums.iter().sum();
        let luminance = total as f64 / value_count;
        let texture_variance = sum_sq as f64 / value_count - luminance * luminance;

        let gray_mean = gray_sum as f64 / pixel_count as f64;
        let grayscale_variance = gray_sum_sq as f64 / pixel_count as f64 - gray_mean * gray_mean;

        Ok(Self {
            luminance,
            channel_means: channel_sums.map(|sum| sum as f64 / pixel_count as f64),
            texture_variance: texture_variance.max(0.0),
            grayscale_variance: grayscale_variance.max(0.0),
        })
    }
}

/// Decoded garment image plus the statistics computed once for all
/// extractors. A degraded statistic is kept as the error so each extractor
/// can fall back on its own.
#[derive(Clone)]
pub struct FeatureContext {
    pub rgb: Arc<RgbImage>,
    pub dimensions: (u32, u32),
    pub stats: Result<ImageStats, AnalysisDegraded>,
}

impl FeatureContext {
    pub fn new(image: DynamicImage) -> Self {
        let stats = ImageStats::compute(&image);
        let rgb = Arc::new(image.to_rgb8());
        let dimensions = rgb.dimensions();

        Self {
            rgb,
            dimensions,
            stats,
        }
    }

    /// Statistics, re-tagged with the name of the extractor asking for them.
    pub fn stats_for(&self, extractor: &'static str) -> Result<ImageStats, AnalysisDegraded> {
        self.stats
            .clone()
            .map_err(|e| AnalysisDegraded::new(extractor, e.reason))
    }
}
