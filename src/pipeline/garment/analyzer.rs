use image::DynamicImage;
use std::time::Instant;
use tracing::{debug, instrument};

use super::attributes::{GarmentAttributes, ImageQuality};
use super::extractors::{
    CategoryClassifier, DominantColorExtractor, FeatureExtractor, MaterialPredictor,
    OccasionTagger, PatternAnalyzer, SeasonAnalyzer, StyleExtractor,
};
use super::stats::FeatureContext;
use crate::config::GarmentThresholds;

/// Runs every garment extractor over one decoded image and assembles the
/// attribute bundle. Always returns a complete bundle.
pub struct GarmentAnalyzer {
    colors: DominantColorExtractor,
    category: CategoryClassifier,
    style: StyleExtractor,
    pattern: PatternAnalyzer,
    material: MaterialPredictor,
    occasion: OccasionTagger,
    season: SeasonAnalyzer,
}

impl Default for GarmentAnalyzer {
    fn default() -> Self {
        Self::new(&GarmentThresholds::default())
    }
}

impl GarmentAnalyzer {
    pub fn new(thresholds: &GarmentThresholds) -> Self {
        Self {
            colors: DominantColorExtractor::new(thresholds),
            category: CategoryClassifier::new(thresholds),
            style: StyleExtractor::new(thresholds),
            pattern: PatternAnalyzer::new(thresholds),
            material: MaterialPredictor::new(thresholds),
            occasion: OccasionTagger::new(thresholds),
            season: SeasonAnalyzer::new(thresholds),
        }
    }

    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn analyze(&self, image: DynamicImage) -> GarmentAttributes {
        let start = Instant::now();
        let context = FeatureContext::new(image);
        let (width, height) = context.dimensions;

        let attributes = GarmentAttributes {
            classification: self.category.extract_or_fallback(&context),
            dominant_colors: self.colors.extract_or_fallback(&context),
            style_attributes: self.style.extract_or_fallback(&context),
            pattern: self.pattern.extract_or_fallback(&context),
            material: self.material.extract_or_fallback(&context),
            occasion_tags: self.occasion.extract_or_fallback(&context),
            season_tags: self.season.extract_or_fallback(&context),
            image_quality: ImageQuality::new(width, height),
        };

        debug!(
            "Garment analysis completed in {}us: {:?} with colors {:?}",
            start.elapsed().as_micros(),
            attributes.classification.category,
            attributes.dominant_colors
        );

        attributes
    }
}
