//! Pixel-statistics heuristics for garment photos. Each extractor is pure and
//! independent; a failing one falls back to its own default value.
use std::collections::BTreeSet;
use tracing::warn;

use super::attributes::{
    GarmentCategory, GarmentClassification, Material, MaterialPrediction, Occasion,
    PatternAnalysis, PatternDetail, PatternIntensity, PatternType, Season, StyleTag,
};
use super::palette::{ColorQuantizer, UNKNOWN_COLOR};
use super::stats::FeatureContext;
use crate::config::GarmentThresholds;
use crate::error::AnalysisDegraded;

pub trait FeatureExtractor: Send + Sync {
    type Output;

    fn name(&self) -> &'static str;
    fn extract(&self, context: &FeatureContext) -> Result<Self::Output, AnalysisDegraded>;
    fn fallback(&self) -> Self::Output;

    /// Template method - runs the heuristic and swaps in the fallback value
    /// when it cannot compute.
    fn extract_or_fallback(&self, context: &FeatureContext) -> Self::Output {
        match self.extract(context) {
            Ok(output) => output,
            Err(degraded) => {
                warn!(
                    extractor = degraded.extractor,
                    "Feature extraction degraded, using fallback: {}", degraded.reason
                );
                self.fallback()
            }
        }
    }
}

pub struct DominantColorExtractor {
    quantizer: ColorQuantizer,
}

impl DominantColorExtractor {
    pub fn new(thresholds: &GarmentThresholds) -> Self {
        Self {
            quantizer: ColorQuantizer::from_thresholds(thresholds),
        }
    }
}

impl FeatureExtractor for DominantColorExtractor {
    type Output = Vec<String>;

    fn name(&self) -> &'static str {
        "DominantColorExtractor"
    }

    fn extract(&self, context: &FeatureContext) -> Result<Vec<String>, AnalysisDegraded> {
        let (width, height) = context.dimensions;
        if width == 0 || height == 0 {
            return Err(AnalysisDegraded::new(self.name(), "image has no pixels"));
        }
        Ok(self.quantizer.dominant_colors(&context.rgb))
    }

    fn fallback(&self) -> Vec<String> {
        vec![UNKNOWN_COLOR.to_string()]
    }
}

/// Guesses the garment category from the aspect ratio alone.
pub struct CategoryClassifier {
    wide_ratio: f64,
    tall_ratio: f64,
    wide_confidence: f32,
    tall_confidence: f32,
    default_confidence: f32,
}

impl CategoryClassifier {
    pub fn new(thresholds: &GarmentThresholds) -> Self {
        Self {
            wide_ratio: thresholds.wide_aspect_ratio,
            tall_ratio: thresholds.tall_aspect_ratio,
            wide_confidence: thresholds.wide_confidence,
            tall_confidence: thresholds.tall_confidence,
            default_confidence: thresholds.default_confidence,
        }
    }

    pub fn classify(&self, width: u32, height: u32) -> Option<GarmentClassification> {
        if height == 0 {
            return None;
        }
        let ratio = width as f64 / height as f64;

        let (category, garment_type, confidence) = if ratio > self.wide_ratio {
            (GarmentCategory::Bottoms, "pants", self.wide_confidence)
        } else if ratio < self.tall_ratio {
            (GarmentCategory::Dresses, "dress", self.tall_confidence)
        } else {
            (GarmentCategory::Tops, "t-shirt", self.default_confidence)
        };

        Some(GarmentClassification {
            category,
            garment_type: garment_type.to_string(),
            subcategory: subcategory_for(garment_type).to_string(),
            confidence,
        })
    }
}

pub fn subcategory_for(garment_type: &str) -> &'static str {
    match garment_type {
        "t-shirt" => "casual",
        "shirt" => "formal",
        "dress" => "formal",
        "jeans" => "casual",
        "pants" => "business",
        "shorts" => "casual",
        "jacket" => "outerwear",
        "sweater" => "knitwear",
        _ => "general",
    }
}

impl FeatureExtractor for CategoryClassifier {
    type Output = GarmentClassification;

    fn name(&self) -> &'static str {
        "CategoryClassifier"
    }

    fn extract(&self, context: &FeatureContext) -> Result<GarmentClassification, AnalysisDegraded> {
        let (width, height) = context.dimensions;
        self.classify(width, height)
            .ok_or_else(|| AnalysisDegraded::new(self.name(), "image has zero height"))
    }

    fn fallback(&self) -> GarmentClassification {
        GarmentClassification {
            category: GarmentCategory::Unknown,
            garment_type: "unknown".to_string(),
            subcategory: subcategory_for("unknown").to_string(),
            confidence: 0.0,
        }
    }
}

pub struct StyleExtractor {
    light_luminance: f64,
    dark_luminance: f64,
}

impl StyleExtractor {
    pub fn new(thresholds: &GarmentThresholds) -> Self {
        Self {
            light_luminance: thresholds.light_style_luminance,
            dark_luminance: thresholds.dark_style_luminance,
        }
    }
}

impl FeatureExtractor for StyleExtractor {
    type Output = Vec<StyleTag>;

    fn name(&self) -> &'static str {
        "StyleExtractor"
    }

    fn extract(&self, context: &FeatureContext) -> Result<Vec<StyleTag>, AnalysisDegraded> {
        let stats = context.stats_for(self.name())?;
        let mut tags = Vec::with_capacity(3);

        if stats.luminance > self.light_luminance {
            tags.push(StyleTag::Light);
        } else if stats.luminance < self.dark_luminance {
            tags.push(StyleTag::Dark);
        }
        tags.extend([StyleTag::Modern, StyleTag::Versatile]);

        Ok(tags)
    }

    fn fallback(&self) -> Vec<StyleTag> {
        vec![StyleTag::Modern, StyleTag::Versatile]
    }
}

pub struct PatternAnalyzer {
    patterned_variance: f64,
    textured_variance: f64,
    geometric_variance: f64,
}

impl PatternAnalyzer {
    pub fn new(thresholds: &GarmentThresholds) -> Self {
        Self {
            patterned_variance: thresholds.patterned_variance,
            textured_variance: thresholds.textured_variance,
            geometric_variance: thresholds.geometric_variance,
        }
    }
}

impl FeatureExtractor for PatternAnalyzer {
    type Output = PatternAnalysis;

    fn name(&self) -> &'static str {
        "PatternAnalyzer"
    }

    fn extract(&self, context: &FeatureContext) -> Result<PatternAnalysis, AnalysisDegraded> {
        let variance = context.stats_for(self.name())?.grayscale_variance;

        let (pattern_type, intensity) = if variance > self.patterned_variance {
            (PatternType::Patterned, PatternIntensity::High)
        } else if variance > self.textured_variance {
            (PatternType::Textured, PatternIntensity::Medium)
        } else {
            (PatternType::Solid, PatternIntensity::Low)
        };

        let detail = if variance > self.geometric_variance {
            PatternDetail::Geometric
        } else {
            PatternDetail::Simple
        };

        Ok(PatternAnalysis {
            pattern_type,
            intensity,
            details: vec![detail],
        })
    }

    fn fallback(&self) -> PatternAnalysis {
        PatternAnalysis {
            pattern_type: PatternType::Unknown,
            intensity: PatternIntensity::Unknown,
            details: Vec::new(),
        }
    }
}

pub struct MaterialPredictor {
    denim_variance: f64,
    cotton_channel_min: f64,
    denim_confidence: f32,
    cotton_confidence: f32,
    polyester_confidence: f32,
}

impl MaterialPredictor {
    pub fn new(thresholds: &GarmentThresholds) -> Self {
        Self {
            denim_variance: thresholds.denim_variance,
            cotton_channel_min: thresholds.cotton_channel_min,
            denim_confidence: thresholds.denim_confidence,
            cotton_confidence: thresholds.cotton_confidence,
            polyester_confidence: thresholds.polyester_confidence,
        }
    }

    fn alternatives(primary: Material) -> Vec<Material> {
        Material::CANDIDATES
            .into_iter()
            .filter(|m| *m != primary)
            .take(2)
            .collect()
    }
}

impl FeatureExtractor for MaterialPredictor {
    type Output = MaterialPrediction;

    fn name(&self) -> &'static str {
        "MaterialPredictor"
    }

    fn extract(&self, context: &FeatureContext) -> Result<MaterialPrediction, AnalysisDegraded> {
        let stats = context.stats_for(self.name())?;

        let (primary, confidence) = if stats.texture_variance > self.denim_variance {
            (Material::Denim, self.denim_confidence)
        } else if stats
            .channel_means
            .iter()
            .all(|mean| *mean > self.cotton_channel_min)
        {
            (Material::Cotton, self.cotton_confidence)
        } else {
            (Material::Polyester, self.polyester_confidence)
        };

        Ok(MaterialPrediction {
            primary,
            confidence,
            alternatives: Self::alternatives(primary),
        })
    }

    fn fallback(&self) -> MaterialPrediction {
        MaterialPrediction {
            primary: Material::Unknown,
            confidence: 0.0,
            alternatives: Vec::new(),
        }
    }
}

pub struct OccasionTagger {
    daytime_luminance: f64,
    evening_luminance: f64,
}

impl OccasionTagger {
    pub fn new(thresholds: &GarmentThresholds) -> Self {
        Self {
            daytime_luminance: thresholds.daytime_luminance,
            evening_luminance: thresholds.evening_luminance,
        }
    }
}

impl FeatureExtractor for OccasionTagger {
    type Output = BTreeSet<Occasion>;

    fn name(&self) -> &'static str {
        "OccasionTagger"
    }

    fn extract(&self, context: &FeatureContext) -> Result<BTreeSet<Occasion>, AnalysisDegraded> {
        let luminance = context.stats_for(self.name())?.luminance;
        let mut tags = self.fallback();

        if luminance > self.daytime_luminance {
            tags.extend([Occasion::Daytime, Occasion::Office]);
        } else if luminance < self.evening_luminance {
            tags.extend([Occasion::Evening, Occasion::Formal]);
        }

        Ok(tags)
    }

    fn fallback(&self) -> BTreeSet<Occasion> {
        BTreeSet::from([Occasion::Casual, Occasion::Everyday, Occasion::Weekend])
    }
}

pub struct SeasonAnalyzer {
    warm_intensity: f64,
    cold_intensity: f64,
}

impl SeasonAnalyzer {
    pub fn new(thresholds: &GarmentThresholds) -> Self {
        Self {
            warm_intensity: thresholds.warm_season_intensity,
            cold_intensity: thresholds.cold_season_intensity,
        }
    }
}

impl FeatureExtractor for SeasonAnalyzer {
    type Output = Vec<Season>;

    fn name(&self) -> &'static str {
        "SeasonAnalyzer"
    }

    fn extract(&self, context: &FeatureContext) -> Result<Vec<Season>, AnalysisDegraded> {
        let intensity = context.stats_for(self.name())?.luminance;
        let mut seasons = Vec::new();

        if intensity > self.warm_intensity {
            seasons.extend([Season::Spring, Season::Summer]);
        }
        if intensity < self.cold_intensity {
            seasons.extend([Season::Fall, Season::Winter]);
        }
        if seasons.is_empty() {
            seasons.push(Season::AllSeason);
        }

        Ok(seasons)
    }

    fn fallback(&self) -> Vec<Season> {
        vec![Season::AllSeason]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageBuffer, Rgb, RgbImage};

    fn solid(width: u32, height: u32, rgb: [u8; 3]) -> FeatureContext {
        FeatureContext::new(DynamicImage::ImageRgb8(ImageBuffer::from_pixel(
            width,
            height,
            Rgb(rgb),
        )))
    }

    fn thresholds() -> GarmentThresholds {
        GarmentThresholds::default()
    }

    #[test]
    fn category_follows_aspect_ratio() {
        let classifier = CategoryClassifier::new(&thresholds());

        let wide = classifier.classify(200, 100).unwrap();
        assert_eq!(wide.category, GarmentCategory::Bottoms);
        assert_eq!(wide.garment_type, "pants");
        assert_eq!(wide.subcategory, "business");
        assert_eq!(wide.confidence, 0.6);

        let tall = classifier.classify(100, 200).unwrap();
        assert_eq!(tall.category, GarmentCategory::Dresses);
        assert_eq!(tall.garment_type, "dress");
        assert_eq!(tall.subcategory, "formal");
        assert_eq!(tall.confidence, 0.7);

        let square = classifier.classify(100, 100).unwrap();
        assert_eq!(square.category, GarmentCategory::Tops);
        assert_eq!(square.garment_type, "t-shirt");
        assert_eq!(square.subcategory, "casual");
        assert_eq!(square.confidence, 0.5);
    }

    #[test]
    fn ratio_of_three_quarters_is_a_top() {
        let classifier = CategoryClassifier::new(&thresholds());
        assert_eq!(classifier.classify(300, 400).unwrap().category, GarmentCategory::Tops);
    }

    #[test]
    fn unmapped_type_gets_general_subcategory() {
        assert_eq!(subcategory_for("parka"), "general");
    }

    #[test]
    fn style_tags_follow_luminance() {
        let extractor = StyleExtractor::new(&thresholds());
        assert_eq!(
            extractor.extract_or_fallback(&solid(10, 10, [250, 250, 250])),
            vec![StyleTag::Light, StyleTag::Modern, StyleTag::Versatile]
        );
        assert_eq!(
            extractor.extract_or_fallback(&solid(10, 10, [20, 20, 20])),
            vec![StyleTag::Dark, StyleTag::Modern, StyleTag::Versatile]
        );
        assert_eq!(
            extractor.extract_or_fallback(&solid(10, 10, [150, 150, 150])),
            vec![StyleTag::Modern, StyleTag::Versatile]
        );
    }

    #[test]
    fn pattern_follows_grayscale_variance() {
        let analyzer = PatternAnalyzer::new(&thresholds());

        let solid_result = analyzer.extract_or_fallback(&solid(10, 10, [90, 30, 200]));
        assert_eq!(solid_result.pattern_type, PatternType::Solid);
        assert_eq!(solid_result.intensity, PatternIntensity::Low);
        assert_eq!(solid_result.details, vec![PatternDetail::Simple]);

        let stripes = FeatureContext::new(DynamicImage::ImageRgb8(ImageBuffer::from_fn(
            20,
            20,
            |x, _| if x % 2 == 0 { Rgb([0, 0, 0]) } else { Rgb([255, 255, 255]) },
        )));
        let striped = analyzer.extract_or_fallback(&stripes);
        assert_eq!(striped.pattern_type, PatternType::Patterned);
        assert_eq!(striped.intensity, PatternIntensity::High);
        assert_eq!(striped.details, vec![PatternDetail::Geometric]);
    }

    #[test]
    fn moderate_variance_is_textured() {
        // gray levels 100 and 150 alternate: variance 25^2 = 625
        let ctx = FeatureContext::new(DynamicImage::ImageRgb8(ImageBuffer::from_fn(
            20,
            20,
            |x, _| if x % 2 == 0 { Rgb([100, 100, 100]) } else { Rgb([150, 150, 150]) },
        )));
        let result = PatternAnalyzer::new(&thresholds()).extract_or_fallback(&ctx);
        assert_eq!(result.pattern_type, PatternType::Textured);
        assert_eq!(result.intensity, PatternIntensity::Medium);
        assert_eq!(result.details, vec![PatternDetail::Simple]);
    }

    #[test]
    fn red_blue_stripes_are_textured() {
        let ctx = FeatureContext::new(DynamicImage::ImageRgb8(ImageBuffer::from_fn(
            20,
            20,
            |x, _| if x % 2 == 0 { Rgb([255, 0, 0]) } else { Rgb([0, 0, 255]) },
        )));
        let result = PatternAnalyzer::new(&thresholds()).extract_or_fallback(&ctx);
        assert_eq!(result.pattern_type, PatternType::Textured);
        assert_eq!(result.intensity, PatternIntensity::Medium);
        assert_eq!(result.details, vec![PatternDetail::Simple]);
    }

    #[test]
    fn material_prediction_and_alternatives() {
        let predictor = MaterialPredictor::new(&thresholds());

        let white = predictor.extract_or_fallback(&solid(10, 10, [230, 230, 230]));
        assert_eq!(white.primary, Material::Cotton);
        assert_eq!(white.confidence, 0.5);
        assert_eq!(white.alternatives, vec![Material::Denim, Material::Wool]);

        let gray = predictor.extract_or_fallback(&solid(10, 10, [120, 120, 120]));
        assert_eq!(gray.primary, Material::Polyester);
        assert_eq!(gray.confidence, 0.4);
        assert_eq!(gray.alternatives, vec![Material::Cotton, Material::Denim]);

        // saturated red spreads channel values far apart
        let red = predictor.extract_or_fallback(&solid(10, 10, [255, 0, 0]));
        assert_eq!(red.primary, Material::Denim);
        assert_eq!(red.confidence, 0.6);
        assert_eq!(red.alternatives, vec![Material::Cotton, Material::Wool]);
    }

    #[test]
    fn occasion_tags_follow_luminance() {
        let tagger = OccasionTagger::new(&thresholds());

        let bright = tagger.extract_or_fallback(&solid(10, 10, [200, 200, 200]));
        assert_eq!(
            bright,
            BTreeSet::from([
                Occasion::Casual,
                Occasion::Everyday,
                Occasion::Weekend,
                Occasion::Daytime,
                Occasion::Office
            ])
        );

        let dark = tagger.extract_or_fallback(&solid(10, 10, [30, 30, 30]));
        assert!(dark.contains(&Occasion::Evening));
        assert!(dark.contains(&Occasion::Formal));
        assert!(!dark.contains(&Occasion::Office));

        let mid = tagger.extract_or_fallback(&solid(10, 10, [150, 150, 150]));
        assert_eq!(mid.len(), 3);
    }

    #[test]
    fn season_is_never_empty() {
        let analyzer = SeasonAnalyzer::new(&thresholds());

        assert_eq!(
            analyzer.extract_or_fallback(&solid(10, 10, [200, 200, 200])),
            vec![Season::Spring, Season::Summer]
        );
        assert_eq!(
            analyzer.extract_or_fallback(&solid(10, 10, [50, 50, 50])),
            vec![Season::Fall, Season::Winter]
        );
        for level in [120u8, 135, 150] {
            assert_eq!(
                analyzer.extract_or_fallback(&solid(10, 10, [level, level, level])),
                vec![Season::AllSeason]
            );
        }
    }

    #[test]
    fn extractors_fall_back_on_empty_image() {
        let ctx = FeatureContext::new(DynamicImage::ImageRgb8(RgbImage::new(0, 0)));
        let t = thresholds();

        assert_eq!(
            DominantColorExtractor::new(&t).extract_or_fallback(&ctx),
            vec!["unknown"]
        );
        assert_eq!(
            CategoryClassifier::new(&t).extract_or_fallback(&ctx).category,
            GarmentCategory::Unknown
        );
        assert_eq!(
            StyleExtractor::new(&t).extract_or_fallback(&ctx),
            vec![StyleTag::Modern, StyleTag::Versatile]
        );
        assert_eq!(
            PatternAnalyzer::new(&t).extract_or_fallback(&ctx).pattern_type,
            PatternType::Unknown
        );
        assert_eq!(
            MaterialPredictor::new(&t).extract_or_fallback(&ctx).primary,
            Material::Unknown
        );
        assert_eq!(OccasionTagger::new(&t).extract_or_fallback(&ctx).len(), 3);
        assert_eq!(
            SeasonAnalyzer::new(&t).extract_or_fallback(&ctx),
            vec![Season::AllSeason]
        );
    }

    #[test]
    fn degraded_extract_reports_extractor_name() {
        let ctx = FeatureContext::new(DynamicImage::ImageRgb8(RgbImage::new(0, 0)));
        let err = SeasonAnalyzer::new(&thresholds()).extract(&ctx).unwrap_err();
        assert_eq!(err.extractor, "SeasonAnalyzer");
    }
}
