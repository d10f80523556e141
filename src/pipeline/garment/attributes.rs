use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum GarmentCategory {
    Tops,
    Bottoms,
    Dresses,
    Outerwear,
    Footwear,
    Accessories,
    Unknown,
}

impl GarmentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            GarmentCategory::Tops => "tops",
            GarmentCategory::Bottoms => "bottoms",
            GarmentCategory::Dresses => "dresses",
            GarmentCategory::Outerwear => "outerwear",
            GarmentCategory::Footwear => "footwear",
            GarmentCategory::Accessories => "accessories",
            GarmentCategory::Unknown => "unknown",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "tops" => Some(GarmentCategory::Tops),
            "bottoms" => Some(GarmentCategory::Bottoms),
            "dresses" => Some(GarmentCategory::Dresses),
            "outerwear" => Some(GarmentCategory::Outerwear),
            "footwear" => Some(GarmentCategory::Footwear),
            "accessories" => Some(GarmentCategory::Accessories),
            "unknown" => Some(GarmentCategory::Unknown),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GarmentClassification {
    pub category: GarmentCategory,
    #[serde(rename = "type")]
    pub garment_type: String,
    pub subcategory: String,
    pub confidence: f32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum StyleTag {
    Light,
    Dark,
    Modern,
    Versatile,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PatternType {
    Patterned,
    Textured,
    Solid,
    Unknown,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PatternIntensity {
    High,
    Medium,
    Low,
    Unknown,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PatternDetail {
    Geometric,
    Simple,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternAnalysis {
    #[serde(rename = "type")]
    pub pattern_type: PatternType,
    pub intensity: PatternIntensity,
    pub details: Vec<PatternDetail>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Material {
    Cotton,
    Denim,
    Wool,
    Silk,
    Polyester,
    Leather,
    Unknown,
}

impl Material {
    /// Candidate materials in the order alternatives are reported.
    pub const CANDIDATES: [Material; 6] = [
        Material::Cotton,
        Material::Denim,
        Material::Wool,
        Material::Silk,
        Material::Polyester,
        Material::Leather,
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialPrediction {
    pub primary: Material,
    pub confidence: f32,
    pub alternatives: Vec<Material>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Occasion {
    Casual,
    Everyday,
    Weekend,
    Daytime,
    Office,
    Evening,
    Formal,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Season {
    Spring,
    Summer,
    Fall,
    Winter,
    AllSeason,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageQuality {
    pub width: u32,
    pub height: u32,
    pub resolution: String,
}

impl ImageQuality {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            resolution: format!("{width}x{height}"),
        }
    }
}

/// Everything the heuristics derived from one garment photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GarmentAttributes {
    #[serde(flatten)]
    pub classification: GarmentClassification,
    /// Most frequent first, at most `max_dominant_colors` palette names.
    pub dominant_colors: Vec<String>,
    pub style_attributes: Vec<StyleTag>,
    pub pattern: PatternAnalysis,
    pub material: MaterialPrediction,
    /// Set semantics; callers must not rely on ordering.
    pub occasion_tags: BTreeSet<Occasion>,
    pub season_tags: Vec<Season>,
    pub image_quality: ImageQuality,
}
