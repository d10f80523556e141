use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::attributes::{
    GarmentAttributes, GarmentCategory, MaterialPrediction, Occasion, PatternAnalysis, Season,
    StyleTag,
};
use super::extractors::subcategory_for;
use super::palette::UNKNOWN_COLOR;
use crate::error::CompositionError;
use crate::pipeline::fields::{bool_field, number_field, string_field, string_set_field, FieldMap};

pub const DEFAULT_GARMENT_NAME: &str = "Untitled Garment";
pub const ACTIVE_STATUS: &str = "active";

/// Fields a caller may change on an existing record.
pub const UPDATABLE_FIELDS: [&str; 10] = [
    "name",
    "description",
    "brand",
    "size",
    "price",
    "tags",
    "is_favorite",
    "status",
    "category",
    "type",
];

/// Caller-supplied description of the garment, with defaults applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GarmentMetadata {
    pub name: String,
    pub description: String,
    pub brand: String,
    pub size: String,
    pub price: f64,
    pub purchase_date: String,
    pub tags: BTreeSet<String>,
    pub is_favorite: bool,
}

impl Default for GarmentMetadata {
    fn default() -> Self {
        Self {
            name: DEFAULT_GARMENT_NAME.to_string(),
            description: String::new(),
            brand: String::new(),
            size: String::new(),
            price: 0.0,
            purchase_date: String::new(),
            tags: BTreeSet::new(),
            is_favorite: false,
        }
    }
}

impl GarmentMetadata {
    pub fn from_map(map: &FieldMap) -> Result<Self, CompositionError> {
        let defaults = Self::default();
        Ok(Self {
            name: string_field(map, "name")?.unwrap_or(defaults.name),
            description: string_field(map, "description")?.unwrap_or(defaults.description),
            brand: string_field(map, "brand")?.unwrap_or(defaults.brand),
            size: string_field(map, "size")?.unwrap_or(defaults.size),
            price: number_field(map, "price")?.unwrap_or(defaults.price),
            purchase_date: string_field(map, "purchase_date")?.unwrap_or(defaults.purchase_date),
            tags: string_set_field(map, "tags")?.unwrap_or(defaults.tags),
            is_favorite: bool_field(map, "is_favorite")?.unwrap_or(defaults.is_favorite),
        })
    }
}

/// Attributes merged with metadata. Owned by the caller once returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GarmentRecord {
    #[serde(flatten)]
    pub metadata: GarmentMetadata,

    pub category: GarmentCategory,
    #[serde(rename = "type")]
    pub garment_type: String,
    pub subcategory: String,
    pub confidence: f32,
    pub colors: Vec<String>,
    pub primary_color: String,
    pub style_attributes: Vec<StyleTag>,
    pub pattern: PatternAnalysis,
    pub material: MaterialPrediction,
    pub occasions: BTreeSet<Occasion>,
    pub seasons: Vec<Season>,

    pub wear_count: u32,
    pub last_worn: Option<DateTime<Utc>>,
    pub status: String,
}

/// Merges extractor output with optional caller metadata.
pub fn compose_record(
    attributes: &GarmentAttributes,
    metadata: Option<&FieldMap>,
) -> Result<GarmentRecord, CompositionError> {
    let metadata = match metadata {
        Some(map) => GarmentMetadata::from_map(map)?,
        None => GarmentMetadata::default(),
    };

    let classification = &attributes.classification;
    let primary_color = attributes
        .dominant_colors
        .first()
        .cloned()
        .unwrap_or_else(|| UNKNOWN_COLOR.to_string());

    Ok(GarmentRecord {
        metadata,
        category: classification.category,
        garment_type: classification.garment_type.clone(),
        subcategory: classification.subcategory.clone(),
        confidence: classification.confidence,
        colors: attributes.dominant_colors.clone(),
        primary_color,
        style_attributes: attributes.style_attributes.clone(),
        pattern: attributes.pattern.clone(),
        material: attributes.material.clone(),
        occasions: attributes.occasion_tags.clone(),
        seasons: attributes.season_tags.clone(),
        wear_count: 0,
        last_worn: None,
        status: ACTIVE_STATUS.to_string(),
    })
}

impl GarmentRecord {
    /// Returns a new record with the updatable fields from `updates` applied.
    /// Unknown keys are ignored; a map with no updatable key is rejected.
    pub fn apply_update(&self, updates: &FieldMap) -> Result<GarmentRecord, CompositionError> {
        if !UPDATABLE_FIELDS.iter().any(|field| updates.contains_key(*field)) {
            return Err(CompositionError::NoValidUpdates);
        }

        let mut updated = self.clone();
        let meta = &mut updated.metadata;

        if let Some(name) = string_field(updates, "name")? {
            meta.name = name;
        }
        if let Some(description) = string_field(updates, "description")? {
            meta.description = description;
        }
        if let Some(brand) = string_field(updates, "brand")? {
            meta.brand = brand;
        }
        if let Some(size) = string_field(updates, "size")? {
            meta.size = size;
        }
        if let Some(price) = number_field(updates, "price")? {
            meta.price = price;
        }
        if let Some(tags) = string_set_field(updates, "tags")? {
            meta.tags = tags;
        }
        if let Some(is_favorite) = bool_field(updates, "is_favorite")? {
            meta.is_favorite = is_favorite;
        }
        if let Some(status) = string_field(updates, "status")? {
            updated.status = status;
        }
        if let Some(category) = string_field(updates, "category")? {
            updated.category = GarmentCategory::parse(&category)
                .ok_or_else(|| CompositionError::invalid("category", "a known garment category"))?;
        }
        if let Some(garment_type) = string_field(updates, "type")? {
            updated.subcategory = subcategory_for(&garment_type).to_string();
            updated.garment_type = garment_type;
        }

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::garment::analyzer::GarmentAnalyzer;
    use image::{DynamicImage, ImageBuffer, Rgb};
    use serde_json::{json, Value};

    fn attributes() -> GarmentAttributes {
        GarmentAnalyzer::default().analyze(DynamicImage::ImageRgb8(ImageBuffer::from_pixel(
            300,
            400,
            Rgb([255, 0, 0]),
        )))
    }

    fn map(value: Value) -> FieldMap {
        match value {
            Value::Object(map) => map,
            _ => unreachable!("test helper expects an object"),
        }
    }

    #[test]
    fn defaults_apply_without_metadata() {
        let record = compose_record(&attributes(), None).unwrap();

        assert_eq!(record.metadata, GarmentMetadata::default());
        assert_eq!(record.metadata.name, "Untitled Garment");
        assert_eq!(record.metadata.price, 0.0);
        assert!(record.metadata.tags.is_empty());
        assert!(!record.metadata.is_favorite);
        assert_eq!(record.primary_color, "red");
        assert_eq!(record.wear_count, 0);
        assert_eq!(record.last_worn, None);
        assert_eq!(record.status, "active");
    }

    #[test]
    fn metadata_overrides_defaults_field_by_field() {
        let metadata = map(json!({
            "name": "Red Tee",
            "brand": "Acme",
            "price": 19.5,
            "tags": ["gym"],
            "is_favorite": true
        }));
        let record = compose_record(&attributes(), Some(&metadata)).unwrap();

        assert_eq!(record.metadata.name, "Red Tee");
        assert_eq!(record.metadata.brand, "Acme");
        assert_eq!(record.metadata.price, 19.5);
        assert!(record.metadata.tags.contains("gym"));
        assert!(record.metadata.is_favorite);
        assert_eq!(record.metadata.description, "");
    }

    #[test]
    fn malformed_metadata_is_surfaced() {
        let metadata = map(json!({ "is_favorite": "yes" }));
        assert_eq!(
            compose_record(&attributes(), Some(&metadata)),
            Err(CompositionError::invalid("is_favorite", "a boolean"))
        );
    }

    #[test]
    fn empty_color_list_gives_unknown_primary() {
        let mut attrs = attributes();
        attrs.dominant_colors.clear();
        let record = compose_record(&attrs, None).unwrap();
        assert_eq!(record.primary_color, "unknown");
    }

    #[test]
    fn record_serializes_flat() {
        let record = compose_record(&attributes(), None).unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["name"], "Untitled Garment");
        assert_eq!(json["type"], "t-shirt");
        assert_eq!(json["last_worn"], Value::Null);
    }

    #[test]
    fn update_returns_new_record() {
        let original = compose_record(&attributes(), None).unwrap();
        let updated = original
            .apply_update(&map(json!({
                "name": "Renamed",
                "type": "shirt",
                "category": "outerwear",
                "wear_count": 99
            })))
            .unwrap();

        assert_eq!(original.metadata.name, "Untitled Garment");
        assert_eq!(updated.metadata.name, "Renamed");
        assert_eq!(updated.garment_type, "shirt");
        assert_eq!(updated.subcategory, "formal");
        assert_eq!(updated.category, GarmentCategory::Outerwear);
        // not an updatable field
        assert_eq!(updated.wear_count, 0);
    }

    #[test]
    fn update_without_updatable_fields_is_rejected() {
        let record = compose_record(&attributes(), None).unwrap();
        assert_eq!(
            record.apply_update(&map(json!({ "wear_count": 3 }))),
            Err(CompositionError::NoValidUpdates)
        );
    }

    #[test]
    fn update_with_unknown_category_is_rejected() {
        let record = compose_record(&attributes(), None).unwrap();
        assert!(matches!(
            record.apply_update(&map(json!({ "category": "capes" }))),
            Err(CompositionError::InvalidField { .. })
        ));
    }
}
