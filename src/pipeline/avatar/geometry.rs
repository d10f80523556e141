use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::synthesizer::AvatarConfig;

pub const MODEL_FORMAT: &str = "gltf";
pub const MODEL_VERSION: &str = "1.0";

/// Height the placeholder mesh is modelled at.
const BASELINE_HEIGHT: f64 = 170.0;

type ColorTable = [(&'static str, [f32; 3])];

const SKIN_COLORS: &ColorTable = &[
    ("light", [0.95, 0.87, 0.82]),
    ("medium", [0.85, 0.72, 0.63]),
    ("medium_dark", [0.72, 0.58, 0.48]),
    ("dark", [0.45, 0.35, 0.28]),
];
const HAIR_COLORS: &ColorTable = &[
    ("black", [0.1, 0.1, 0.1]),
    ("brown", [0.4, 0.2, 0.1]),
    ("blonde", [0.9, 0.8, 0.6]),
    ("red", [0.7, 0.3, 0.2]),
    ("gray", [0.5, 0.5, 0.5]),
    ("white", [0.9, 0.9, 0.9]),
];
const EYE_COLORS: &ColorTable = &[
    ("brown", [0.4, 0.2, 0.1]),
    ("blue", [0.2, 0.4, 0.8]),
    ("green", [0.2, 0.6, 0.3]),
    ("hazel", [0.5, 0.4, 0.2]),
    ("gray", [0.5, 0.5, 0.6]),
];

const SKIN_FALLBACK: [f32; 3] = [0.85, 0.72, 0.63];
const HAIR_FALLBACK: [f32; 3] = [0.4, 0.2, 0.1];
const EYE_FALLBACK: [f32; 3] = [0.4, 0.2, 0.1];

// (x, y / height scale, z) per vertex: head top, face, neck, shoulders,
// waist, knees, feet.
const VERTEX_TEMPLATE: [[f32; 3]; 10] = [
    [0.0, 1.8, 0.0],
    [0.0, 1.6, 0.1],
    [0.0, 1.4, 0.0],
    [0.2, 1.2, 0.0],
    [-0.2, 1.2, 0.0],
    [0.0, 0.8, 0.0],
    [0.1, 0.4, 0.0],
    [-0.1, 0.4, 0.0],
    [0.1, 0.0, 0.0],
    [-0.1, 0.0, 0.0],
];

const FACES: [u32; 15] = [0, 1, 2, 2, 3, 4, 4, 5, 6, 6, 7, 8, 8, 9, 0];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PbrMaterial {
    #[serde(rename = "type")]
    pub shading: String,
    #[serde(rename = "baseColor")]
    pub base_color: [f32; 3],
    pub roughness: f32,
    pub metallic: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normal_map: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emission: Option<f32>,
}

impl PbrMaterial {
    fn pbr(base_color: [f32; 3], roughness: f32, metallic: f32) -> Self {
        Self {
            shading: "pbr".to_string(),
            base_color,
            roughness,
            metallic,
            normal_map: None,
            emission: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    /// Flat xyz triples.
    pub vertices: Vec<f32>,
    pub faces: Vec<u32>,
    pub materials: IndexMap<String, PbrMaterial>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextureSet {
    pub skin: String,
    pub hair: String,
    pub eyes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationSet {
    pub idle: String,
    pub walk: String,
    pub pose: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub version: String,
    pub config: AvatarConfig,
}

/// Stand-in 3D asset for an avatar config. Regenerated, never edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvatarModelBundle {
    pub format: String,
    pub geometry: Geometry,
    pub textures: TextureSet,
    pub animations: AnimationSet,
    pub metadata: ModelMetadata,
}

/// Builds the placeholder bundle. Unrecognized colour keys fall back to the
/// medium skin and brown hair/eye entries, so this never fails.
pub fn generate_model(config: &AvatarConfig) -> AvatarModelBundle {
    AvatarModelBundle {
        format: MODEL_FORMAT.to_string(),
        geometry: Geometry {
            vertices: scaled_vertices(config.height),
            faces: FACES.to_vec(),
            materials: materials(config),
        },
        textures: TextureSet {
            skin: format!("skin_{}.jpg", config.skin_tone),
            hair: format!("hair_{}.jpg", config.hair_color),
            eyes: format!("eyes_{}.jpg", config.eye_color),
        },
        animations: AnimationSet {
            idle: "idle_animation.json".to_string(),
            walk: "walk_animation.json".to_string(),
            pose: "pose_animation.json".to_string(),
        },
        metadata: ModelMetadata {
            version: MODEL_VERSION.to_string(),
            config: config.clone(),
        },
    }
}

fn scaled_vertices(height: f64) -> Vec<f32> {
    let scale = (height / BASELINE_HEIGHT) as f32;
    VERTEX_TEMPLATE
        .iter()
        .flat_map(|[x, y, z]| [*x, y * scale, *z])
        .collect()
}

fn materials(config: &AvatarConfig) -> IndexMap<String, PbrMaterial> {
    let mut skin = PbrMaterial::pbr(
        lookup_color(SKIN_COLORS, &config.skin_tone, SKIN_FALLBACK),
        0.8,
        0.0,
    );
    skin.normal_map = Some(format!("skin_normal_{}.jpg", config.skin_tone));

    let hair = PbrMaterial::pbr(
        lookup_color(HAIR_COLORS, &config.hair_color, HAIR_FALLBACK),
        0.9,
        0.1,
    );

    let mut eyes = PbrMaterial::pbr(
        lookup_color(EYE_COLORS, &config.eye_color, EYE_FALLBACK),
        0.1,
        0.0,
    );
    eyes.emission = Some(0.1);

    IndexMap::from([
        ("skin".to_string(), skin),
        ("hair".to_string(), hair),
        ("eyes".to_string(), eyes),
    ])
}

fn lookup_color(table: &ColorTable, key: &str, fallback: [f32; 3]) -> [f32; 3] {
    table
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, color)| *color)
        .unwrap_or(fallback)
}
