//! Extension-based asset classification.
//!
//! Maps a file path to a semantic asset type and the standard project
//! subdirectory that copies of that file land in. Pure functions, no I/O.

use std::path::Path;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maya scene extensions.
pub const SCENE_EXTENSIONS: &[&str] = &["ma", "mb"];

/// Geometry / interchange extensions.
pub const MODEL_EXTENSIONS: &[&str] = &["obj", "fbx", "abc", "usd", "usda", "usdc", "usdz"];

/// Image extensions treated as textures.
pub const TEXTURE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "tif", "tiff", "exr", "hdr", "tga", "bmp", "tx",
];

/// Subdirectory for files the classifier does not recognise.
pub const DEFAULT_SUBDIRECTORY: &str = "assets";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Semantic asset type stored on every asset record.
///
/// Serializes as a plain string (`"maya_scene"`, `"3d_model"`, ...). Any
/// string outside the known set round-trips through [`AssetType::Custom`],
/// which is how caller-supplied type overrides are stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AssetType {
    MayaScene,
    Model,
    Texture,
    #[default]
    Unknown,
    Custom(String),
}

impl AssetType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::MayaScene => "maya_scene",
            Self::Model => "3d_model",
            Self::Texture => "texture",
            Self::Unknown => "unknown",
            Self::Custom(label) => label,
        }
    }
}

impl From<String> for AssetType {
    fn from(label: String) -> Self {
        match label.as_str() {
            "maya_scene" => Self::MayaScene,
            "3d_model" => Self::Model,
            "texture" => Self::Texture,
            "unknown" | "" => Self::Unknown,
            _ => Self::Custom(label),
        }
    }
}

impl From<&str> for AssetType {
    fn from(label: &str) -> Self {
        Self::from(label.to_string())
    }
}

impl From<AssetType> for String {
    fn from(asset_type: AssetType) -> Self {
        match asset_type {
            AssetType::Custom(label) => label,
            other => other.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for AssetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub asset_type: AssetType,
    /// Project subdirectory that copies of this file are placed in.
    pub subdirectory: &'static str,
}

// ---------------------------------------------------------------------------
// Pure functions
// ---------------------------------------------------------------------------

/// Classify a file by its extension (case-insensitive). Never fails:
/// unrecognised or missing extensions yield [`AssetType::Unknown`].
pub fn classify(path: &Path) -> Classification {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    let ext = ext.as_str();

    let (asset_type, subdirectory) = if SCENE_EXTENSIONS.contains(&ext) {
        (AssetType::MayaScene, "scenes")
    } else if MODEL_EXTENSIONS.contains(&ext) {
        (AssetType::Model, "models")
    } else if TEXTURE_EXTENSIONS.contains(&ext) {
        (AssetType::Texture, "textures")
    } else {
        (AssetType::Unknown, DEFAULT_SUBDIRECTORY)
    };

    Classification {
        asset_type,
        subdirectory,
    }
}

/// Derive the registry name of an asset: its file name without extension.
///
/// `"/lib/hero.ma"`, `"hero.mb"` and `"hero"` all map to `"hero"`. Returns
/// an empty string for paths with no file name component (e.g. `"/"`).
pub fn asset_name_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
