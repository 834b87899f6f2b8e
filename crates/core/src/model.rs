//! Typed records persisted in the registry document.
//!
//! Field names match the on-disk JSON layout. Every map inside a project
//! defaults to empty on load, so documents written before a map existed
//! (e.g. without `tags`) still parse.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::classify::AssetType;
use crate::types::Timestamp;

/// Default import cooldown stored in new documents, in seconds.
pub const DEFAULT_IMPORT_COOLDOWN_SECS: f64 = 2.0;

fn now() -> Timestamp {
    chrono::Utc::now()
}

fn default_import_cooldown() -> f64 {
    DEFAULT_IMPORT_COOLDOWN_SECS
}

/// A file registered into a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord {
    /// Resolved location: the project copy, or the source when referenced in place.
    pub path: PathBuf,
    pub original_path: PathBuf,
    #[serde(default = "now")]
    pub registered: Timestamp,
    #[serde(rename = "type", default)]
    pub asset_type: AssetType,
    /// Size in bytes at registration time.
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub copied_to_project: bool,
    #[serde(default)]
    pub description: String,
}

/// A named, ordered group of asset names.
///
/// Entries are names, not references: an entry may outlive the asset it
/// names until [`prune_collections`](crate::registry::AssetRegistry::prune_collections) runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    #[serde(default = "now")]
    pub created: Timestamp,
    #[serde(default)]
    pub assets: Vec<String>,
    #[serde(default)]
    pub description: String,
}

impl Collection {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            created: now(),
            assets: Vec::new(),
            description: description.into(),
        }
    }

    pub fn contains(&self, asset: &str) -> bool {
        self.assets.iter().any(|a| a == asset)
    }
}

/// One entry in an asset's append-only version history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionEntry {
    /// 1-based, strictly increasing per asset.
    pub version: u32,
    #[serde(default = "now")]
    pub created: Timestamp,
    #[serde(default)]
    pub notes: String,
    pub file_path: PathBuf,
    #[serde(default)]
    pub file_size: u64,
}

/// Everything the registry knows about one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Absolute project root.
    pub path: PathBuf,
    #[serde(default = "now")]
    pub created: Timestamp,
    #[serde(default)]
    pub registered_assets: BTreeMap<String, AssetRecord>,
    #[serde(default)]
    pub collections: BTreeMap<String, Collection>,
    /// Dependent asset name -> prerequisite asset names, in insertion order.
    #[serde(default)]
    pub dependencies: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub versions: BTreeMap<String, Vec<VersionEntry>>,
    /// Tag -> asset names carrying it.
    #[serde(default)]
    pub tags: BTreeMap<String, Vec<String>>,
}

impl Project {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            created: now(),
            registered_assets: BTreeMap::new(),
            collections: BTreeMap::new(),
            dependencies: BTreeMap::new(),
            versions: BTreeMap::new(),
            tags: BTreeMap::new(),
        }
    }
}

/// The persistence unit: every project plus the active-project pointer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryDocument {
    #[serde(default)]
    pub current_project: Option<PathBuf>,
    #[serde(default)]
    pub assets_library: BTreeMap<String, Project>,
    /// Import cooldown window in seconds.
    #[serde(default = "default_import_cooldown")]
    pub import_cooldown: f64,
}

impl Default for RegistryDocument {
    fn default() -> Self {
        Self {
            current_project: None,
            assets_library: BTreeMap::new(),
            import_cooldown: DEFAULT_IMPORT_COOLDOWN_SECS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_record_uses_document_field_names() {
        let record = AssetRecord {
            path: PathBuf::from("/p/Demo/scenes/hero.ma"),
            original_path: PathBuf::from("/src/hero.ma"),
            registered: now(),
            asset_type: AssetType::MayaScene,
            size: 42,
            copied_to_project: true,
            description: "lead".into(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "maya_scene");
        assert_eq!(json["size"], 42);
        assert_eq!(json["copied_to_project"], true);
        assert_eq!(json["original_path"], "/src/hero.ma");
        assert!(json.get("asset_type").is_none());
    }

    #[test]
    fn project_without_maps_loads_empty() {
        let json = serde_json::json!({
            "path": "/p/Demo",
            "created": "2024-01-01T00:00:00Z"
        });
        let project: Project = serde_json::from_value(json).unwrap();
        assert!(project.registered_assets.is_empty());
        assert!(project.collections.is_empty());
        assert!(project.dependencies.is_empty());
        assert!(project.versions.is_empty());
        assert!(project.tags.is_empty());
    }

    #[test]
    fn new_project_serializes_every_map() {
        let json = serde_json::to_value(Project::new(PathBuf::from("/p/Demo"))).unwrap();
        for key in ["registered_assets", "collections", "dependencies", "versions", "tags"] {
            assert_eq!(json[key], serde_json::json!({}), "{key}");
        }
    }

    #[test]
    fn collection_contains() {
        let mut c = Collection::new("");
        c.assets.push("hero".into());
        assert!(c.contains("hero"));
        assert!(!c.contains("rig"));
    }
}
