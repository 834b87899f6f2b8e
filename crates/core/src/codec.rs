//! JSON persistence for the registry document.
//!
//! Loading is tolerant (missing file or missing keys yield empty state).
//! Saving writes a sibling temp file and renames it over the target, so a
//! failed save leaves the previous document intact.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::{RegistryError, RegistryResult};
use crate::model::RegistryDocument;

/// Notified after every successful save of the registry document.
///
/// Hosts use this to keep a config manager or UI in sync with the file.
pub trait SaveHook: Send + Sync {
    fn saved(&self, document: &Path);
}

impl RegistryDocument {
    /// Read a document from `path`. A missing or empty file is the empty registry.
    pub fn load(path: &Path) -> RegistryResult<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No registry document yet, starting empty");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(RegistryError::io(
                    format!("reading {}", path.display()),
                    e,
                ))
            }
        };

        Self::from_json(&text)
    }

    /// Parse a document. Blank input is the empty registry.
    pub fn from_json(text: &str) -> RegistryResult<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> RegistryResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the document to `path`, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> RegistryResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| RegistryError::io(format!("creating {}", parent.display()), e))?;
        }

        let json = self.to_json()?;
        let tmp = temp_path(path);
        std::fs::write(&tmp, json)
            .map_err(|e| RegistryError::io(format!("writing {}", tmp.display()), e))?;
        std::fs::rename(&tmp, path).map_err(|e| {
            let _ = std::fs::remove_file(&tmp);
            RegistryError::io(format!("replacing {}", path.display()), e)
        })?;

        tracing::trace!(path = %path.display(), "Registry document saved");
        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("registry"));
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use assert_matches::assert_matches;

    use super::*;
    use crate::classify::AssetType;
    use crate::model::{AssetRecord, Collection, Project, VersionEntry};

    fn sample_document() -> RegistryDocument {
        let mut project = Project::new(PathBuf::from("/p/Demo"));
        project.registered_assets.insert(
            "hero".into(),
            AssetRecord {
                path: PathBuf::from("/p/Demo/scenes/hero.ma"),
                original_path: PathBuf::from("/src/hero.ma"),
                registered: chrono::Utc::now(),
                asset_type: AssetType::MayaScene,
                size: 128,
                copied_to_project: true,
                description: String::new(),
            },
        );
        let mut heroes = Collection::new("leads");
        heroes.assets.push("hero".into());
        project.collections.insert("Heroes".into(), heroes);
        project.collections.insert("Empty".into(), Collection::new(""));
        project
            .dependencies
            .insert("hero".into(), vec!["rig".into()]);
        project.versions.insert(
            "hero".into(),
            vec![VersionEntry {
                version: 1,
                created: chrono::Utc::now(),
                notes: "v1".into(),
                file_path: PathBuf::from("/p/Demo/scenes/hero.ma"),
                file_size: 128,
            }],
        );

        let mut doc = RegistryDocument {
            current_project: Some(PathBuf::from("/p/Demo")),
            ..Default::default()
        };
        doc.assets_library.insert("Demo".into(), project);
        doc.assets_library
            .insert("Bare".into(), Project::new(PathBuf::from("/p/Bare")));
        doc
    }

    #[test]
    fn save_then_load_reproduces_document() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("registry.json");
        let doc = sample_document();

        doc.save(&path).expect("save");
        let loaded = RegistryDocument::load(&path).expect("load");

        assert_eq!(loaded, doc);
        assert!(loaded.assets_library["Bare"].collections.is_empty());
    }

    #[test]
    fn save_leaves_no_temp_file_behind() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("nested").join("registry.json");
        RegistryDocument::default().save(&path).expect("save");

        assert!(path.exists());
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let doc = RegistryDocument::load(&dir.path().join("absent.json")).expect("load");
        assert_eq!(doc, RegistryDocument::default());
    }

    #[test]
    fn missing_top_level_keys_default() {
        let doc = RegistryDocument::from_json("{}").expect("parse");
        assert!(doc.current_project.is_none());
        assert!(doc.assets_library.is_empty());
        assert_eq!(doc.import_cooldown, 2.0);

        let blank = RegistryDocument::from_json("  \n").expect("parse");
        assert_eq!(blank, RegistryDocument::default());
    }

    #[test]
    fn malformed_json_is_serialization_error() {
        assert_matches!(
            RegistryDocument::from_json("{ not json"),
            Err(RegistryError::Serialization(_))
        );
    }

    #[test]
    fn document_layout_matches_schema() {
        let json: serde_json::Value =
            serde_json::from_str(&sample_document().to_json().unwrap()).unwrap();
        assert_eq!(json["current_project"], "/p/Demo");
        assert_eq!(json["import_cooldown"], 2.0);
        let demo = &json["assets_library"]["Demo"];
        assert_eq!(demo["registered_assets"]["hero"]["type"], "maya_scene");
        assert_eq!(demo["collections"]["Heroes"]["assets"], serde_json::json!(["hero"]));
        assert_eq!(demo["dependencies"]["hero"], serde_json::json!(["rig"]));
        assert_eq!(demo["versions"]["hero"][0]["version"], 1);
        assert_eq!(demo["versions"]["hero"][0]["notes"], "v1");
    }
}
