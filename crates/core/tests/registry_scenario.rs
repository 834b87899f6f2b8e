//! End-to-end tests for the asset registry.
//!
//! Drive the public API the way a UI layer would: create a project, register
//! files, group and link them, version them, then reopen the document from
//! disk in a fresh registry.

use std::path::Path;

use assert_matches::assert_matches;

use assetman_core::registry::STANDARD_SUBDIRECTORIES;
use assetman_core::{
    AssetRegistry, AssetType, RegisterOptions, RegistryConfig, RegistryDocument, RegistryError,
};

fn open(dir: &Path) -> AssetRegistry {
    let config = RegistryConfig::with_document_path(dir.join("registry.json"));
    AssetRegistry::open(&config).expect("open registry")
}

fn write_source(dir: &Path, name: &str, body: &[u8]) -> std::path::PathBuf {
    let src = dir.join("incoming");
    std::fs::create_dir_all(&src).expect("create source dir");
    let path = src.join(name);
    std::fs::write(&path, body).expect("write source");
    path
}

// ---------------------------------------------------------------------------
// Test: full demo workflow
// ---------------------------------------------------------------------------

#[test]
fn demo_project_workflow() {
    let tmp = tempfile::tempdir().expect("create temp dir");
    let mut registry = open(tmp.path());

    let demo = registry
        .create_project("Demo", tmp.path())
        .expect("create project");
    for sub in STANDARD_SUBDIRECTORIES {
        assert!(demo.root().join(sub).is_dir(), "missing {sub}");
    }

    let hero_src = write_source(tmp.path(), "hero.ma", b"//Maya ASCII 2024 scene\n");
    let record = registry
        .register_asset(&demo, &hero_src, &RegisterOptions::default())
        .expect("register hero");
    assert!(record.path.ends_with("Demo/scenes/hero.ma"));
    assert_eq!(record.asset_type, AssetType::MayaScene);
    assert_eq!(
        registry.get_registered_assets(&demo)["hero"].size,
        std::fs::metadata(&hero_src).unwrap().len()
    );

    registry
        .create_collection(&demo, "Heroes", Vec::<String>::new(), "")
        .expect("create collection");
    registry
        .add_asset_to_collection(&demo, "Heroes", "hero")
        .expect("add to collection");
    assert_eq!(registry.get_collections(&demo)["Heroes"].assets, vec!["hero"]);

    registry
        .track_dependency(&demo, "hero", "rig")
        .expect("track dependency");
    assert_eq!(
        registry.get_project_info("Demo").unwrap().dependencies["hero"],
        vec!["rig"]
    );

    let version = registry
        .create_asset_version(&demo, &record.path, "v1")
        .expect("create version");
    assert_eq!(version.version, 1);
    assert_eq!(version.notes, "v1");

    let stats = registry.stats().snapshot();
    assert_eq!(stats.registrations, 1);
    assert_eq!(stats.imports, 1);
    assert_eq!(stats.errors, 0);
}

// ---------------------------------------------------------------------------
// Test: persistence round-trip through a fresh registry
// ---------------------------------------------------------------------------

#[test]
fn reopened_registry_matches_original_state() {
    let tmp = tempfile::tempdir().expect("create temp dir");
    let mut registry = open(tmp.path());
    let demo = registry.create_project("Demo", tmp.path()).unwrap();

    let tex = write_source(tmp.path(), "skin.png", b"\x89PNG");
    registry
        .register_asset(&demo, &tex, &RegisterOptions::default())
        .unwrap();
    registry
        .create_collection(&demo, "Empty", Vec::<String>::new(), "nothing yet")
        .unwrap();
    registry.track_dependency(&demo, "hero", "skin").unwrap();
    registry.create_asset_version(&demo, &tex, "first").unwrap();
    registry.tag_asset(&demo, "skin", "lookdev").unwrap();
    registry.create_project("Other", tmp.path()).unwrap();

    let reopened = open(tmp.path());
    assert_eq!(reopened.document(), registry.document());
    assert_eq!(reopened.list_projects(), vec!["Demo", "Other"]);

    let other = reopened.get_project_info("Other").unwrap();
    assert!(other.registered_assets.is_empty());
    assert!(other.collections.is_empty());

    let raw: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(tmp.path().join("registry.json")).unwrap(),
    )
    .unwrap();
    for key in ["registered_assets", "collections", "dependencies", "versions"] {
        assert!(raw["assets_library"]["Other"][key].is_object(), "{key}");
    }
}

#[test]
fn legacy_document_without_optional_keys_loads() {
    let tmp = tempfile::tempdir().expect("create temp dir");
    let doc_path = tmp.path().join("registry.json");
    std::fs::write(
        &doc_path,
        r#"{
            "assets_library": {
                "Old": {
                    "path": "/shows/Old",
                    "created": "2023-05-01T12:00:00Z",
                    "registered_assets": {
                        "tree": {
                            "path": "/shows/Old/models/tree.obj",
                            "original_path": "/lib/tree.obj",
                            "registered": "2023-05-01T12:01:00Z",
                            "type": "3d_model",
                            "size": 10,
                            "copied_to_project": true,
                            "description": ""
                        }
                    }
                }
            }
        }"#,
    )
    .unwrap();

    let doc = RegistryDocument::load(&doc_path).expect("load legacy document");
    let old = &doc.assets_library["Old"];
    assert_eq!(old.registered_assets["tree"].asset_type, AssetType::Model);
    assert!(old.collections.is_empty());
    assert!(old.tags.is_empty());
    assert!(doc.current_project.is_none());
}

// ---------------------------------------------------------------------------
// Test: error surface
// ---------------------------------------------------------------------------

#[test]
fn rejections_do_not_touch_the_document() {
    let tmp = tempfile::tempdir().expect("create temp dir");
    let mut registry = open(tmp.path());
    let demo = registry.create_project("Demo", tmp.path()).unwrap();
    registry
        .create_collection(&demo, "X", ["a"], "")
        .unwrap();
    let before = std::fs::read_to_string(registry.document_path()).unwrap();

    assert_matches!(
        registry.create_collection(&demo, "X", ["b"], ""),
        Err(RegistryError::Conflict(_))
    );
    assert_matches!(
        registry.track_dependency(&demo, "/a/hero.ma", "hero"),
        Err(RegistryError::Validation(_))
    );
    assert_matches!(
        registry.remove_asset_from_library(&demo, "ghost", true),
        Err(RegistryError::NotFound { .. })
    );
    assert!(!registry.add_asset_to_collection(&demo, "X", "a").unwrap());

    let after = std::fs::read_to_string(registry.document_path()).unwrap();
    assert_eq!(before, after);
}
