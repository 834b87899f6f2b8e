//! Append-only version history per asset.
//!
//! A version entry is a snapshot of the file's path and size at the time it
//! was recorded; the ledger never copies or moves files.

use std::path::Path;

use super::{derive_asset_name, project_entry, AssetRegistry, ProjectHandle};
use crate::classify::asset_name_from_path;
use crate::error::RegistryResult;
use crate::model::VersionEntry;

impl AssetRegistry {
    /// Append the next version of the asset at `asset_path`.
    ///
    /// The version number is one more than the current history length. A
    /// path that no longer exists is recorded with size 0.
    pub fn create_asset_version(
        &mut self,
        project: &ProjectHandle,
        asset_path: impl AsRef<Path>,
        notes: &str,
    ) -> RegistryResult<VersionEntry> {
        let result = self.create_asset_version_inner(project, asset_path.as_ref(), notes);
        self.finish("create_asset_version", result)
    }

    fn create_asset_version_inner(
        &mut self,
        project: &ProjectHandle,
        asset_path: &Path,
        notes: &str,
    ) -> RegistryResult<VersionEntry> {
        let name = derive_asset_name(asset_path)?;
        let file_size = std::fs::metadata(asset_path).map(|m| m.len()).unwrap_or(0);
        let file_path =
            std::path::absolute(asset_path).unwrap_or_else(|_| asset_path.to_path_buf());

        let entry = self.commit(|doc| {
            let history = project_entry(doc, project)?
                .versions
                .entry(name.clone())
                .or_default();

            // Keep timestamps non-decreasing even if the wall clock steps back.
            let mut created = chrono::Utc::now();
            if let Some(last) = history.last() {
                created = created.max(last.created);
            }

            let entry = VersionEntry {
                version: history.len() as u32 + 1,
                created,
                notes: notes.to_string(),
                file_path,
                file_size,
            };
            history.push(entry.clone());
            Ok(entry)
        })?;

        tracing::info!(
            project = project.name(),
            asset = %name,
            version = entry.version,
            file_size,
            "Asset version created",
        );
        Ok(entry)
    }

    /// Full history of `asset`, oldest first.
    pub fn get_asset_versions(
        &self,
        project: &ProjectHandle,
        asset: impl AsRef<Path>,
    ) -> Vec<VersionEntry> {
        let name = asset_name_from_path(asset.as_ref());
        self.project(project)
            .and_then(|p| p.versions.get(&name))
            .cloned()
            .unwrap_or_default()
    }

    pub fn latest_version(
        &self,
        project: &ProjectHandle,
        asset: impl AsRef<Path>,
    ) -> Option<VersionEntry> {
        let name = asset_name_from_path(asset.as_ref());
        self.project(project)
            .and_then(|p| p.versions.get(&name))
            .and_then(|history| history.last().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::test_support::Fixture;

    #[test]
    fn versions_number_sequentially() {
        let mut fx = Fixture::new();
        let src = fx.source("hero.ma", b"scene");

        let entries: Vec<_> = ["first", "second", "third"]
            .iter()
            .map(|notes| {
                fx.registry
                    .create_asset_version(&fx.project, &src, notes)
                    .unwrap()
            })
            .collect();

        assert_eq!(
            entries.iter().map(|e| e.version).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert!(entries.windows(2).all(|w| w[0].created <= w[1].created));
        assert_eq!(fx.registry.get_asset_versions(&fx.project, "hero"), entries);
        assert_eq!(fx.registry.latest_version(&fx.project, "hero"), entries.last().cloned());
    }

    #[test]
    fn version_captures_size_and_path() {
        let mut fx = Fixture::new();
        let src = fx.source("hero.ma", b"12345");
        let entry = fx
            .registry
            .create_asset_version(&fx.project, &src, "v1")
            .unwrap();

        assert_eq!(entry.version, 1);
        assert_eq!(entry.notes, "v1");
        assert_eq!(entry.file_size, 5);
        assert_eq!(entry.file_path, src);

        let reloaded = fx.reload();
        assert_eq!(reloaded.assets_library["Demo"].versions["hero"], vec![entry]);
    }

    #[test]
    fn missing_file_records_zero_size() {
        let mut fx = Fixture::new();
        let gone = fx.dir.path().join("gone.ma");
        let entry = fx
            .registry
            .create_asset_version(&fx.project, &gone, "")
            .unwrap();
        assert_eq!(entry.file_size, 0);
        assert_eq!(entry.version, 1);
    }

    #[test]
    fn histories_are_per_asset() {
        let mut fx = Fixture::new();
        fx.registry.create_asset_version(&fx.project, "a.ma", "").unwrap();
        fx.registry.create_asset_version(&fx.project, "a.ma", "").unwrap();
        let b = fx.registry.create_asset_version(&fx.project, "b.ma", "").unwrap();

        assert_eq!(b.version, 1);
        assert_eq!(fx.registry.get_asset_versions(&fx.project, "a").len(), 2);
        assert!(fx.registry.latest_version(&fx.project, "c").is_none());
    }
}
