//! Named, ordered groupings of asset names.

use std::collections::BTreeMap;

use super::{project_entry, AssetRegistry, ProjectHandle};
use crate::error::{RegistryError, RegistryResult};
use crate::model::Collection;

impl AssetRegistry {
    /// Create a collection. Duplicates in `initial_assets` are dropped,
    /// keeping first occurrence order. An existing name is a conflict and
    /// the existing collection is left as it was.
    pub fn create_collection<I, S>(
        &mut self,
        project: &ProjectHandle,
        name: &str,
        initial_assets: I,
        description: &str,
    ) -> RegistryResult<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut collection = Collection::new(description);
        for asset in initial_assets {
            let asset = asset.into();
            if !collection.contains(&asset) {
                collection.assets.push(asset);
            }
        }
        let result = self.create_collection_inner(project, name, collection);
        self.finish("create_collection", result)
    }

    fn create_collection_inner(
        &mut self,
        project: &ProjectHandle,
        name: &str,
        collection: Collection,
    ) -> RegistryResult<()> {
        if name.trim().is_empty() {
            return Err(RegistryError::Validation(
                "Collection name must not be empty".to_string(),
            ));
        }
        if self
            .project(project)
            .is_some_and(|p| p.collections.contains_key(name))
        {
            return Err(RegistryError::Conflict(format!(
                "Collection '{name}' already exists"
            )));
        }

        let size = collection.assets.len();
        self.commit(|doc| {
            project_entry(doc, project)?
                .collections
                .insert(name.to_string(), collection);
            Ok(())
        })?;

        tracing::info!(
            project = project.name(),
            collection = name,
            assets = size,
            "Collection created"
        );
        Ok(())
    }

    /// Append `asset` to a collection. `Ok(false)` if it is already there.
    pub fn add_asset_to_collection(
        &mut self,
        project: &ProjectHandle,
        collection: &str,
        asset: &str,
    ) -> RegistryResult<bool> {
        let result = self.add_asset_to_collection_inner(project, collection, asset);
        self.finish("add_asset_to_collection", result)
    }

    fn add_asset_to_collection_inner(
        &mut self,
        project: &ProjectHandle,
        collection: &str,
        asset: &str,
    ) -> RegistryResult<bool> {
        if self.lookup_collection(project, collection)?.contains(asset) {
            tracing::debug!(collection, asset, "Asset already in collection");
            return Ok(false);
        }

        self.commit(|doc| {
            collection_mut(doc, project, collection)?
                .assets
                .push(asset.to_string());
            Ok(())
        })?;

        tracing::info!(collection, asset, "Asset added to collection");
        Ok(true)
    }

    /// Remove `asset` from a collection. `Ok(false)` if it was not there.
    pub fn remove_asset_from_collection(
        &mut self,
        project: &ProjectHandle,
        collection: &str,
        asset: &str,
    ) -> RegistryResult<bool> {
        let result = self.remove_asset_from_collection_inner(project, collection, asset);
        self.finish("remove_asset_from_collection", result)
    }

    fn remove_asset_from_collection_inner(
        &mut self,
        project: &ProjectHandle,
        collection: &str,
        asset: &str,
    ) -> RegistryResult<bool> {
        if !self.lookup_collection(project, collection)?.contains(asset) {
            return Ok(false);
        }

        self.commit(|doc| {
            collection_mut(doc, project, collection)?
                .assets
                .retain(|a| a != asset);
            Ok(())
        })?;

        tracing::info!(collection, asset, "Asset removed from collection");
        Ok(true)
    }

    pub fn delete_collection(
        &mut self,
        project: &ProjectHandle,
        name: &str,
    ) -> RegistryResult<Collection> {
        let result = self.delete_collection_inner(project, name);
        self.finish("delete_collection", result)
    }

    fn delete_collection_inner(
        &mut self,
        project: &ProjectHandle,
        name: &str,
    ) -> RegistryResult<Collection> {
        self.lookup_collection(project, name)?;
        let removed = self.commit(|doc| {
            project_entry(doc, project)?
                .collections
                .remove(name)
                .ok_or_else(|| RegistryError::not_found("Collection", name))
        })?;

        tracing::info!(project = project.name(), collection = name, "Collection deleted");
        Ok(removed)
    }

    pub fn get_collections(&self, project: &ProjectHandle) -> BTreeMap<String, Collection> {
        self.project(project)
            .map(|p| p.collections.clone())
            .unwrap_or_default()
    }

    /// Drop collection entries whose asset is no longer registered.
    ///
    /// Returns how many entries were removed. Nothing is saved when the
    /// collections are already clean.
    pub fn prune_collections(&mut self, project: &ProjectHandle) -> RegistryResult<usize> {
        let result = self.prune_collections_inner(project);
        self.finish("prune_collections", result)
    }

    fn prune_collections_inner(&mut self, project: &ProjectHandle) -> RegistryResult<usize> {
        let Some(current) = self.project(project) else {
            return Ok(0);
        };
        let stale = current
            .collections
            .values()
            .flat_map(|c| c.assets.iter())
            .filter(|a| !current.registered_assets.contains_key(*a))
            .count();
        if stale == 0 {
            return Ok(0);
        }

        self.commit(|doc| {
            let project = project_entry(doc, project)?;
            let registered = &project.registered_assets;
            for collection in project.collections.values_mut() {
                collection.assets.retain(|a| registered.contains_key(a));
            }
            Ok(())
        })?;

        tracing::info!(
            project = project.name(),
            removed = stale,
            "Pruned stale collection entries"
        );
        Ok(stale)
    }

    fn lookup_collection(
        &self,
        project: &ProjectHandle,
        name: &str,
    ) -> RegistryResult<&Collection> {
        self.project(project)
            .and_then(|p| p.collections.get(name))
            .ok_or_else(|| RegistryError::not_found("Collection", name))
    }
}

fn collection_mut<'a>(
    doc: &'a mut crate::model::RegistryDocument,
    project: &ProjectHandle,
    name: &str,
) -> RegistryResult<&'a mut Collection> {
    project_entry(doc, project)?
        .collections
        .get_mut(name)
        .ok_or_else(|| RegistryError::not_found("Collection", name))
}
