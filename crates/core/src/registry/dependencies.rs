//! Directed "requires" edges between asset names.
//!
//! Edges are keyed by derived asset names, so `"/lib/hero.ma"` and `"hero"`
//! refer to the same node. Cycles are allowed unless the registry was
//! opened with `enforce_acyclic`.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use super::{derive_asset_name, project_entry, AssetRegistry, ProjectHandle};
use crate::error::{RegistryError, RegistryResult};

impl AssetRegistry {
    /// Record that `asset` requires `dependency`. `Ok(false)` if the edge exists.
    pub fn track_dependency(
        &mut self,
        project: &ProjectHandle,
        asset: impl AsRef<Path>,
        dependency: impl AsRef<Path>,
    ) -> RegistryResult<bool> {
        let result = self.track_dependency_inner(project, asset.as_ref(), dependency.as_ref());
        self.finish("track_dependency", result)
    }

    fn track_dependency_inner(
        &mut self,
        project: &ProjectHandle,
        asset: &Path,
        dependency: &Path,
    ) -> RegistryResult<bool> {
        let asset = derive_asset_name(asset)?;
        let dependency = derive_asset_name(dependency)?;
        if asset == dependency {
            return Err(RegistryError::Validation(format!(
                "Asset '{asset}' cannot depend on itself"
            )));
        }

        if let Some(current) = self.project(project) {
            if current
                .dependencies
                .get(&asset)
                .is_some_and(|deps| deps.contains(&dependency))
            {
                tracing::debug!(
                    asset = %asset,
                    dependency = %dependency,
                    "Dependency already tracked"
                );
                return Ok(false);
            }
            if self.enforce_acyclic && reaches(&current.dependencies, &dependency, &asset) {
                return Err(RegistryError::Validation(format!(
                    "Dependency '{asset}' -> '{dependency}' would create a cycle"
                )));
            }
        }

        self.commit(|doc| {
            project_entry(doc, project)?
                .dependencies
                .entry(asset.clone())
                .or_default()
                .push(dependency.clone());
            Ok(())
        })?;

        tracing::info!(
            project = project.name(),
            asset = %asset,
            dependency = %dependency,
            "Dependency tracked"
        );
        Ok(true)
    }

    /// Drop an edge. `Ok(false)` if it was not tracked.
    pub fn remove_dependency(
        &mut self,
        project: &ProjectHandle,
        asset: impl AsRef<Path>,
        dependency: impl AsRef<Path>,
    ) -> RegistryResult<bool> {
        let result = self.remove_dependency_inner(project, asset.as_ref(), dependency.as_ref());
        self.finish("remove_dependency", result)
    }

    fn remove_dependency_inner(
        &mut self,
        project: &ProjectHandle,
        asset: &Path,
        dependency: &Path,
    ) -> RegistryResult<bool> {
        let asset = derive_asset_name(asset)?;
        let dependency = derive_asset_name(dependency)?;
        let tracked = self
            .project(project)
            .and_then(|p| p.dependencies.get(&asset))
            .is_some_and(|deps| deps.contains(&dependency));
        if !tracked {
            return Ok(false);
        }

        self.commit(|doc| {
            let deps = &mut project_entry(doc, project)?.dependencies;
            if let Some(list) = deps.get_mut(&asset) {
                list.retain(|d| *d != dependency);
                if list.is_empty() {
                    deps.remove(&asset);
                }
            }
            Ok(())
        })?;

        tracing::info!(asset = %asset, dependency = %dependency, "Dependency removed");
        Ok(true)
    }

    /// Direct prerequisites of `asset`, in insertion order.
    pub fn get_dependencies(
        &self,
        project: &ProjectHandle,
        asset: impl AsRef<Path>,
    ) -> Vec<String> {
        let asset = crate::classify::asset_name_from_path(asset.as_ref());
        self.project(project)
            .and_then(|p| p.dependencies.get(&asset))
            .cloned()
            .unwrap_or_default()
    }

    /// Assets that directly require `asset`, ordered by name.
    pub fn get_dependents(&self, project: &ProjectHandle, asset: impl AsRef<Path>) -> Vec<String> {
        let asset = crate::classify::asset_name_from_path(asset.as_ref());
        self.project(project)
            .map(|p| {
                p.dependencies
                    .iter()
                    .filter(|(_, deps)| deps.contains(&asset))
                    .map(|(name, _)| name.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// `true` if `target` is reachable from `start` by following edges.
fn reaches(edges: &BTreeMap<String, Vec<String>>, start: &str, target: &str) -> bool {
    let mut stack = vec![start];
    let mut seen = HashSet::new();
    while let Some(node) = stack.pop() {
        if node == target {
            return true;
        }
        if !seen.insert(node) {
            continue;
        }
        if let Some(next) = edges.get(node) {
            stack.extend(next.iter().map(String::as_str));
        }
    }
    false
}
