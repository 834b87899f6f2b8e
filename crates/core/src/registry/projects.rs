//! Project creation, selection and lookup.

use std::path::Path;

use super::{absolute, AssetRegistry, ProjectHandle};
use crate::error::{RegistryError, RegistryResult};
use crate::model::Project;

/// Subdirectories created under every new project root.
pub const STANDARD_SUBDIRECTORIES: [&str; 6] =
    ["models", "textures", "scenes", "exports", "references", "cache"];

impl AssetRegistry {
    /// Create `base_path/name` with the standard layout and make it current.
    ///
    /// Existing directories are fine. An existing record with the same name
    /// keeps its assets and is re-pointed at the new root. Directories created
    /// before a filesystem error are left in place.
    pub fn create_project(
        &mut self,
        name: &str,
        base_path: impl AsRef<Path>,
    ) -> RegistryResult<ProjectHandle> {
        let result = self.create_project_inner(name, base_path.as_ref());
        self.finish("create_project", result)
    }

    fn create_project_inner(
        &mut self,
        name: &str,
        base_path: &Path,
    ) -> RegistryResult<ProjectHandle> {
        validate_project_name(name)?;

        let root = absolute(&base_path.join(name))?;
        for sub in STANDARD_SUBDIRECTORIES {
            let dir = root.join(sub);
            std::fs::create_dir_all(&dir)
                .map_err(|e| RegistryError::io(format!("creating {}", dir.display()), e))?;
        }

        let handle = ProjectHandle::with_name(name, root.clone());
        self.commit(|doc| {
            doc.assets_library
                .entry(name.to_string())
                .and_modify(|project| project.path = root.clone())
                .or_insert_with(|| Project::new(root.clone()));
            doc.current_project = Some(root.clone());
            Ok(())
        })?;

        tracing::info!(project = name, path = %handle.root().display(), "Project created");
        Ok(handle)
    }

    /// Make an existing directory the current project.
    ///
    /// The directory need not have been created by [`create_project`](Self::create_project);
    /// its record is materialized on the first mutation.
    pub fn set_current_project(&mut self, path: impl AsRef<Path>) -> RegistryResult<ProjectHandle> {
        let result = self.set_current_project_inner(path.as_ref());
        self.finish("set_current_project", result)
    }

    fn set_current_project_inner(&mut self, path: &Path) -> RegistryResult<ProjectHandle> {
        if !path.exists() {
            return Err(RegistryError::not_found(
                "Project directory",
                path.display().to_string(),
            ));
        }

        let root = absolute(path)?;
        let handle = self.handle_for_root(&root);
        self.commit(|doc| {
            doc.current_project = Some(root.clone());
            Ok(())
        })?;

        tracing::info!(project = handle.name(), path = %root.display(), "Current project set");
        Ok(handle)
    }

    /// Handle for the persisted current project, if any.
    pub fn current_project(&self) -> Option<ProjectHandle> {
        self.document
            .current_project
            .as_deref()
            .map(|root| self.handle_for_root(root))
    }

    pub fn get_project_info(&self, name: &str) -> Option<&Project> {
        self.document.assets_library.get(name)
    }

    pub fn list_projects(&self) -> Vec<String> {
        self.document.assets_library.keys().cloned().collect()
    }

    /// Prefer the name of a known project at `root`; fall back to the base name.
    fn handle_for_root(&self, root: &Path) -> ProjectHandle {
        self.document
            .assets_library
            .iter()
            .find(|(_, project)| project.path == root)
            .map(|(name, _)| ProjectHandle::with_name(name.clone(), root))
            .unwrap_or_else(|| ProjectHandle::new(root))
    }
}

fn validate_project_name(name: &str) -> RegistryResult<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(RegistryError::Validation(
            "Project name must not be empty".to_string(),
        ));
    }
    if trimmed != name || name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(RegistryError::Validation(format!(
            "Invalid project name '{name}': must be a single directory name"
        )));
    }
    Ok(())
}
