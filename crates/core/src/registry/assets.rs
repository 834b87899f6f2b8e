//! Asset registration, removal, search and export.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::{absolute, derive_asset_name, project_entry, AssetRegistry, ProjectHandle};
use crate::classify::{classify, AssetType};
use crate::error::{RegistryError, RegistryResult};
use crate::model::AssetRecord;

/// Options for [`AssetRegistry::register_asset`].
#[derive(Debug, Clone)]
pub struct RegisterOptions {
    /// Copy the file into the project's typed subdirectory.
    pub copy_to_project: bool,
    /// Stored type; the classifier result is used when `None`.
    pub type_override: Option<AssetType>,
    pub description: String,
    /// Overwrite an existing record with the same name. When `false`, a
    /// name clash is a [`RegistryError::Conflict`].
    pub replace: bool,
}

impl Default for RegisterOptions {
    fn default() -> Self {
        Self {
            copy_to_project: true,
            type_override: None,
            description: String::new(),
            replace: true,
        }
    }
}

/// Outcome of [`AssetRegistry::register_multiple_assets`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    /// Names of the assets that were registered, in input order.
    pub registered: Vec<String>,
    pub failed: Vec<FailedRegistration>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedRegistration {
    pub path: PathBuf,
    pub reason: String,
}

/// Filter for [`AssetRegistry::find_assets`]. Empty fields match everything.
#[derive(Debug, Clone, Default)]
pub struct AssetQuery {
    /// Case-insensitive substring of the asset name or description.
    pub text: Option<String>,
    pub asset_type: Option<AssetType>,
}

impl AssetQuery {
    fn matches(&self, name: &str, record: &AssetRecord) -> bool {
        let type_ok = self
            .asset_type
            .as_ref()
            .map_or(true, |ty| *ty == record.asset_type);
        let text_ok = self.text.as_deref().map_or(true, |text| {
            let needle = text.to_lowercase();
            name.to_lowercase().contains(&needle)
                || record.description.to_lowercase().contains(&needle)
        });
        type_ok && text_ok
    }
}

impl AssetRegistry {
    /// Register `source` into the project, copying it in unless
    /// `options.copy_to_project` is off.
    ///
    /// A second registration of the same source inside the cooldown window
    /// is refused with [`RegistryError::CooldownActive`]. The copy is staged
    /// beside its destination and moved into place only after the record is
    /// saved; if either step fails nothing is recorded and an existing project
    /// copy is left as it was.
    pub fn register_asset(
        &mut self,
        project: &ProjectHandle,
        source: impl AsRef<Path>,
        options: &RegisterOptions,
    ) -> RegistryResult<AssetRecord> {
        let result = self.register_asset_inner(project, source.as_ref(), options);
        self.finish("register_asset", result)
    }

    fn register_asset_inner(
        &mut self,
        project: &ProjectHandle,
        source: &Path,
        options: &RegisterOptions,
    ) -> RegistryResult<AssetRecord> {
        let metadata = std::fs::metadata(source).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                RegistryError::not_found("Source file", source.display().to_string())
            }
            _ => RegistryError::io(format!("reading metadata of {}", source.display()), e),
        })?;
        if !metadata.is_file() {
            return Err(RegistryError::Validation(format!(
                "'{}' is not a regular file",
                source.display()
            )));
        }

        let source = absolute(source)?;
        if self.cooldown.is_cooling_down(&source) {
            return Err(RegistryError::CooldownActive(source.display().to_string()));
        }

        let name = derive_asset_name(&source)?;
        if !options.replace
            && self
                .project(project)
                .is_some_and(|p| p.registered_assets.contains_key(&name))
        {
            return Err(RegistryError::Conflict(format!(
                "Asset '{name}' is already registered in project '{}'",
                project.name()
            )));
        }

        let classification = classify(&source);
        let (path, staged) = if options.copy_to_project {
            let dest_dir = project.root().join(classification.subdirectory);
            std::fs::create_dir_all(&dest_dir)
                .map_err(|e| RegistryError::io(format!("creating {}", dest_dir.display()), e))?;
            let dest = match source.file_name() {
                Some(file_name) => dest_dir.join(file_name),
                None => dest_dir.join(&name),
            };
            let staged = stage_copy(&source, &dest)?;
            (dest, Some(staged))
        } else {
            (source.clone(), None)
        };
        let copied_to_project = staged.is_some();

        let record = AssetRecord {
            path,
            original_path: source.clone(),
            registered: chrono::Utc::now(),
            asset_type: options
                .type_override
                .clone()
                .unwrap_or(classification.asset_type),
            size: metadata.len(),
            copied_to_project,
            description: options.description.clone(),
        };

        let committed = self.commit(|doc| {
            let previous = project_entry(doc, project)?
                .registered_assets
                .insert(name.clone(), record.clone());
            if previous.is_some() {
                tracing::debug!(asset = %name, "Replacing existing asset record");
            }
            Ok(())
        });
        match (committed, staged.flatten()) {
            (Ok(()), Some(staging)) => {
                std::fs::rename(&staging, &record.path).map_err(|e| {
                    let _ = std::fs::remove_file(&staging);
                    RegistryError::io(format!("moving {} into place", record.path.display()), e)
                })?;
            }
            (Ok(()), None) => {}
            (Err(e), staging) => {
                if let Some(staging) = staging {
                    let _ = std::fs::remove_file(&staging);
                }
                return Err(e);
            }
        }

        self.cooldown.record(&source);
        self.stats.record_registration();
        if copied_to_project {
            self.stats.record_import();
        }

        tracing::info!(
            project = project.name(),
            asset = %name,
            asset_type = %record.asset_type,
            size = record.size,
            copied = copied_to_project,
            "Asset registered",
        );
        Ok(record)
    }

    /// Register each path in turn. Failures are collected, never fatal.
    ///
    /// `progress` is called after every attempt with the 1-based count of
    /// paths processed so far, the total, and the path just attempted.
    pub fn register_multiple_assets<P: AsRef<Path>>(
        &mut self,
        project: &ProjectHandle,
        paths: &[P],
        copy_to_project: bool,
        mut progress: Option<&mut dyn FnMut(usize, usize, &Path)>,
    ) -> BatchReport {
        let options = RegisterOptions {
            copy_to_project,
            ..RegisterOptions::default()
        };
        let total = paths.len();
        let mut report = BatchReport::default();

        for (idx, path) in paths.iter().enumerate() {
            let path = path.as_ref();
            match self.register_asset(project, path, &options) {
                Ok(_) => report.registered.push(
                    derive_asset_name(path).unwrap_or_else(|_| path.display().to_string()),
                ),
                Err(e) => report.failed.push(FailedRegistration {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                }),
            }
            if let Some(callback) = progress.as_mut() {
                callback(idx + 1, total, path);
            }
        }

        tracing::info!(
            project = project.name(),
            registered = report.registered.len(),
            failed = report.failed.len(),
            "Batch registration finished",
        );
        report
    }

    /// Drop an asset record. With `delete_file`, a project copy is deleted
    /// too; files referenced in place are never touched. A failed delete is
    /// logged and does not undo the removal.
    pub fn remove_asset_from_library(
        &mut self,
        project: &ProjectHandle,
        name: &str,
        delete_file: bool,
    ) -> RegistryResult<AssetRecord> {
        let result = self.remove_asset_inner(project, name, delete_file);
        self.finish("remove_asset_from_library", result)
    }

    fn remove_asset_inner(
        &mut self,
        project: &ProjectHandle,
        name: &str,
        delete_file: bool,
    ) -> RegistryResult<AssetRecord> {
        if !self
            .project(project)
            .is_some_and(|p| p.registered_assets.contains_key(name))
        {
            return Err(RegistryError::not_found("Asset", name));
        }

        let record = self.commit(|doc| {
            project_entry(doc, project)?
                .registered_assets
                .remove(name)
                .ok_or_else(|| RegistryError::not_found("Asset", name))
        })?;

        if delete_file {
            if record.copied_to_project {
                match std::fs::remove_file(&record.path) {
                    Ok(()) => tracing::info!(
                        asset = name,
                        path = %record.path.display(),
                        "Deleted project copy"
                    ),
                    Err(e) => tracing::warn!(
                        asset = name,
                        path = %record.path.display(),
                        error = %e,
                        "Failed to delete project copy; record removed anyway"
                    ),
                }
            } else {
                tracing::debug!(
                    asset = name,
                    "Asset was referenced in place; leaving file on disk"
                );
            }
        }

        tracing::info!(project = project.name(), asset = name, "Asset removed");
        Ok(record)
    }

    pub fn get_registered_assets(&self, project: &ProjectHandle) -> BTreeMap<String, AssetRecord> {
        self.project(project)
            .map(|p| p.registered_assets.clone())
            .unwrap_or_default()
    }

    /// Registered assets matching `query`, ordered by name.
    pub fn find_assets(
        &self,
        project: &ProjectHandle,
        query: &AssetQuery,
    ) -> Vec<(String, AssetRecord)> {
        self.project(project)
            .map(|p| {
                p.registered_assets
                    .iter()
                    .filter(|(name, record)| query.matches(name, record))
                    .map(|(name, record)| (name.clone(), record.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Copy a registered asset into `destination` and return the new path.
    pub fn export_asset(
        &mut self,
        project: &ProjectHandle,
        name: &str,
        destination: impl AsRef<Path>,
    ) -> RegistryResult<PathBuf> {
        let result = self.export_asset_inner(project, name, destination.as_ref());
        self.finish("export_asset", result)
    }

    fn export_asset_inner(
        &mut self,
        project: &ProjectHandle,
        name: &str,
        destination: &Path,
    ) -> RegistryResult<PathBuf> {
        let source = self
            .project(project)
            .and_then(|p| p.registered_assets.get(name))
            .map(|record| record.path.clone())
            .ok_or_else(|| RegistryError::not_found("Asset", name))?;
        if !source.is_file() {
            return Err(RegistryError::not_found(
                "Asset file",
                source.display().to_string(),
            ));
        }

        std::fs::create_dir_all(destination)
            .map_err(|e| RegistryError::io(format!("creating {}", destination.display()), e))?;
        let target = match source.file_name() {
            Some(file_name) => destination.join(file_name),
            None => destination.join(name),
        };
        copy_preserving_metadata(&source, &target)?;

        self.stats.record_export();
        tracing::info!(asset = name, target = %target.display(), "Asset exported");
        Ok(target)
    }
}

/// Copy `src` next to `dst` under a staging name, ready to be renamed over it.
///
/// Returns `None` when `src` already is `dst`.
fn stage_copy(src: &Path, dst: &Path) -> RegistryResult<Option<PathBuf>> {
    if same_file(src, dst) {
        return Ok(None);
    }
    if dst.is_dir() {
        return Err(RegistryError::io(
            format!("copying {} to {}", src.display(), dst.display()),
            std::io::Error::other("destination is a directory"),
        ));
    }
    let staging = staging_path(dst);
    if let Err(e) = copy_preserving_metadata(src, &staging) {
        let _ = std::fs::remove_file(&staging);
        return Err(e);
    }
    Ok(Some(staging))
}

fn staging_path(dst: &Path) -> PathBuf {
    let mut name = dst.file_name().unwrap_or_default().to_os_string();
    name.push(".staging");
    dst.with_file_name(name)
}

fn same_file(a: &Path, b: &Path) -> bool {
    matches!((a.canonicalize(), b.canonicalize()), (Ok(a), Ok(b)) if a == b)
}

/// Copy `src` to `dst`, keeping permissions and modification time.
///
/// Copying a file onto itself is a no-op. Failing to carry over the mtime
/// is logged but not an error.
fn copy_preserving_metadata(src: &Path, dst: &Path) -> RegistryResult<()> {
    if same_file(src, dst) {
        return Ok(());
    }

    std::fs::copy(src, dst).map_err(|e| {
        RegistryError::io(format!("copying {} to {}", src.display(), dst.display()), e)
    })?;

    let stamped = std::fs::metadata(src)
        .and_then(|m| m.modified())
        .and_then(|mtime| {
            std::fs::File::options()
                .write(true)
                .open(dst)
                .and_then(|f| f.set_modified(mtime))
        });
    if let Err(e) = stamped {
        tracing::debug!(
            path = %dst.display(),
            error = %e,
            "Could not preserve modification time"
        );
    }
    Ok(())
}
