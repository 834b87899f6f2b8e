//! The asset registry service.
//!
//! [`AssetRegistry`] owns the in-memory [`RegistryDocument`] and writes it
//! through to disk. Project-scoped operations take an explicit
//! [`ProjectHandle`]; the persisted `current_project` pointer only lets a new
//! process pick up where the last one stopped.
//!
//! Each mutation is applied to a working copy of the document. The copy is
//! saved once and only then replaces the live state, so a failed save or a
//! failed sub-step leaves both memory and disk as they were.

pub mod assets;
pub mod collections;
pub mod dependencies;
pub mod projects;
pub mod tags;
pub mod versions;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::classify::asset_name_from_path;
use crate::codec::SaveHook;
use crate::config::RegistryConfig;
use crate::cooldown::{ImportCooldown, DEFAULT_IMPORT_COOLDOWN};
use crate::error::{RegistryError, RegistryResult};
use crate::model::{Project, RegistryDocument};
use crate::stats::OperationStats;

pub use assets::{AssetQuery, BatchReport, FailedRegistration, RegisterOptions};
pub use projects::STANDARD_SUBDIRECTORIES;

/// Identifies the project an operation acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectHandle {
    name: String,
    root: PathBuf,
}

impl ProjectHandle {
    /// Handle for the project rooted at `root`, named after its last path component.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| root.to_string_lossy().into_owned());
        Self { name, root }
    }

    pub fn with_name(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

pub struct AssetRegistry {
    document_path: PathBuf,
    document: RegistryDocument,
    cooldown: ImportCooldown,
    stats: Arc<OperationStats>,
    enforce_acyclic: bool,
    save_hook: Option<Box<dyn SaveHook>>,
}

impl std::fmt::Debug for AssetRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetRegistry")
            .field("document_path", &self.document_path)
            .field("projects", &self.document.assets_library.len())
            .field("cooldown", &self.cooldown.window())
            .field("enforce_acyclic", &self.enforce_acyclic)
            .finish()
    }
}

impl AssetRegistry {
    /// Load the document named by `config` (or start empty if it does not exist).
    pub fn open(config: &RegistryConfig) -> RegistryResult<Self> {
        let document = RegistryDocument::load(&config.document_path)?;

        // A configured window applies to this session only; the stored value stays.
        let window = match config.import_cooldown {
            Some(window) => window,
            None => Duration::try_from_secs_f64(document.import_cooldown).unwrap_or_else(|_| {
                tracing::warn!(
                    import_cooldown = document.import_cooldown,
                    "Invalid import cooldown in registry document, using default"
                );
                DEFAULT_IMPORT_COOLDOWN
            }),
        };

        tracing::info!(
            document = %config.document_path.display(),
            projects = document.assets_library.len(),
            cooldown_secs = window.as_secs_f64(),
            "Asset registry opened",
        );

        Ok(Self {
            document_path: config.document_path.clone(),
            document,
            cooldown: ImportCooldown::new(window, config.cooldown_purge_after),
            stats: Arc::new(OperationStats::new()),
            enforce_acyclic: config.enforce_acyclic,
            save_hook: None,
        })
    }

    /// Attach a hook notified after every successful save.
    pub fn with_save_hook(mut self, hook: impl SaveHook + 'static) -> Self {
        self.save_hook = Some(Box::new(hook));
        self
    }

    /// Shared handle to the operation counters.
    pub fn stats(&self) -> Arc<OperationStats> {
        Arc::clone(&self.stats)
    }

    pub fn document(&self) -> &RegistryDocument {
        &self.document
    }

    pub fn document_path(&self) -> &Path {
        &self.document_path
    }

    /// The project record behind `handle`, if one has been materialized at
    /// the handle's root.
    pub fn project(&self, handle: &ProjectHandle) -> Option<&Project> {
        self.document
            .assets_library
            .get(handle.name())
            .filter(|project| project.path == handle.root())
    }

    /// Apply `op` to a working copy, persist it, then make it live.
    fn commit<T>(
        &mut self,
        op: impl FnOnce(&mut RegistryDocument) -> RegistryResult<T>,
    ) -> RegistryResult<T> {
        let mut working = self.document.clone();
        let value = op(&mut working)?;
        working.save(&self.document_path)?;
        self.document = working;

        if let Some(hook) = &self.save_hook {
            hook.saved(&self.document_path);
        }
        Ok(value)
    }

    /// Log a failed operation once, counting I/O failures.
    fn finish<T>(&self, operation: &'static str, result: RegistryResult<T>) -> RegistryResult<T> {
        if let Err(e) = &result {
            if e.is_io_failure() {
                self.stats.record_error();
                tracing::error!(operation, error = %e, "Registry operation failed");
            } else if e.is_conflict() {
                tracing::info!(operation, reason = %e, "Registry operation skipped");
            } else {
                tracing::warn!(operation, error = %e, "Registry operation rejected");
            }
        }
        result
    }
}

/// The project record for `handle`, created empty if absent.
///
/// A record stored under the same name at a different root is a
/// [`RegistryError::Conflict`].
fn project_entry<'a>(
    doc: &'a mut RegistryDocument,
    handle: &ProjectHandle,
) -> RegistryResult<&'a mut Project> {
    let project = doc
        .assets_library
        .entry(handle.name().to_string())
        .or_insert_with(|| {
            tracing::debug!(
                project = handle.name(),
                path = %handle.root().display(),
                "Materializing project record"
            );
            Project::new(handle.root().to_path_buf())
        });
    if project.path != handle.root() {
        return Err(RegistryError::Conflict(format!(
            "Project '{}' is registered at {}, not {}",
            handle.name(),
            project.path.display(),
            handle.root().display()
        )));
    }
    Ok(project)
}

/// Derive an asset name from a path, rejecting paths without a file name.
fn derive_asset_name(path: &Path) -> RegistryResult<String> {
    let name = asset_name_from_path(path);
    if name.trim().is_empty() {
        return Err(RegistryError::Validation(format!(
            "Cannot derive an asset name from '{}'",
            path.display()
        )));
    }
    Ok(name)
}

/// Absolute form of `path` without resolving symlinks.
fn absolute(path: &Path) -> RegistryResult<PathBuf> {
    std::path::absolute(path)
        .map_err(|e| RegistryError::io(format!("resolving {}", path.display()), e))
}
