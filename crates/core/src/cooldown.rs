//! Duplicate-import suppression.
//!
//! Tracks when each source path was last imported. A second import of the
//! same path inside the cooldown window is refused. Stale entries are
//! dropped on every check, so the map stays bounded by recent activity.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Minimum interval between two imports of the same source path.
pub const DEFAULT_IMPORT_COOLDOWN: Duration = Duration::from_secs(2);

/// Entries older than this are purged.
pub const DEFAULT_PURGE_AFTER: Duration = Duration::from_secs(10);

#[derive(Debug)]
pub struct ImportCooldown {
    window: Duration,
    purge_after: Duration,
    last_import: HashMap<PathBuf, Instant>,
}

impl Default for ImportCooldown {
    fn default() -> Self {
        Self::new(DEFAULT_IMPORT_COOLDOWN, DEFAULT_PURGE_AFTER)
    }
}

impl ImportCooldown {
    /// `purge_after` is raised to `window` if smaller, so an entry is never
    /// purged while it still blocks imports.
    pub fn new(window: Duration, purge_after: Duration) -> Self {
        Self {
            window,
            purge_after: purge_after.max(window),
            last_import: HashMap::new(),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// `true` if `source` was imported less than one window ago.
    pub fn is_cooling_down(&mut self, source: &Path) -> bool {
        self.is_cooling_down_at(source, Instant::now())
    }

    /// Mark `source` as imported now.
    pub fn record(&mut self, source: &Path) {
        self.record_at(source, Instant::now());
    }

    /// Number of tracked paths.
    pub fn len(&self) -> usize {
        self.last_import.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_import.is_empty()
    }

    fn is_cooling_down_at(&mut self, source: &Path, now: Instant) -> bool {
        self.purge(now);
        self.last_import
            .get(source)
            .is_some_and(|last| now.saturating_duration_since(*last) < self.window)
    }

    fn record_at(&mut self, source: &Path, now: Instant) {
        self.last_import.insert(source.to_path_buf(), now);
    }

    fn purge(&mut self, now: Instant) {
        let purge_after = self.purge_after;
        self.last_import
            .retain(|_, last| now.saturating_duration_since(*last) <= purge_after);
    }
}
