//! Operation counters.
//!
//! [`OperationStats`] is shared as `Arc<OperationStats>` so a monitoring
//! thread can read it while the owning thread mutates the registry.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

#[derive(Debug, Default)]
pub struct OperationStats {
    imports: AtomicU64,
    exports: AtomicU64,
    registrations: AtomicU64,
    errors: AtomicU64,
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Files copied into a project.
    pub imports: u64,
    /// Files copied out of a project.
    pub exports: u64,
    /// Asset records written, copied or not.
    pub registrations: u64,
    /// I/O and codec failures caught at operation boundaries.
    pub errors: u64,
}

impl OperationStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_import(&self) {
        self.imports.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_export(&self) {
        self.exports.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_registration(&self) {
        self.registrations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            imports: self.imports.load(Ordering::Relaxed),
            exports: self.exports.load(Ordering::Relaxed),
            registrations: self.registrations.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        self.imports.store(0, Ordering::Relaxed);
        self.exports.store(0, Ordering::Relaxed);
        self.registrations.store(0, Ordering::Relaxed);
        self.errors.store(0, Ordering::Relaxed);
    }
}
