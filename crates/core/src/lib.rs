//! `assetman-core` -- project/asset registry for a DCC asset manager.
//!
//! Keeps a JSON-persisted catalog of projects and, per project, registered
//! assets, collections, dependency edges, version histories and tags.
//! The entry point is [`AssetRegistry`]; everything else is the record
//! types it stores and the pure helpers it is built from.

pub mod classify;
pub mod codec;
pub mod config;
pub mod cooldown;
pub mod error;
pub mod model;
pub mod registry;
pub mod stats;
pub mod types;

pub use classify::AssetType;
pub use codec::SaveHook;
pub use config::RegistryConfig;
pub use error::{RegistryError, RegistryResult};
pub use model::{AssetRecord, Collection, Project, RegistryDocument, VersionEntry};
pub use registry::{
    AssetQuery, AssetRegistry, BatchReport, FailedRegistration, ProjectHandle, RegisterOptions,
};
pub use stats::{OperationStats, StatsSnapshot};
