/// Registry-domain error type.
///
/// Every public registry operation returns this error. Duplicate no-ops
/// (asset already in a collection, edge already tracked) are reported as
/// `Ok(false)` instead; the variants here are real failures or rejections.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("{entity} not found: {name}")]
    NotFound { entity: &'static str, name: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Import skipped, cooldown active for {0}")]
    CooldownActive(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("I/O error while {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RegistryError {
    pub fn not_found(entity: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            name: name.into(),
        }
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// `true` for rejections that leave the registry untouched because the
    /// requested state already exists (duplicate name, cooling-down import).
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_) | Self::CooldownActive(_))
    }

    /// `true` for filesystem and codec failures. These are the failures
    /// counted in [`OperationStats`](crate::stats::OperationStats).
    pub fn is_io_failure(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::Serialization(_))
    }
}

pub type RegistryResult<T> = Result<T, RegistryError>;
