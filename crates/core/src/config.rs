use std::path::PathBuf;
use std::time::Duration;

use crate::cooldown::DEFAULT_PURGE_AFTER;
use crate::error::{RegistryError, RegistryResult};

/// Default registry document location, relative to the working directory.
pub const DEFAULT_DOCUMENT_PATH: &str = "asset_registry.json";

/// Registry configuration loaded from environment variables.
///
/// All fields have defaults suitable for a single-user workstation.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryConfig {
    /// Location of the JSON registry document.
    pub document_path: PathBuf,
    /// Overrides the cooldown stored in the document when set.
    pub import_cooldown: Option<Duration>,
    /// Age after which cooldown entries are purged.
    pub cooldown_purge_after: Duration,
    /// Reject dependency edges that would close a cycle.
    pub enforce_acyclic: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            document_path: PathBuf::from(DEFAULT_DOCUMENT_PATH),
            import_cooldown: None,
            cooldown_purge_after: DEFAULT_PURGE_AFTER,
            enforce_acyclic: false,
        }
    }
}

impl RegistryConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                          | Default               |
    /// |----------------------------------|-----------------------|
    /// | `ASSETMAN_DOCUMENT`              | `asset_registry.json` |
    /// | `ASSETMAN_IMPORT_COOLDOWN_SECS`  | value in the document |
    /// | `ASSETMAN_COOLDOWN_PURGE_SECS`   | `10`                  |
    /// | `ASSETMAN_ENFORCE_ACYCLIC`       | `false`               |
    pub fn from_env() -> RegistryResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reads variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> RegistryResult<Self> {
        let defaults = Self::default();

        let document_path = lookup("ASSETMAN_DOCUMENT")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.document_path);

        let import_cooldown = lookup("ASSETMAN_IMPORT_COOLDOWN_SECS")
            .map(|v| parse_secs("ASSETMAN_IMPORT_COOLDOWN_SECS", &v))
            .transpose()?;

        let cooldown_purge_after = lookup("ASSETMAN_COOLDOWN_PURGE_SECS")
            .map(|v| parse_secs("ASSETMAN_COOLDOWN_PURGE_SECS", &v))
            .transpose()?
            .unwrap_or(defaults.cooldown_purge_after);

        let enforce_acyclic = lookup("ASSETMAN_ENFORCE_ACYCLIC")
            .map(|v| parse_bool("ASSETMAN_ENFORCE_ACYCLIC", &v))
            .transpose()?
            .unwrap_or(defaults.enforce_acyclic);

        Ok(Self {
            document_path,
            import_cooldown,
            cooldown_purge_after,
            enforce_acyclic,
        })
    }

    /// Config with defaults and the given document location.
    pub fn with_document_path(path: impl Into<PathBuf>) -> Self {
        Self {
            document_path: path.into(),
            ..Self::default()
        }
    }
}

fn parse_secs(key: &str, value: &str) -> RegistryResult<Duration> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .ok_or_else(|| {
            RegistryError::Validation(format!(
                "{key} must be a non-negative number of seconds, got '{value}'"
            ))
        })
}

fn parse_bool(key: &str, value: &str) -> RegistryResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(RegistryError::Validation(format!(
            "{key} must be a boolean, got '{value}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = RegistryConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, RegistryConfig::default());
    }

    #[test]
    fn all_variables_are_read() {
        let config = RegistryConfig::from_lookup(lookup_from(&[
            ("ASSETMAN_DOCUMENT", "/tmp/registry.json"),
            ("ASSETMAN_IMPORT_COOLDOWN_SECS", "0.5"),
            ("ASSETMAN_COOLDOWN_PURGE_SECS", "30"),
            ("ASSETMAN_ENFORCE_ACYCLIC", "yes"),
        ]))
        .unwrap();

        assert_eq!(config.document_path, PathBuf::from("/tmp/registry.json"));
        assert_eq!(config.import_cooldown, Some(Duration::from_millis(500)));
        assert_eq!(config.cooldown_purge_after, Duration::from_secs(30));
        assert!(config.enforce_acyclic);
    }

    #[test]
    fn negative_cooldown_is_rejected() {
        let result = RegistryConfig::from_lookup(lookup_from(&[(
            "ASSETMAN_IMPORT_COOLDOWN_SECS",
            "-1",
        )]));
        assert_matches!(result, Err(RegistryError::Validation(_)));
    }

    #[test]
    fn garbage_bool_is_rejected() {
        let result =
            RegistryConfig::from_lookup(lookup_from(&[("ASSETMAN_ENFORCE_ACYCLIC", "maybe")]));
        assert_matches!(result, Err(RegistryError::Validation(_)));
    }

    #[test]
    fn blank_document_path_falls_back() {
        let config =
            RegistryConfig::from_lookup(lookup_from(&[("ASSETMAN_DOCUMENT", "  ")])).unwrap();
        assert_eq!(config.document_path, PathBuf::from(DEFAULT_DOCUMENT_PATH));
    }
}
