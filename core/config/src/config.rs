//! Configuration resolution.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, trace};

use rapture_common::{Environment, Error, Result};

/// Region used when neither the environment nor the caller names one.
pub const DEFAULT_AWS_REGION: &str = "us-east-1";

/// Default session duration in seconds.
pub const DEFAULT_SESSION_DURATION: i64 = 3600;

/// Default base-credential source.
pub const DEFAULT_INIT_METHOD: &str = "vaulted";

/// Default vault name.
pub const DEFAULT_VAULT: &str = "default";

/// Effective Rapture configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaptureConfig {
    /// Identifier for this user, used in role session names.
    pub identifier: String,
    /// Lifetime of assumed-role sessions, in seconds.
    pub session_duration: i64,
    /// Base-credential source used by `init`.
    pub init_method: String,
    /// Vault selected when `init` is given no name.
    pub default_vault: String,
    /// Suppress informational messages.
    pub quiet: bool,
}

/// The file as written by the user. Absent and `null` fields are `None`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    identifier: Option<String>,
    session_duration: Option<i64>,
    init_method: Option<String>,
    default_vault: Option<String>,
    quiet: Option<bool>,
}

impl ConfigFile {
    fn read(path: &Path) -> Result<Option<Self>> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Error::Config(format!(
                    "Could not read {}: {}",
                    path.display(),
                    e
                )))
            }
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| Error::Config(format!("Could not parse {}: {}", path.display(), e)))
    }

    fn overlay(self, mut base: RaptureConfig) -> RaptureConfig {
        if let Some(v) = self.identifier {
            base.identifier = v;
        }
        if let Some(v) = self.session_duration {
            base.session_duration = v;
        }
        if let Some(v) = self.init_method {
            base.init_method = v;
        }
        if let Some(v) = self.default_vault {
            base.default_vault = v;
        }
        if let Some(v) = self.quiet {
            base.quiet = v;
        }
        base
    }
}

/// Result of reading the file without defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawConfig {
    /// Fields present in the file; everything else is empty/zero.
    pub config: RaptureConfig,
    /// Whether the file exists.
    pub exists: bool,
}

impl RaptureConfig {
    /// Built-in defaults. The identifier is the current OS user.
    pub fn defaults(env: &dyn Environment) -> Self {
        Self {
            identifier: env.get("USER").unwrap_or_default(),
            session_duration: DEFAULT_SESSION_DURATION,
            init_method: DEFAULT_INIT_METHOD.to_string(),
            default_vault: DEFAULT_VAULT.to_string(),
            quiet: false,
        }
    }

    /// Load the effective configuration: file fields merged over defaults.
    ///
    /// Never fails. A missing file yields the defaults; an unreadable or
    /// malformed one is logged and also yields the defaults.
    pub fn load(path: &Path, env: &dyn Environment) -> Self {
        trace!(path = %path.display(), "Loading config");
        let defaults = Self::defaults(env);
        match ConfigFile::read(path) {
            Ok(Some(file)) => file.overlay(defaults),
            Ok(None) => {
                debug!("Found no config file, using defaults");
                defaults
            }
            Err(e) => {
                debug!(error = %e, "Failed to load config, using defaults");
                defaults
            }
        }
    }

    /// Read the file as-is, without merging defaults.
    ///
    /// # Returns
    /// - `exists = false` and an empty config when the file is missing
    /// - `exists = true` and the present fields when it parses
    ///
    /// # Errors
    /// - The file exists but cannot be read or parsed
    pub fn load_raw(path: &Path) -> Result<RawConfig> {
        match ConfigFile::read(path)? {
            Some(file) => Ok(RawConfig {
                config: file.overlay(Self::default()),
                exists: true,
            }),
            None => {
                debug!("Found no config file");
                Ok(RawConfig {
                    config: Self::default(),
                    exists: false,
                })
            }
        }
    }

    /// AWS region for API calls.
    ///
    /// `AWS_DEFAULT_REGION` wins over `AWS_REGION`; with neither set the
    /// region is [`DEFAULT_AWS_REGION`].
    pub fn region(&self, env: &dyn Environment) -> String {
        env.get("AWS_DEFAULT_REGION")
            .or_else(|| env.get("AWS_REGION"))
            .unwrap_or_else(|| DEFAULT_AWS_REGION.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rapture_common::MemoryEnv;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, body: &str) -> std::path::PathBuf {
        let path = dir.path().join("config.json");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_defaults() {
        let env = MemoryEnv::new().with("USER", "alice");
        let config = RaptureConfig::defaults(&env);

        assert_eq!(config.identifier, "alice");
        assert_eq!(config.session_duration, 3600);
        assert_eq!(config.init_method, "vaulted");
        assert_eq!(config.default_vault, "default");
        assert!(!config.quiet);
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let env = MemoryEnv::new().with("USER", "alice");

        let raw = RaptureConfig::load_raw(&path).unwrap();
        assert!(!raw.exists);
        assert_eq!(raw.config, RaptureConfig::default());

        assert_eq!(RaptureConfig::load(&path, &env), RaptureConfig::defaults(&env));
    }

    #[test]
    fn test_partial_file_merges_over_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, r#"{"default_vault": "work", "quiet": true}"#);
        let env = MemoryEnv::new().with("USER", "bob");

        let config = RaptureConfig::load(&path, &env);
        assert_eq!(config.default_vault, "work");
        assert!(config.quiet);
        assert_eq!(config.identifier, "bob");
        assert_eq!(config.session_duration, 3600);

        let raw = RaptureConfig::load_raw(&path).unwrap();
        assert!(raw.exists);
        assert_eq!(raw.config.default_vault, "work");
        assert_eq!(raw.config.identifier, "");
        assert_eq!(raw.config.session_duration, 0);
    }

    #[test]
    fn test_malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "{ not json");
        let env = MemoryEnv::new();

        assert!(matches!(
            RaptureConfig::load_raw(&path),
            Err(Error::Config(_))
        ));
        assert_eq!(RaptureConfig::load(&path, &env), RaptureConfig::defaults(&env));
    }

    #[test]
    fn test_wrong_field_type_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, r#"{"default_vault": "work", "session_duration": "long"}"#);
        let env = MemoryEnv::new();

        // The whole file is rejected, not just the bad field.
        assert_eq!(RaptureConfig::load(&path, &env).default_vault, "default");
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, r#"{"init_method": "vaulted", "color": "blue"}"#);

        let raw = RaptureConfig::load_raw(&path).unwrap();
        assert_eq!(raw.config.init_method, "vaulted");
    }

    #[test]
    fn test_region_precedence() {
        let config = RaptureConfig::default();

        let both = MemoryEnv::new()
            .with("AWS_DEFAULT_REGION", "eu-west-1")
            .with("AWS_REGION", "ap-south-1");
        assert_eq!(config.region(&both), "eu-west-1");

        let only_region = MemoryEnv::new().with("AWS_REGION", "ap-south-1");
        assert_eq!(config.region(&only_region), "ap-south-1");

        assert_eq!(config.region(&MemoryEnv::new()), DEFAULT_AWS_REGION);
    }

    proptest! {
        #[test]
        fn prop_effective_config_is_defaults_plus_present_fields(
            identifier in proptest::option::of("[a-z]{1,12}"),
            duration in proptest::option::of(1i64..86_400),
            vault in proptest::option::of("[a-z0-9_-]{1,16}"),
            quiet in proptest::option::of(any::<bool>()),
        ) {
            let mut body = serde_json::Map::new();
            if let Some(v) = &identifier { body.insert("identifier".into(), v.clone().into()); }
            if let Some(v) = duration { body.insert("session_duration".into(), v.into()); }
            if let Some(v) = &vault { body.insert("default_vault".into(), v.clone().into()); }
            if let Some(v) = quiet { body.insert("quiet".into(), v.into()); }

            let dir = TempDir::new().unwrap();
            let path = write_config(&dir, &serde_json::Value::Object(body).to_string());
            let env = MemoryEnv::new().with("USER", "carol");
            let config = RaptureConfig::load(&path, &env);

            prop_assert_eq!(config.identifier, identifier.unwrap_or_else(|| "carol".to_string()));
            prop_assert_eq!(config.session_duration, duration.unwrap_or(3600));
            prop_assert_eq!(config.init_method, "vaulted");
            prop_assert_eq!(config.default_vault, vault.unwrap_or_else(|| "default".to_string()));
            prop_assert_eq!(config.quiet, quiet.unwrap_or(false));
        }
    }
}
