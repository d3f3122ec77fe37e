//! Layered configuration loading with figment.
//!
//! Sources, highest priority first:
//! 1. Environment variables (`SIGMA_*`, `__` separates nested keys, e.g.
//!    `SIGMA_SEARCH__DELAY_MS=500`)
//! 2. The file passed with `--config`
//! 3. `sigma-search.toml` in the working directory
//! 4. Built-in defaults
//!
//! The loaded [`AppConfig`] is resolved once at start-up into a
//! [`ResolvedConfig`], which is what the rest of the program receives.

use super::credentials::{CredentialError, CredentialSet, hash_secret};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "sigma-search.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Figment(#[from] Box<figment::Error>),

    #[error("invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error(transparent)]
    Credentials(#[from] CredentialError),
}

/// One accepted login. Exactly one of `secret` / `secret_hash` must be set.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CredentialEntry {
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_hash: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    #[serde(default = "default_credentials")]
    pub credentials: Vec<CredentialEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_secret_hash: Option<String>,
}

fn default_credentials() -> Vec<CredentialEntry> {
    vec![CredentialEntry {
        identifier: "Sigma".to_string(),
        secret: Some("AVANTE".to_string()),
        secret_hash: None,
    }]
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            credentials: default_credentials(),
            asset_secret: Some("AVANTE".to_string()),
            asset_secret_hash: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AssetConfig {
    #[serde(default = "default_asset_path")]
    pub path: PathBuf,
    #[serde(default = "default_asset_name")]
    pub file_name: String,
}

fn default_asset_path() -> PathBuf {
    PathBuf::from("sigma-search-apk.txt")
}

fn default_asset_name() -> String {
    "sigma-search.apk".to_string()
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            path: default_asset_path(),
            file_name: default_asset_name(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    #[serde(default = "default_found_probability")]
    pub found_probability: f64,
}

const fn default_delay_ms() -> u64 {
    3000
}

const fn default_found_probability() -> f64 {
    0.7
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_delay_ms(),
            found_probability: default_found_probability(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("sigma-records.json")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_file")]
    pub file: PathBuf,
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_file() -> PathBuf {
    PathBuf::from("sigma-search.log")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: default_log_file(),
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub asset: AssetConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Loads configuration from every source, see the module docs.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        Self::figment(explicit)
            .extract()
            .map_err(|e| ConfigError::Figment(Box::new(e)))
    }

    /// Builds the provider chain. Public so tests can extract from it
    /// directly.
    pub fn figment(explicit: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        let local = PathBuf::from(DEFAULT_CONFIG_FILE);
        if local.exists() {
            figment = figment.merge(Toml::file(local));
        }

        if let Some(path) = explicit {
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Env::prefixed("SIGMA_").split("__"))
    }

    /// Hashes every configured secret and checks the remaining values.
    pub fn resolve(&self) -> Result<ResolvedConfig, ConfigError> {
        let mut credentials = CredentialSet::new();
        for entry in &self.auth.credentials {
            credentials = match (&entry.secret, &entry.secret_hash) {
                (_, Some(hash)) => credentials.with_hash(&entry.identifier, hash)?,
                (Some(secret), None) => credentials.with_secret(&entry.identifier, secret)?,
                (None, None) => {
                    return Err(ConfigError::InvalidValue {
                        field: format!("auth.credentials[{}]", entry.identifier),
                        reason: "either `secret` or `secret_hash` is required".to_string(),
                    });
                }
            };
        }
        if credentials.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "auth.credentials".to_string(),
                reason: "at least one credential pair is required".to_string(),
            });
        }

        let asset_secret_hash = match (&self.auth.asset_secret, &self.auth.asset_secret_hash) {
            (_, Some(hash)) => Some(hash.clone()),
            (Some(secret), None) => Some(hash_secret(secret)?),
            (None, None) => None,
        };

        let probability = self.search.found_probability;
        if !(0.0..=1.0).contains(&probability) {
            return Err(ConfigError::InvalidValue {
                field: "search.found_probability".to_string(),
                reason: format!("{probability} is outside 0.0..=1.0"),
            });
        }

        Ok(ResolvedConfig {
            credentials,
            asset_secret_hash,
            asset_path: self.asset.path.clone(),
            asset_file_name: self.asset.file_name.clone(),
            search_delay: Duration::from_millis(self.search.delay_ms),
            found_probability: probability,
            storage_path: self.storage.path.clone(),
        })
    }
}

/// Configuration after secrets have been hashed, ready to inject.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub credentials: CredentialSet,
    /// `None` disables the gated download entirely.
    pub asset_secret_hash: Option<String>,
    pub asset_path: PathBuf,
    pub asset_file_name: String,
    pub search_delay: Duration,
    pub found_probability: f64,
    pub storage_path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::CredentialCheck;
    use figment::Jail;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.search.delay_ms, 3000);
        assert_eq!(config.search.found_probability, 0.7);
        assert_eq!(config.auth.credentials.len(), 1);
        assert_eq!(config.auth.credentials[0].identifier, "Sigma");
        assert_eq!(config.storage.path, PathBuf::from("sigma-records.json"));
    }

    #[test]
    fn test_figment_builds_without_files() {
        Jail::expect_with(|_jail| {
            let config: AppConfig = AppConfig::figment(None).extract()?;
            assert_eq!(config.search.delay_ms, 3000);
            assert_eq!(config.logging.level, "info");
            Ok(())
        });
    }

    #[test]
    fn test_toml_and_env_layering() {
        Jail::expect_with(|jail| {
            jail.create_file(
                DEFAULT_CONFIG_FILE,
                r#"
                [search]
                delay_ms = 1200

                [storage]
                path = "reports.json"

                [[auth.credentials]]
                identifier = "ops"
                secret = "hunter2"
                "#,
            )?;
            jail.set_env("SIGMA_SEARCH__DELAY_MS", "250");

            let config: AppConfig = AppConfig::figment(None).extract()?;
            assert_eq!(config.search.delay_ms, 250);
            assert_eq!(config.storage.path, PathBuf::from("reports.json"));
            assert_eq!(config.auth.credentials[0].identifier, "ops");
            Ok(())
        });
    }

    #[test]
    fn test_explicit_file_overrides_local() {
        Jail::expect_with(|jail| {
            jail.create_file(DEFAULT_CONFIG_FILE, "[search]\nfound_probability = 0.1\n")?;
            jail.create_file("other.toml", "[search]\nfound_probability = 0.9\n")?;

            let config: AppConfig = AppConfig::figment(Some(Path::new("other.toml"))).extract()?;
            assert_eq!(config.search.found_probability, 0.9);
            Ok(())
        });
    }

    #[test]
    fn test_resolve_hashes_secrets() {
        let resolved = AppConfig::default().resolve().unwrap();
        assert_eq!(resolved.credentials.check("Sigma", "AVANTE"), CredentialCheck::Accepted);
        assert_eq!(resolved.search_delay, Duration::from_secs(3));
        assert!(resolved.asset_secret_hash.as_deref().is_some_and(|h| h.starts_with("$argon2")));
    }

    #[test]
    fn test_resolve_rejects_entry_without_secret() {
        let mut config = AppConfig::default();
        config.auth.credentials = vec![CredentialEntry {
            identifier: "ops".to_string(),
            secret: None,
            secret_hash: None,
        }];
        assert!(matches!(config.resolve(), Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_resolve_rejects_empty_credentials() {
        let mut config = AppConfig::default();
        config.auth.credentials.clear();
        assert!(matches!(config.resolve(), Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_resolve_rejects_bad_probability() {
        let mut config = AppConfig::default();
        config.search.found_probability = 1.5;
        assert!(matches!(config.resolve(), Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_asset_gate_can_be_disabled() {
        let mut config = AppConfig::default();
        config.auth.asset_secret = None;
        let resolved = config.resolve().unwrap();
        assert!(resolved.asset_secret_hash.is_none());
    }
}
