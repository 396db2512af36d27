//! Verifier configuration.
//!
//! Settings live in a JSON file under the user config directory and can be
//! overridden from the environment, so deployments never need the license
//! key on disk.

use std::path::{Path, PathBuf};
use std::time::Duration;

use addressledger_melissa::{DEFAULT_ENDPOINT, MelissaClient};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::{Error, Result};

/// Environment variable overriding [`Config::license_key`].
pub const LICENSE_KEY_ENV: &str = "ADDRESSLEDGER_LICENSE_KEY";
/// Environment variable overriding [`Config::endpoint_url`].
pub const ENDPOINT_ENV: &str = "ADDRESSLEDGER_ENDPOINT";
/// Environment variable overriding [`Config::database_path`].
pub const DATABASE_ENV: &str = "ADDRESSLEDGER_DATABASE";

const APP_DIR: &str = "addressledger";

/// Verifier settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Provider license key.
    pub license_key: String,
    /// Provider endpoint URL.
    pub endpoint_url: String,
    /// Provider request timeout in seconds.
    pub timeout_secs: u64,
    /// Path to the `SQLite` database holding verification records.
    pub database_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            license_key: String::new(),
            endpoint_url: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: 30,
            database_path: default_database_path(),
        }
    }
}

impl Config {
    /// Default config file location.
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("config.json")
    }

    /// Loads the config file at `path`, then applies environment overrides.
    ///
    /// A missing file yields defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load(path: &Path) -> Result<Self> {
        let mut config = if tokio::fs::try_exists(path).await? {
            let contents = tokio::fs::read_to_string(path).await?;
            debug!(path = %path.display(), "Loaded config file");
            serde_json::from_str(&contents)?
        } else {
            debug!(path = %path.display(), "No config file, using defaults");
            Self::default()
        };

        config.apply_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Writes the config to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, contents).await?;
        info!(path = %path.display(), "Config saved");
        Ok(())
    }

    /// Applies overrides from a variable lookup; empty values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |name: &str| lookup(name).filter(|value| !value.is_empty());

        if let Some(key) = var(LICENSE_KEY_ENV) {
            self.license_key = key;
        }
        if let Some(endpoint) = var(ENDPOINT_ENV) {
            self.endpoint_url = endpoint;
        }
        if let Some(database) = var(DATABASE_ENV) {
            self.database_path = PathBuf::from(database);
        }
    }

    /// Checks that the config can drive a verifier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.license_key.trim().is_empty() {
            return Err(Error::Config(format!(
                "license key is required (set it in the config file or {LICENSE_KEY_ENV})"
            )));
        }

        let endpoint = Url::parse(&self.endpoint_url)
            .map_err(|e| Error::Config(format!("invalid endpoint URL: {e}")))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "endpoint URL must use http or https, got {}",
                endpoint.scheme()
            )));
        }

        if self.timeout_secs == 0 {
            return Err(Error::Config("timeout_secs must be greater than zero".into()));
        }

        Ok(())
    }

    /// Request timeout as a duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// How long a verification waits for another one to release the
    /// database. Twice the provider timeout, so a queued verification
    /// outlasts the provider call ahead of it.
    #[must_use]
    pub const fn busy_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.saturating_mul(2))
    }

    /// Builds a provider client from this config.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the config is invalid.
    pub fn client(&self) -> Result<MelissaClient> {
        self.validate()?;
        Ok(MelissaClient::new(&self.endpoint_url, self.license_key.clone())?
            .with_timeout(self.timeout()))
    }
}

fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("verifications.db")
}
