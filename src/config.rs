use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use crate::error::{InstallerError, Result};
use crate::global::utils::{get_global_config_dir, get_global_data_dir, get_maven_local_dir};

/// The maven repository OpenCV artifacts are published to.
pub const DEFAULT_REPOSITORY_URL: &str = "http://first.wpi.edu/FRC/roborio/maven/development";

pub const ENV_REPOSITORY: &str = "OPENCV_INSTALLER_REPOSITORY";
pub const ENV_LOCAL_REPOSITORY: &str = "OPENCV_INSTALLER_LOCAL_REPOSITORY";
pub const ENV_STATE_FILE: &str = "OPENCV_INSTALLER_STATE_FILE";
pub const ENV_STAGING_DIR: &str = "OPENCV_INSTALLER_STAGING_DIR";

/// Installer settings, read from `config.toml` in the user config directory.
///
/// Every field may be left out of the file; environment variables override the file.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Base URL of the remote maven repository.
    pub repository_url: String,
    /// Root of the local maven repository used as the download cache.
    pub local_repository: PathBuf,
    /// JSON file holding the install records.
    pub state_file: PathBuf,
    /// Where artifacts for an explicitly chosen platform are staged.
    pub staging_dir: PathBuf,
    /// Connect timeout for repository requests, in seconds.
    pub connect_timeout_secs: u64,
    /// Upper bound for a whole download, in seconds. Unset lets transfers run to completion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transfer_timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            repository_url: DEFAULT_REPOSITORY_URL.to_string(),
            local_repository: get_maven_local_dir()
                .unwrap_or_else(|_| PathBuf::from(".m2").join("repository")),
            state_file: get_global_data_dir()
                .map(|dir| dir.join("install-state.json"))
                .unwrap_or_else(|_| PathBuf::from("install-state.json")),
            staging_dir: PathBuf::from("install"),
            connect_timeout_secs: 1,
            transfer_timeout_secs: None,
        }
    }
}

impl Config {
    /// Loads `config.toml` from the user config directory if it exists, then applies
    /// environment overrides.
    pub fn load() -> Result<Config> {
        let path = get_global_config_dir()?.join("config.toml");
        let mut config = if path.exists() {
            Config::load_from(&path)?
        } else {
            Config::default()
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Loads a config file without consulting the environment.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Config> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| InstallerError::Config(format!("Invalid config file {}: {}", path.display(), e)))
    }

    /// Saves the config in pretty TOML format.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| InstallerError::Config(e.to_string()))?;
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Overrides fields from variables returned by `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_REPOSITORY) {
            self.repository_url = url;
        }
        if let Some(dir) = lookup(ENV_LOCAL_REPOSITORY) {
            self.local_repository = PathBuf::from(dir);
        }
        if let Some(file) = lookup(ENV_STATE_FILE) {
            self.state_file = PathBuf::from(file);
        }
        if let Some(dir) = lookup(ENV_STAGING_DIR) {
            self.staging_dir = PathBuf::from(dir);
        }
    }
}
