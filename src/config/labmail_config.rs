//! LabMail configuration file handling
//!
//! Loads and manages the ~/.config/labmail/config.yaml file. Every field
//! has a default, so a missing file yields a working local setup and a
//! partial file only overrides what it names.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Storage backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// One JSON file per message under the mail directory
    #[default]
    Files,
    /// Single shared SQLite database
    Sqlite,
}

/// LabMail configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabMailConfig {
    /// Canonical names of the collective members
    #[serde(default = "default_collective")]
    pub collective: Vec<String>,

    /// Which storage backend to use
    #[serde(default)]
    pub backend: Backend,

    /// Mail root for the file backend
    #[serde(default = "default_mail_dir")]
    pub mail_dir: PathBuf,

    /// Database path for the sqlite backend
    #[serde(default = "default_database")]
    pub database: PathBuf,

    /// Pin the local identity instead of deriving it from the hostname
    /// (containers and test rigs rarely have meaningful hostnames)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
}

fn default_collective() -> Vec<String> {
    ["edgar-dev", "skynet-prod", "hal-db", "coder"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn config_root() -> PathBuf {
    // Always use ~/.config for consistency across platforms
    let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(".config");
    path.push("labmail");
    path
}

fn default_mail_dir() -> PathBuf {
    config_root().join("mail")
}

fn default_database() -> PathBuf {
    config_root().join("mail.db")
}

impl Default for LabMailConfig {
    fn default() -> Self {
        Self {
            collective: default_collective(),
            backend: Backend::default(),
            mail_dir: default_mail_dir(),
            database: default_database(),
            identity: None,
        }
    }
}

impl LabMailConfig {
    /// Default config file location
    pub fn default_path() -> PathBuf {
        config_root().join("config.yaml")
    }

    /// Load from a specific path
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            crate::LabMailError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load the default config file, or fall back to defaults when it
    /// does not exist
    pub fn load_or_default() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!("No config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Save to a specific path, creating parent directories
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_yaml::to_string(self)?)?;
        Ok(())
    }
}
