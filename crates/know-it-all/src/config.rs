//! Configuration
//!
//! Configuration file: ~/.config/know-it-all/config.yaml
//!
//! Every field is optional; anything missing falls back to the relative
//! paths the tool has always used.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_DIR: &str = "know-it-all";
const CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Store used when no outfile is given
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    /// Where `encrypt` writes its output
    #[serde(default = "default_encrypted_path")]
    pub encrypted_path: PathBuf,

    /// Where `decrypt` writes its output
    #[serde(default = "default_decrypted_path")]
    pub decrypted_path: PathBuf,
}

fn default_store_path() -> PathBuf {
    PathBuf::from("./database.json")
}

fn default_encrypted_path() -> PathBuf {
    PathBuf::from("./encrypted.kia")
}

fn default_decrypted_path() -> PathBuf {
    PathBuf::from("./decrypted.json")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            encrypted_path: default_encrypted_path(),
            decrypted_path: default_decrypted_path(),
        }
    }
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {:?}", path))
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }
}
