//! Configuration file loading

use super::schema::Config;
use super::validator::ConfigValidator;
use crate::error::{LintError, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Find user config by checking environment and standard locations
    pub fn find_user_config() -> Option<PathBuf> {
        // 1. $HBA_LINT_CONFIG
        if let Ok(path) = env::var("HBA_LINT_CONFIG") {
            let p = PathBuf::from(path);
            if p.exists() {
                return Some(p);
            }
        }

        // 2. $XDG_CONFIG_HOME/hba-lint/config.toml
        if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
            let p = PathBuf::from(xdg).join("hba-lint/config.toml");
            if p.exists() {
                return Some(p);
            }
        }

        // 3. ~/.config/hba-lint/config.toml
        if let Ok(home) = env::var("HOME") {
            let p = PathBuf::from(home).join(".config/hba-lint/config.toml");
            if p.exists() {
                return Some(p);
            }
        }

        None
    }

    /// Load and validate config from a file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Config> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| LintError::ConfigLoad {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::parse(&contents)?;
        tracing::debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Parse and validate config text
    pub fn parse(contents: &str) -> Result<Config> {
        let config: Config = toml::from_str(contents)?;
        ConfigValidator::validate(&config)?;
        Ok(config)
    }

    /// Load config from optional path, else the user config, else defaults
    /// Priority: Explicit path > User config > Built-in defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Config> {
        if let Some(p) = path {
            return Self::load_from_file(p);
        }

        match Self::find_user_config() {
            Some(p) => Self::load_from_file(p),
            None => {
                tracing::debug!("No user config found, using defaults");
                Ok(Config::default())
            }
        }
    }
}
