//! Configuration schema types

use crate::address::{DEFAULT_WIDE_V4_PREFIX, DEFAULT_WIDE_V6_PREFIX};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete linter configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub common: CommonConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub checks: ChecksConfig,
}

/// Common settings
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CommonConfig {
    /// Debug logging, same as `--verbose`
    #[serde(default)]
    pub verbose: bool,
}

/// What is known about the server the rules belong to
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Value of the server's `ssl` setting
    #[serde(default = "default_true")]
    pub ssl_enabled: bool,
    /// pg_ident.conf location; defaults to the file next to pg_hba.conf
    #[serde(default)]
    pub ident_file: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            ssl_enabled: true,
            ident_file: None,
        }
    }
}

/// Check tuning
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChecksConfig {
    /// IPv4 prefix length at or below which an address range is wide
    #[serde(default = "default_wide_v4")]
    pub wide_v4_prefix: u8,
    /// IPv6 prefix length at or below which an address range is wide
    #[serde(default = "default_wide_v6")]
    pub wide_v6_prefix: u8,
    /// Finding codes left out of the report
    #[serde(default)]
    pub disabled_codes: Vec<String>,
}

fn default_wide_v4() -> u8 {
    DEFAULT_WIDE_V4_PREFIX
}

fn default_wide_v6() -> u8 {
    DEFAULT_WIDE_V6_PREFIX
}

impl Default for ChecksConfig {
    fn default() -> Self {
        Self {
            wide_v4_prefix: default_wide_v4(),
            wide_v6_prefix: default_wide_v6(),
            disabled_codes: vec![],
        }
    }
}

/// Immutable inputs shared by the single-rule checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub ssl_enabled: bool,
    pub wide_v4_prefix: u8,
    pub wide_v6_prefix: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ssl_enabled: true,
            wide_v4_prefix: DEFAULT_WIDE_V4_PREFIX,
            wide_v6_prefix: DEFAULT_WIDE_V6_PREFIX,
        }
    }
}

impl Config {
    pub fn settings(&self) -> Settings {
        Settings {
            ssl_enabled: self.server.ssl_enabled,
            wide_v4_prefix: self.checks.wide_v4_prefix,
            wide_v6_prefix: self.checks.wide_v6_prefix,
        }
    }
}
