//! Error types for hba parsing and linting

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LintError>;

#[derive(Debug, Error)]
pub enum LintError {
    #[error("Configuration validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Failed to load config from {path}")]
    ConfigLoad {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Failed to read {path}")]
    ReadInput {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid {family} wide-network prefix {prefix} (maximum {max})")]
    InvalidThreshold {
        family: &'static str,
        prefix: u8,
        max: u8,
    },

    #[error("Unknown finding code: {code}")]
    UnknownCode { code: String },
}

/// Failure to turn an address field into an [`AddressSet`](crate::AddressSet)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("Invalid address: {token}")]
    InvalidAddress { token: String },

    #[error("Invalid netmask {mask} for address {address}")]
    InvalidNetmask { address: String, mask: String },
}

/// A pg_hba line that could not be turned into a rule
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("line {line}: not enough fields")]
    NotEnoughFields { line: usize },

    #[error("line {line}: not enough fields for host rule")]
    MissingAddress { line: usize },

    #[error("line {line}: unknown connection type {kind}")]
    UnknownConnectionType { line: usize, kind: String },

    #[error("line {line}: invalid address field")]
    Address {
        line: usize,
        #[source]
        source: AddressError,
    },

    #[error("line {line}: read failed")]
    Read {
        line: usize,
        #[source]
        source: std::io::Error,
    },
}

impl ParseError {
    /// Source line the error is attached to
    pub fn line(&self) -> usize {
        match self {
            ParseError::NotEnoughFields { line }
            | ParseError::MissingAddress { line }
            | ParseError::UnknownConnectionType { line, .. }
            | ParseError::Address { line, .. }
            | ParseError::Read { line, .. } => *line,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;
    use std::io;

    #[test]
    fn test_io_source_not_repeated_in_message() {
        let err = LintError::ConfigLoad {
            path: PathBuf::from("/etc/hba-lint/config.toml"),
            source: io::Error::new(io::ErrorKind::NotFound, "gone"),
        };
        assert_eq!(
            err.to_string(),
            "Failed to load config from /etc/hba-lint/config.toml"
        );
        assert_eq!(err.source().map(|s| s.to_string()), Some("gone".to_string()));

        let err = LintError::ReadInput {
            path: PathBuf::from("pg_hba.conf"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.to_string(), "Failed to read pg_hba.conf");
        assert_eq!(err.source().map(|s| s.to_string()), Some("denied".to_string()));
    }

    #[test]
    fn test_parse_error_keeps_address_as_source() {
        let err = ParseError::Address {
            line: 3,
            source: AddressError::InvalidAddress {
                token: "bogus".to_string(),
            },
        };
        assert_eq!(err.to_string(), "line 3: invalid address field");
        assert_eq!(
            err.source().map(|s| s.to_string()),
            Some("Invalid address: bogus".to_string())
        );
        assert_eq!(err.line(), 3);
    }
}
