//! Configuration validation

use super::schema::Config;
use crate::error::{LintError, Result, ValidationError};
use crate::finding::Code;

pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate entire configuration
    pub fn validate(config: &Config) -> Result<()> {
        Self::validate_thresholds(config)?;
        Self::resolve_disabled_codes(config)?;
        Ok(())
    }

    fn validate_thresholds(config: &Config) -> Result<()> {
        if config.checks.wide_v4_prefix > 32 {
            return Err(ValidationError::InvalidThreshold {
                family: "IPv4",
                prefix: config.checks.wide_v4_prefix,
                max: 32,
            }
            .into());
        }

        if config.checks.wide_v6_prefix > 128 {
            return Err(ValidationError::InvalidThreshold {
                family: "IPv6",
                prefix: config.checks.wide_v6_prefix,
                max: 128,
            }
            .into());
        }

        Ok(())
    }

    /// Map `disabled_codes` to finding codes, rejecting names that do not exist
    pub fn resolve_disabled_codes(config: &Config) -> Result<Vec<Code>> {
        config
            .checks
            .disabled_codes
            .iter()
            .map(|name| {
                Code::parse(name).ok_or_else(|| {
                    LintError::from(ValidationError::UnknownCode {
                        code: name.clone(),
                    })
                })
            })
            .collect()
    }
}
