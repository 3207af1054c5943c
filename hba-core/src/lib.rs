//! Static security analysis for pg_hba.conf
//!
//! Parses access rules, runs single-rule checks against the server settings,
//! and looks for rules that are shadowed, partially overlapped, or made
//! redundant by earlier rules under first-match evaluation.

pub mod address;
pub mod checks;
pub mod config;
pub mod error;
pub mod finding;
pub mod ident;
pub mod overlap;
pub mod parser;
pub mod rule;

// Re-export commonly used types
pub use address::{AddressSet, SpecialKind};
pub use config::{Config, ConfigLoader, Settings};
pub use error::{AddressError, LintError, ParseError, Result, ValidationError};
pub use finding::{Code, Finding, Report, Severity};
pub use ident::IdentMap;
pub use overlap::{check_overlaps, Relation};
pub use parser::{parse_hba, parse_hba_reader};
pub use rule::{ConnectionKind, Rule, TokenList};

/// Run the single-rule checks, then the rule ordering analysis
pub fn check_all(rules: &[Rule], settings: &Settings, ident: &IdentMap) -> Report {
    let mut report = checks::check_rules(rules, settings, ident);
    report.extend(overlap::check_overlaps(rules));

    tracing::info!(
        rules = rules.len(),
        errors = report.count(Severity::Error),
        warnings = report.count(Severity::Warning),
        info = report.count(Severity::Info),
        "analysis complete"
    );
    report
}
