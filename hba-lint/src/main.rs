//! Security linter for PostgreSQL pg_hba.conf

use anyhow::{Context, Result};
use clap::Parser;
use hba_core::config::ConfigValidator;
use hba_core::{check_all, parse_hba, Config, ConfigLoader, IdentMap, LintError, Report};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

/// Exit status when no finding has Error severity
const EXIT_CLEAN: u8 = 0;
/// Exit status when at least one Error finding was reported
const EXIT_FINDINGS: u8 = 1;
/// Exit status for unreadable input, bad config, or unparseable rules
const EXIT_FAILURE: u8 = 2;

#[derive(Parser, Debug)]
#[command(
    name = "hba-lint",
    about = "Report security problems and shadowed rules in pg_hba.conf",
    version
)]
struct Args {
    /// Path to pg_hba.conf
    #[arg(long, value_name = "PATH")]
    hba: PathBuf,

    /// Path to pg_ident.conf (default: pg_ident.conf next to the hba file)
    #[arg(long, value_name = "PATH")]
    ident: Option<PathBuf>,

    /// Whether the server has ssl enabled (overrides config)
    #[arg(long, value_name = "BOOL", action = clap::ArgAction::Set)]
    ssl: Option<bool>,

    /// IPv4 prefix length at or below which a range is reported as wide
    #[arg(long = "wide4", value_name = "PREFIX")]
    wide_v4: Option<u8>,

    /// IPv6 prefix length at or below which a range is reported as wide
    #[arg(long = "wide6", value_name = "PREFIX")]
    wide_v6: Option<u8>,

    /// Config file (TOML format; default: $HBA_LINT_CONFIG, then the user config dir)
    #[arg(long, short = 'c', value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short = 'v')]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // The config can turn on debug output, so it is read before logging starts
    let config = load_config(&args);

    // Initialize logging
    let verbose = match &config {
        Ok(config) => verbose_logging(&args, config),
        Err(_) => args.verbose,
    };
    let env_filter = if verbose {
        EnvFilter::from_default_env().add_directive(LevelFilter::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(LevelFilter::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let stdout = io::stdout();
    match config.and_then(|config| run(&args, &config, &mut stdout.lock())) {
        Ok(report) if report.has_errors() => ExitCode::from(EXIT_FINDINGS),
        Ok(_) => ExitCode::from(EXIT_CLEAN),
        Err(e) => {
            eprintln!("hba-lint: {:#}", e);
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

/// Debug output is on when either the flag or `[common] verbose` asks for it
fn verbose_logging(args: &Args, config: &Config) -> bool {
    args.verbose || config.common.verbose
}

/// Load the config file and apply command-line overrides on top of it
fn load_config(args: &Args) -> Result<Config> {
    let mut config = ConfigLoader::load_or_default(args.config.as_deref())
        .context("Failed to load configuration")?;

    // Command-line values win over the config file
    if let Some(ssl) = args.ssl {
        config.server.ssl_enabled = ssl;
    }
    if let Some(prefix) = args.wide_v4 {
        config.checks.wide_v4_prefix = prefix;
    }
    if let Some(prefix) = args.wide_v6 {
        config.checks.wide_v6_prefix = prefix;
    }
    if args.ident.is_some() {
        config.server.ident_file = args.ident.clone();
    }
    ConfigValidator::validate(&config).context("Invalid configuration")?;

    Ok(config)
}

/// Analyze the hba file and print findings to `out`
fn run(args: &Args, config: &Config, out: &mut impl Write) -> Result<Report> {
    let disabled = ConfigValidator::resolve_disabled_codes(config)?;

    let text = fs::read_to_string(&args.hba).map_err(|source| LintError::ReadInput {
        path: args.hba.clone(),
        source,
    })?;
    let rules =
        parse_hba(&text).with_context(|| format!("Failed to parse {}", args.hba.display()))?;
    tracing::debug!("Parsed {} rules from {:?}", rules.len(), args.hba);

    let ident = load_ident(&args.hba, config.server.ident_file.as_deref());

    let report = check_all(&rules, &config.settings(), &ident).without_codes(&disabled);
    for finding in &report {
        writeln!(out, "{}", finding).context("Failed to write report")?;
    }

    Ok(report)
}

/// Read the ident map; a missing file means no maps are defined
fn load_ident(hba_path: &Path, explicit: Option<&Path>) -> IdentMap {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => hba_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join("pg_ident.conf"),
    };

    match IdentMap::load_from_file(&path) {
        Ok(map) => {
            tracing::debug!("Loaded {} ident maps from {:?}", map.len(), path);
            map
        }
        Err(e) if explicit.is_some() => {
            tracing::warn!("{}; continuing without ident maps", e);
            IdentMap::new()
        }
        Err(_) => {
            tracing::debug!("No ident file at {:?}", path);
            IdentMap::new()
        }
    }
}
