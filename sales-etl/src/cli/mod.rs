//! Command-line interface

pub mod run;

use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use sales_etl::config::{Config, SourceConfig};
use sales_etl::sales::Region;
use sales_etl::store::StoreConfig;

/// Exit code for failures outside the load itself (config, arguments, output)
pub const EXIT_GENERAL_FAILURE: u8 = 1;

#[derive(Parser, Debug)]
#[command(name = "sales-etl", version, about = "Load regional sales spreadsheets into SQLite")]
pub struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// SQLite database file, overrides the configured one
    #[arg(long, global = true, value_name = "FILE")]
    pub database: Option<PathBuf>,

    /// Output format for the report
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Read, merge, load and validate (default)
    Run(RunArgs),
    /// Validate the existing store without loading anything
    Validate,
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Input file for a region, in merge order (repeatable)
    #[arg(long = "source", value_name = "REGION=PATH", value_parser = parse_source)]
    pub sources: Vec<SourceConfig>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl Cli {
    /// Log filter implied by -v / -q
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }

    /// Load the config file and apply command-line overrides
    pub fn resolve_config(&self, run: Option<&RunArgs>) -> anyhow::Result<Config> {
        let mut config = Config::load(self.config.as_deref())?;

        if let Some(path) = &self.database {
            config.database = StoreConfig {
                path: path.clone(),
                ..config.database
            };
        }
        if let Some(run) = run {
            if !run.sources.is_empty() {
                config.sources = run.sources.clone();
            }
        }

        config.validate()?;
        Ok(config)
    }
}

/// Exit code for an argument parse that did not produce a `Cli`
///
/// `--help` and `--version` also arrive here and count as success. Anything
/// else is a usage error, kept apart from the input-failure code.
pub fn parse_failure_exit_code(err: &clap::Error) -> u8 {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => EXIT_GENERAL_FAILURE,
    }
}

fn parse_source(value: &str) -> Result<SourceConfig, String> {
    let (label, path) = value
        .split_once('=')
        .ok_or_else(|| format!("expected REGION=PATH, got '{}'", value))?;
    let region = Region::new(label).map_err(|e| e.to_string())?;
    if path.trim().is_empty() {
        return Err(format!("missing path for region '{}'", region));
    }
    Ok(SourceConfig::new(region, path.trim()))
}
