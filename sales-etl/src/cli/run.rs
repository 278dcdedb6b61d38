//! Command handlers

use anyhow::{Context, Result};

use sales_etl::report::render_text;
use sales_etl::store::{SalesStore, validate};
use sales_etl::{ValidationReport, run_pipeline};

use super::{Cli, Commands, OutputFormat, RunArgs};

/// Dispatch to the selected command; no subcommand means `run`
pub async fn handle_command(cli: Cli, styled: bool) -> Result<()> {
    match &cli.command {
        Some(Commands::Run(args)) => handle_run(&cli, args, styled).await,
        Some(Commands::Validate) => handle_validate(&cli, styled).await,
        None => handle_run(&cli, &RunArgs::default(), styled).await,
    }
}

async fn handle_run(cli: &Cli, args: &RunArgs, styled: bool) -> Result<()> {
    let config = cli.resolve_config(Some(args))?;
    log::info!(
        "Loading {} sources into {}",
        config.sources.len(),
        config.database.path.display()
    );

    let summary = run_pipeline(&config)
        .await
        .context("Sales load failed")?;

    for source in &summary.sources {
        log::info!(
            "Region {}: {} records from {}",
            source.region,
            source.records,
            source.path.display()
        );
    }

    match cli.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&summary)
                .context("Failed to serialize pipeline summary")?;
            println!("{}", json);
            Ok(())
        }
        OutputFormat::Text => print_report(&summary.report, OutputFormat::Text, styled),
    }
}

async fn handle_validate(cli: &Cli, styled: bool) -> Result<()> {
    let config = cli.resolve_config(None)?;
    let store = SalesStore::new(config.database);

    let report = validate(&store)
        .await
        .with_context(|| format!("Validation of {} failed", store.location().display()))?;

    print_report(&report, cli.format, styled)
}

fn print_report(report: &ValidationReport, format: OutputFormat, styled: bool) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(report)
                .context("Failed to serialize validation report")?;
            println!("{}", json);
        }
        OutputFormat::Text => print!("{}", render_text(report, styled)),
    }
    Ok(())
}
