use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use is_terminal::IsTerminal;

use sales_etl::EtlError;

mod cli;

use cli::{Cli, EXIT_GENERAL_FAILURE, parse_failure_exit_code};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // Help and version text also arrive as errors
            let _ = err.print();
            return ExitCode::from(parse_failure_exit_code(&err));
        }
    };

    // .env may set RUST_LOG
    dotenvy::dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_level()))
        .format_timestamp(None)
        .init();

    let styled = !cli.no_color && std::io::stdout().is_terminal();
    if !styled {
        colored::control::set_override(false);
    }

    match cli::run::handle_command(cli, styled).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {:#}", "error:".red().bold(), err);
            ExitCode::from(exit_code(&err))
        }
    }
}

fn exit_code(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<EtlError>())
        .map(EtlError::exit_code)
        .unwrap_or(EXIT_GENERAL_FAILURE)
}
