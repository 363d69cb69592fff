//! Faceprofile CLI - age and gender estimation for still photographs.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod output;

use commands::{Cli, Commands, ExitCode};
use config::AppConfig;

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = AppConfig::load();

    let exit_code = match cli.command {
        Some(Commands::Classify(args)) => run_classify(args, &config),
        Some(Commands::Models(ref args)) => match commands::models::run(args) {
            Ok(()) => ExitCode::Success,
            Err(e) => {
                eprintln!("error: {e:#}");
                ExitCode::Error
            }
        },
        None => {
            if cli.classify.paths.is_empty() {
                eprintln!("error: No paths specified. Use --help for usage information.");
                return ExitCode::Error.into();
            }
            run_classify(cli.classify, &config)
        }
    };

    exit_code.into()
}

fn run_classify(args: commands::classify::ClassifyArgs, config: &AppConfig) -> ExitCode {
    let args = commands::classify::ClassifyArgs::with_config(args, config);
    match commands::classify::run(&args) {
        Ok(result) => result.exit_code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::Error
        }
    }
}
