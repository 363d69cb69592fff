//! CLI command definitions and handlers.

pub mod classify;
pub mod models;

use clap::{Parser, Subcommand};

/// Faceprofile - age and gender estimation for still photographs
#[derive(Parser)]
#[command(name = "faceprofile")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Shared classify arguments (paths, options).
    #[command(flatten)]
    pub classify: classify::ClassifyArgs,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Classify age and gender for faces in photographs
    Classify(classify::ClassifyArgs),
    /// Manage ML models
    Models(models::ModelsArgs),
}

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Every image yielded a classified face.
    Success,
    /// At least one image had no usable face.
    NoFace,
    /// A hard error occurred.
    Error,
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        match code {
            ExitCode::Success => Self::from(0),
            ExitCode::NoFace => Self::from(1),
            ExitCode::Error => Self::from(2),
        }
    }
}
