//! Models command - manage the detector and classifier weights.

use anyhow::Result;
use clap::{Args, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use faceprofile_adapters::{ensure_model, list_models, models_dir, ProgressCallback, MODELS};

/// Arguments for the models command
#[derive(Args)]
pub struct ModelsArgs {
    #[command(subcommand)]
    pub command: ModelsCommand,
}

/// Models subcommands
#[derive(Subcommand)]
pub enum ModelsCommand {
    /// Download model weights (all of them by default)
    Fetch {
        /// Fetch only the named models (face, gender, age)
        #[arg(value_name = "NAME")]
        names: Vec<String>,
    },
    /// Show which models are installed
    List,
    /// Print the models directory
    Path,
}

/// Run the models command.
pub fn run(args: &ModelsArgs) -> Result<()> {
    match &args.command {
        ModelsCommand::Fetch { names } => fetch(names),
        ModelsCommand::List => {
            list();
            Ok(())
        }
        ModelsCommand::Path => {
            println!("{}", models_dir().display());
            Ok(())
        }
    }
}

fn fetch(names: &[String]) -> Result<()> {
    let targets: Vec<&str> = if names.is_empty() {
        MODELS.iter().map(|m| m.name).collect()
    } else {
        names.iter().map(String::as_str).collect()
    };

    let bar = ProgressBar::new(targets.len() as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .map_err(|e| anyhow::anyhow!("Invalid progress template: {e}"))?
            .progress_chars("=> "),
    );

    // One callback invocation per downloaded model.
    let reporter = bar.clone();
    let progress: ProgressCallback = Box::new(move |name, downloaded, _total| {
        reporter.set_message(format!("{name}: {downloaded} bytes"));
    });

    for name in targets {
        ensure_model(name, Some(&progress))?;
        bar.inc(1);
    }

    bar.finish_with_message("model weights ready");
    Ok(())
}

fn list() {
    println!("Models in {}:", models_dir().display());
    for (name, installed) in list_models() {
        let role = match name {
            "face" => "eye locator for face detection",
            "gender" => "gender range classifier",
            "age" => "age range classifier",
            _ => "auxiliary",
        };
        let status = if installed { "installed" } else { "missing" };
        println!("  {name:<8} {status:<10} {role}");
    }
}
