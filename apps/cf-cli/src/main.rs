use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use cf_app::{AppError, AppResult, RunModelExt, RunOptions, model_service};
use cf_results::{RunManifest, RunOutputs};

#[derive(Parser)]
#[command(name = "cf-cli")]
#[command(about = "cf CLI - build, inspect and run CFAST fire scenarios", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and validate an input deck
    Validate {
        /// Path to the .in deck
        deck: PathBuf,
    },
    /// Print the deck as it would be written back out
    Show {
        /// Path to the .in deck
        deck: PathBuf,
        /// Align keys within each record
        #[arg(long)]
        pretty: bool,
    },
    /// Summarize the entities in a deck
    Summary {
        /// Path to the .in deck
        deck: PathBuf,
        /// Emit counts as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run the solver on a deck
    Run {
        /// Path to the .in deck
        deck: PathBuf,
        /// Solver executable (defaults to $CFAST, then cfast on PATH)
        #[arg(long)]
        exe: Option<PathBuf>,
        /// Kill the solver after this many seconds
        #[arg(long)]
        timeout: Option<f64>,
        /// Run in a fresh directory beside the deck
        #[arg(long)]
        isolate: bool,
        /// Write over the input deck instead of a `_parsed` copy
        #[arg(long)]
        in_place: bool,
        /// Log solver stdout and stderr
        #[arg(short, long)]
        verbose: bool,
        /// Print the manifest and output tables as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> AppResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { deck } => cmd_validate(&deck),
        Commands::Show { deck, pretty } => cmd_show(&deck, pretty),
        Commands::Summary { deck, json } => cmd_summary(&deck, json),
        Commands::Run {
            deck,
            exe,
            timeout,
            isolate,
            in_place,
            verbose,
            json,
        } => {
            let timeout = timeout.map(Duration::try_from_secs_f64).transpose().map_err(|e| {
                AppError::Io(io::Error::new(io::ErrorKind::InvalidInput, e))
            })?;
            let options = RunOptions {
                verbose,
                timeout,
                isolate,
                file_name: None,
            };
            cmd_run(&deck, exe, in_place, &options, json)
        }
    }
}

fn cmd_validate(deck: &Path) -> AppResult<()> {
    println!("Validating deck: {}", deck.display());
    let model = model_service::load_model(deck)?;
    model.validate()?;
    let s = model_service::summarize(&model);
    println!(
        "✓ Deck is valid ({} compartments, {} fires, {} devices)",
        s.compartments, s.fires, s.devices
    );
    Ok(())
}

fn cmd_show(deck: &Path, pretty: bool) -> AppResult<()> {
    let model = model_service::load_model(deck)?;
    print!("{}", model.view_cfast_input_file(pretty));
    Ok(())
}

fn cmd_summary(deck: &Path, json: bool) -> AppResult<()> {
    let model = model_service::load_model(deck)?;
    if json {
        print_json(&model_service::summarize(&model))
    } else {
        println!("{}", model.summary());
        Ok(())
    }
}

#[derive(Serialize)]
struct RunReport<'a> {
    manifest: &'a RunManifest,
    outputs: &'a RunOutputs,
}

fn cmd_run(
    deck: &Path,
    exe: Option<PathBuf>,
    in_place: bool,
    options: &RunOptions,
    json: bool,
) -> AppResult<()> {
    let mut model = if in_place {
        model_service::load_model_in_place(deck)?
    } else {
        model_service::load_model(deck)?
    };
    if let Some(exe) = exe {
        model = model.with_cfast_exe(exe);
    }

    if !json {
        println!("Running {}", model.file_name().display());
    }
    let response = model.run(options)?;

    if json {
        return print_json(&RunReport {
            manifest: &response.manifest,
            outputs: &response.outputs,
        });
    }

    println!("✓ Simulation completed: {}", response.manifest.run_id);
    println!("  Deck: {}", response.deck.display());
    println!("  Wall time: {:.2} s", response.manifest.elapsed_s);
    for (kind, table) in response.outputs.iter() {
        println!(
            "  {:<13} {:>5} rows  {:>4} columns",
            kind.to_string(),
            table.len(),
            table.columns.len()
        );
    }
    for kind in response.outputs.missing() {
        println!("  {:<13} not written", kind.to_string());
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> AppResult<()> {
    let text = serde_json::to_string_pretty(value).map_err(io::Error::from)?;
    println!("{text}");
    Ok(())
}
