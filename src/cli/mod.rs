// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction. Parses arguments with
// clap and routes each subcommand to the application layer;
// the only rendering done here is terminal output.

pub mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use commands::{AnalyzeArgs, Commands, LogArgs, ModelArgs, ServeArgs};

use crate::application::analyze_use_case::{AnalyzeUseCase, AppConfig};
use crate::domain::errors::{AnalyzeError, LogError};
use crate::infra::{interaction_log::InteractionLog, model_fetcher::FetchOutcome};
use crate::web::{self, AppState};

#[derive(Parser, Debug)]
#[command(
    name = "token-lens",
    version,
    about = "Label every token of a sentence with a pretrained model and keep a CSV log of the results."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Serve(args)    => run_serve(args),
            Commands::Analyze(args)  => run_analyze(args),
            Commands::Fetch(args)    => run_fetch(args),
            Commands::ShowLog(args)  => run_show_log(args),
            Commands::ClearLog(args) => run_clear_log(args),
        }
    }
}

/// Load the model, then serve until interrupted.
fn run_serve(args: ServeArgs) -> Result<()> {
    let cfg = AppConfig::from(&args);

    // Model download and loading are blocking; finish them before the runtime starts.
    let use_case = if args.skip_fetch {
        AnalyzeUseCase::load(&cfg)?
    } else {
        AnalyzeUseCase::from_config(&cfg)?
    };

    let runtime = tokio::runtime::Runtime::new().context("Cannot start async runtime")?;
    runtime.block_on(web::run(AppState::new(use_case), args.addr))
}

fn run_analyze(args: AnalyzeArgs) -> Result<()> {
    let cfg = AppConfig::from(&args);
    let use_case = AnalyzeUseCase::from_config(&cfg)?;

    let outcome = match use_case.analyze(&args.text) {
        Ok(o) => o,
        Err(AnalyzeError::EmptyInput) => {
            println!("⚠️ Please enter some text.");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    println!("Tokens: {:?}", outcome.tokens);
    println!("\nPrediction Results");
    for p in &outcome.predictions {
        println!("  {:<20} {:<16} {}", p.text, p.label, p.display_score());
    }

    match (&outcome.log_download, &outcome.log_error) {
        (_, Some(err)) => println!("\n{err}"),
        (Some(_), None) => println!("\nLogged to '{}'", use_case.log().path().display()),
        (None, None) => {}
    }
    Ok(())
}

fn run_fetch(args: ModelArgs) -> Result<()> {
    let cfg = AppConfig {
        model_dir:   args.model_dir,
        weights_url: args.weights_url,
        ..AppConfig::default()
    };
    match cfg.fetcher().ensure_present()? {
        FetchOutcome::AlreadyPresent => println!("Model already exists. Skipping download."),
        FetchOutcome::Downloaded { bytes } => println!("Download complete ({bytes} bytes)."),
    }
    Ok(())
}

fn run_show_log(args: LogArgs) -> Result<()> {
    match InteractionLog::new(&args.log_file).read() {
        Ok(content) => print!("{content}"),
        Err(LogError::Missing(path)) => println!("No interactions logged yet ('{}').", path.display()),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

fn run_clear_log(args: LogArgs) -> Result<()> {
    InteractionLog::new(&args.log_file).reset()?;
    println!("Interaction log cleared!");
    Ok(())
}
