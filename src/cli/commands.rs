// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Subcommands:
//   serve      — web front-end
//   analyze    — one-shot analysis from the terminal
//   fetch      — download model weights if missing
//   show-log   — print the interaction log
//   clear-log  — reset the interaction log to its header

use clap::{Args, Subcommand};
use std::{net::SocketAddr, path::PathBuf};

use crate::application::analyze_use_case::AppConfig;
use crate::infra::{interaction_log::DEFAULT_LOG_FILE, model_fetcher::DEFAULT_WEIGHTS_URL};
use crate::ml::inferencer::OUTSIDE_LABEL;
use crate::web::DEFAULT_ADDR;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the web front-end
    Serve(ServeArgs),

    /// Analyze one sentence and print the predictions
    Analyze(AnalyzeArgs),

    /// Download the model weights if they are not on disk yet
    Fetch(ModelArgs),

    /// Print the interaction log
    ShowLog(LogArgs),

    /// Discard all logged interactions, keeping the header row
    ClearLog(LogArgs),
}

/// Where the model lives and how its output is filtered.
#[derive(Args, Debug, Clone)]
pub struct ModelArgs {
    /// HuggingFace model folder (config.json, pytorch_model.bin,
    /// tokenizer.json or vocab.txt)
    #[arg(long, default_value = "model")]
    pub model_dir: PathBuf,

    /// URL used to fetch pytorch_model.bin when it is missing
    #[arg(long, default_value = DEFAULT_WEIGHTS_URL)]
    pub weights_url: String,

    /// Predicted label to leave out of the results (repeatable)
    #[arg(long = "ignore-label", default_values_t = vec![OUTSIDE_LABEL.to_string()])]
    pub ignore_labels: Vec<String>,

    /// Report every token, including those labelled as ignored
    #[arg(long, conflicts_with = "ignore_labels")]
    pub all_labels: bool,
}

#[derive(Args, Debug, Clone)]
pub struct LogArgs {
    /// CSV file the interactions are appended to
    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    #[command(flatten)]
    pub log: LogArgs,

    /// Address to listen on
    #[arg(long, default_value = DEFAULT_ADDR)]
    pub addr: SocketAddr,

    /// Do not download missing weights; fail if they are absent
    #[arg(long)]
    pub skip_fetch: bool,
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// The sentence to label
    #[arg(long)]
    pub text: String,

    #[command(flatten)]
    pub model: ModelArgs,

    #[command(flatten)]
    pub log: LogArgs,
}

/// Convert CLI flags into the application-layer AppConfig.
/// The application layer never sees clap types.
pub fn app_config(model: &ModelArgs, log: &LogArgs) -> AppConfig {
    AppConfig {
        model_dir:     model.model_dir.clone(),
        log_file:      log.log_file.clone(),
        weights_url:   model.weights_url.clone(),
        ignore_labels: if model.all_labels { Vec::new() } else { model.ignore_labels.clone() },
    }
}

impl From<&ServeArgs> for AppConfig {
    fn from(a: &ServeArgs) -> Self {
        app_config(&a.model, &a.log)
    }
}

impl From<&AnalyzeArgs> for AppConfig {
    fn from(a: &AnalyzeArgs) -> Self {
        app_config(&a.model, &a.log)
    }
}
