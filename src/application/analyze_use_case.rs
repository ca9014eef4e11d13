// ============================================================
// Layer 2 — AnalyzeUseCase
// ============================================================
// Orchestrates one user action end to end:
//
//   analyze(text)
//     Step 1: Reject blank input            (no inference, no log)
//     Step 2: Tokenise for display          (Layer 5 - ml)
//     Step 3: Classify tokens               (Layer 5 - ml)
//     Step 4: Normalise predictions         (Layer 4 - data)
//     Step 5: Append to interaction log     (Layer 6 - infra)
//     Step 6: Read the log back for download
//
//   clear_log()  → InteractionLog::reset
//
// A logging failure in step 5/6 never fails the analysis: the
// predictions are returned together with the error message.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::data::normalizer::Normalizer;
use crate::domain::{
    errors::{AnalyzeError, LogError},
    log_record::LogRecord,
    prediction::PredictionToken,
    traits::TokenClassifier,
};
use crate::infra::{
    checkpoint::WEIGHTS_FILE,
    interaction_log::{InteractionLog, DEFAULT_LOG_FILE},
    model_fetcher::{ModelFetcher, DEFAULT_WEIGHTS_URL},
};
use crate::ml::{inferencer::{TokenClassificationPipeline, OUTSIDE_LABEL}, InferBackend};

// ─── Application Configuration ───────────────────────────────────────────────
/// Everything needed to assemble the application.
/// Built from CLI flags (see cli::commands), never from clap types directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// HuggingFace model folder (config.json, weights, tokenizer)
    pub model_dir:     PathBuf,

    /// Interaction log location
    pub log_file:      PathBuf,

    /// Where to fetch pytorch_model.bin from when it is missing
    pub weights_url:   String,

    /// Predicted labels that are not reported
    pub ignore_labels: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model_dir:     PathBuf::from("model"),
            log_file:      PathBuf::from(DEFAULT_LOG_FILE),
            weights_url:   DEFAULT_WEIGHTS_URL.to_string(),
            ignore_labels: vec![OUTSIDE_LABEL.to_string()],
        }
    }
}

impl AppConfig {
    pub fn fetcher(&self) -> ModelFetcher {
        ModelFetcher::new(&self.weights_url, self.model_dir.join(WEIGHTS_FILE))
    }

    pub fn interaction_log(&self) -> InteractionLog {
        InteractionLog::new(&self.log_file)
    }
}

// ─── Outcome Types ────────────────────────────────────────────────────────────
/// The log file offered for download after an analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogDownload {
    pub file_name: String,
    pub content:   String,
}

/// Result of a successful analyze action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    /// Tokenizer output for display, e.g. ["as", "##pi", "##rin"]
    pub tokens:       Vec<String>,

    /// Normalised predictions, in input order
    pub predictions:  Vec<PredictionToken>,

    /// Present only when the interaction was logged
    pub log_download: Option<LogDownload>,

    /// "Log saving error: ..." when logging failed
    pub log_error:    Option<String>,
}

// ─── Use Case ─────────────────────────────────────────────────────────────────
pub struct AnalyzeUseCase {
    classifier: Box<dyn TokenClassifier>,
    normalizer: Normalizer,
    log:        InteractionLog,
}

impl AnalyzeUseCase {
    pub fn new(classifier: Box<dyn TokenClassifier>, log: InteractionLog) -> Self {
        Self { classifier, normalizer: Normalizer::new(), log }
    }

    /// Fetch the weights if needed and load the burn pipeline.
    /// Any failure here is fatal for the process.
    pub fn from_config(cfg: &AppConfig) -> Result<Self> {
        cfg.fetcher()
            .ensure_present()
            .context("Model download failed")?;
        Self::load(cfg)
    }

    /// Load the pipeline from whatever is already in the model directory.
    pub fn load(cfg: &AppConfig) -> Result<Self> {
        let pipeline = TokenClassificationPipeline::<InferBackend>::from_dir(
            &cfg.model_dir,
            Default::default(),
        )?
        .with_ignore_labels(cfg.ignore_labels.clone());

        Ok(Self::new(Box::new(pipeline), cfg.interaction_log()))
    }

    pub fn log(&self) -> &InteractionLog {
        &self.log
    }

    pub fn analyze(&self, user_input: &str) -> Result<AnalysisOutcome, AnalyzeError> {
        if is_blank(user_input) {
            tracing::warn!("Rejected empty input");
            return Err(AnalyzeError::EmptyInput);
        }

        let tokens = self.classifier.tokenize(user_input).map_err(AnalyzeError::Inference)?;
        let raw    = self.classifier.classify(user_input).map_err(AnalyzeError::Inference)?;
        let predictions = self.normalizer.normalize(&raw);

        tracing::info!(
            "Analyzed {} chars: {} tokens, {} predictions",
            user_input.len(),
            tokens.len(),
            predictions.len()
        );

        let (log_download, log_error) = match self.log_and_read(user_input, &predictions) {
            Ok(download) => (Some(download), None),
            Err(e) => {
                tracing::error!("Log saving error: {e}");
                (None, Some(format!("Log saving error: {e}")))
            }
        };

        Ok(AnalysisOutcome { tokens, predictions, log_download, log_error })
    }

    fn log_and_read(
        &self,
        user_input:  &str,
        predictions: &[PredictionToken],
    ) -> Result<LogDownload, LogError> {
        let path = self.log.append(user_input, predictions)?;
        tracing::debug!("Interaction appended to '{}'", path.display());
        Ok(LogDownload {
            file_name: self.log.file_name(),
            content:   self.log.read()?,
        })
    }

    pub fn clear_log(&self) -> Result<(), LogError> {
        self.log.reset()
    }

    pub fn read_log(&self) -> Result<String, LogError> {
        self.log.read()
    }

    pub fn log_records(&self) -> Result<Vec<LogRecord>, LogError> {
        self.log.records()
    }
}

/// Whitespace-only input, counting the ASCII information separators
/// (U+001C..=U+001F) as whitespace too.
fn is_blank(text: &str) -> bool {
    text.chars()
        .all(|c| c.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&c))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::prediction::RawPrediction;
    use std::fs;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };
    use tempfile::TempDir;

    /// Returns canned predictions and counts how often it is called.
    struct FakeClassifier {
        calls: Arc<AtomicUsize>,
    }

    impl TokenClassifier for FakeClassifier {
        fn classify(&self, _text: &str) -> Result<Vec<RawPrediction>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![
                RawPrediction::new("As", "B-DRUG", 0.987_61),
                RawPrediction::new("##pirin", "I-DRUG", 0.912_34),
            ])
        }

        fn tokenize(&self, _text: &str) -> Result<Vec<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec!["As".into(), "##pirin".into()])
        }
    }

    struct BrokenClassifier;

    impl TokenClassifier for BrokenClassifier {
        fn classify(&self, _text: &str) -> Result<Vec<RawPrediction>> {
            anyhow::bail!("model exploded")
        }

        fn tokenize(&self, _text: &str) -> Result<Vec<String>> {
            Ok(vec![])
        }
    }

    fn use_case(log: InteractionLog) -> (AnalyzeUseCase, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let fake = FakeClassifier { calls: Arc::clone(&calls) };
        (AnalyzeUseCase::new(Box::new(fake), log), calls)
    }

    #[test]
    fn test_analyze_normalizes_and_logs() {
        let dir = TempDir::new().unwrap();
        let (uc, _) = use_case(InteractionLog::new(dir.path().join("log.csv")));

        let out = uc.analyze("Aspirin helps").unwrap();
        assert_eq!(out.tokens, vec!["As", "##pirin"]);
        assert_eq!(
            out.predictions,
            vec![
                PredictionToken::new("As", "B-DRUG", 0.9876),
                PredictionToken::new("pirin", "I-DRUG", 0.9123),
            ]
        );
        assert!(out.log_error.is_none());

        let download = out.log_download.unwrap();
        assert_eq!(download.file_name, "log.csv");
        assert!(download
            .content
            .ends_with(",Aspirin helps,\"As (B-DRUG, 0.9876); pirin (I-DRUG, 0.9123)\"\r\n"));
    }

    #[test]
    fn test_blank_input_is_rejected_without_inference_or_logging() {
        let dir = TempDir::new().unwrap();
        let log = InteractionLog::new(dir.path().join("log.csv"));
        let (uc, calls) = use_case(log.clone());

        for input in ["", "   ", "\n\t ", "\u{1c}\u{1f}", " \u{1d}\u{1e} "] {
            assert!(matches!(uc.analyze(input), Err(AnalyzeError::EmptyInput)));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(!log.exists());
    }

    #[test]
    fn test_is_blank() {
        assert!(is_blank(""));
        assert!(is_blank("\u{1c}\u{1d}\u{1e}\u{1f}\u{85}\u{a0}"));
        assert!(!is_blank(" a "));
        assert!(!is_blank("\u{1b}"));
    }

    #[test]
    fn test_log_failure_still_returns_predictions() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, b"x").unwrap();
        let (uc, _) = use_case(InteractionLog::new(blocker.join("log.csv")));

        let out = uc.analyze("Aspirin").unwrap();
        assert_eq!(out.predictions.len(), 2);
        assert!(out.log_download.is_none());
        assert!(out.log_error.unwrap().starts_with("Log saving error:"));
    }

    #[test]
    fn test_inference_failure_is_not_logged() {
        let dir = TempDir::new().unwrap();
        let log = InteractionLog::new(dir.path().join("log.csv"));
        let uc = AnalyzeUseCase::new(Box::new(BrokenClassifier), log.clone());

        let err = uc.analyze("Aspirin").unwrap_err();
        assert!(matches!(err, AnalyzeError::Inference(_)));
        assert!(err.to_string().contains("model exploded"));
        assert!(!log.exists());
    }

    #[test]
    fn test_clear_log_leaves_header_only() {
        let dir = TempDir::new().unwrap();
        let (uc, _) = use_case(InteractionLog::new(dir.path().join("log.csv")));
        uc.analyze("one").unwrap();
        uc.analyze("two").unwrap();
        assert_eq!(uc.log_records().unwrap().len(), 2);

        uc.clear_log().unwrap();
        assert_eq!(uc.read_log().unwrap(), "timestamp,user_input,predictions\r\n");
        assert!(uc.log_records().unwrap().is_empty());
    }

    #[test]
    fn test_default_config() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.log_file, PathBuf::from("interaction_logs.csv"));
        assert_eq!(cfg.ignore_labels, vec!["O"]);
        assert_eq!(cfg.fetcher().dest(), std::path::Path::new("model/pytorch_model.bin"));
    }
}
