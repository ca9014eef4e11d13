// ============================================================
// Layer 3 — Error taxonomy
// ============================================================
//   AnalyzeError::EmptyInput — user submitted blank text (warning)
//   AnalyzeError::Inference  — model/tokenizer failure (fatal for the action)
//   LogError                 — interaction log I/O failure (non-fatal on append)

use std::path::PathBuf;
use thiserror::Error;

/// Failures of the interaction log store.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("cannot access interaction log '{path}': {source}")]
    Io {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed interaction log '{path}': {source}")]
    Csv {
        path:   PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("interaction log '{0}' does not exist yet")]
    Missing(PathBuf),
}

impl LogError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv { path: path.into(), source }
    }
}

/// Failures of a single analyze action.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("Please enter some text.")]
    EmptyInput,

    #[error("inference failed: {0:#}")]
    Inference(#[source] anyhow::Error),
}
