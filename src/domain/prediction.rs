// ============================================================
// Layer 3 — Prediction Domain Types
// ============================================================
// Two shapes of the same thing:
//
//   RawPrediction    — what the inference pipeline emits, one per
//                      sub-word unit. Every field is optional because
//                      the normaliser must cope with partial entries.
//
//   PredictionToken  — the cleaned, display/log-ready form produced by
//                      the normaliser (data::normalizer).
//
// Example:
//   RawPrediction   { word: "##pirin", entity: "B-DRUG", score: 0.98761 }
//   PredictionToken { text: "pirin",   label:  "B-DRUG", score: 0.9876  }

use serde::{Deserialize, Serialize};

/// One raw entry from the token-classification pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPrediction {
    /// Sub-word token as produced by the tokenizer (may carry "##")
    pub word: Option<String>,

    /// Predicted category, e.g. "B-Chemical"
    pub entity: Option<String>,

    /// Softmax probability of `entity`
    pub score: Option<f32>,

    /// Position of the token in the encoded sequence (special tokens included)
    pub index: Option<usize>,

    /// Byte offsets of the token inside the submitted text
    pub start: Option<usize>,
    pub end:   Option<usize>,
}

impl RawPrediction {
    pub fn new(word: impl Into<String>, entity: impl Into<String>, score: f32) -> Self {
        Self {
            word:   Some(word.into()),
            entity: Some(entity.into()),
            score:  Some(score),
            ..Self::default()
        }
    }
}

/// One labelled unit of input text, ready for display and logging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionToken {
    /// Surface form with continuation markers stripped
    pub text: String,

    /// Predicted category, "N/A" when the model supplied none
    pub label: String,

    /// Confidence in [0, 1], already rounded to 4 decimal places
    pub score: f64,
}

impl PredictionToken {
    pub fn new(text: impl Into<String>, label: impl Into<String>, score: f64) -> Self {
        Self {
            text:  text.into(),
            label: label.into(),
            score,
        }
    }

    /// Score formatted for the UI (2 decimal places)
    pub fn display_score(&self) -> String {
        format!("{:.2}", self.score)
    }
}
