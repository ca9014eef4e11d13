// ============================================================
// Layer 3 — Core Traits
// ============================================================
// The application layer talks to the model only through
// TokenClassifier. The burn pipeline in ml::inferencer is the
// production implementation; tests plug in fakes.

use anyhow::Result;

use crate::domain::prediction::RawPrediction;

/// Anything that can label the sub-word units of a text.
pub trait TokenClassifier: Send {
    /// Run inference, returning one entry per kept sub-word unit,
    /// left to right.
    fn classify(&self, text: &str) -> Result<Vec<RawPrediction>>;

    /// Split text into the tokenizer's sub-word strings, without
    /// special tokens. Display only.
    fn tokenize(&self, text: &str) -> Result<Vec<String>>;
}
