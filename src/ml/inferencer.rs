// ============================================================
// Layer 5 — Token Classification Pipeline
// ============================================================
// text → [CLS] tokens [SEP] → BertTokenClassifier → softmax
//      → one RawPrediction per non-special token
//
// Tokens whose arg-max label is listed in `ignore_labels`
// (by default the "outside" label "O") are dropped, which is how
// a HuggingFace token-classification pipeline without aggregation
// behaves.
use anyhow::{anyhow, bail, Result};
use burn::prelude::*;
use std::path::Path;
use tokenizers::Tokenizer;

use crate::domain::{prediction::RawPrediction, traits::TokenClassifier};
use crate::infra::{checkpoint::CheckpointManager, tokenizer_store::TokenizerStore};
use crate::ml::model::BertTokenClassifier;

/// Label that means "not part of any entity"
pub const OUTSIDE_LABEL: &str = "O";

pub struct TokenClassificationPipeline<B: Backend> {
    model:         BertTokenClassifier<B>,
    tokenizer:     Tokenizer,
    labels:        Vec<String>,
    ignore_labels: Vec<String>,
    device:        B::Device,
}

impl<B: Backend> TokenClassificationPipeline<B> {
    pub fn new(
        model:     BertTokenClassifier<B>,
        tokenizer: Tokenizer,
        labels:    Vec<String>,
        device:    B::Device,
    ) -> Result<Self> {
        let num_outputs = model.classifier.weight.val().dims()[1];
        if labels.is_empty() || labels.len() != num_outputs {
            bail!(
                "Model has {} output classes but {} labels were configured",
                num_outputs,
                labels.len()
            );
        }
        Ok(Self {
            model,
            tokenizer,
            labels,
            ignore_labels: vec![OUTSIDE_LABEL.to_string()],
            device,
        })
    }

    /// Load tokenizer, config and weights from a HuggingFace model folder.
    pub fn from_dir(model_dir: impl AsRef<Path>, device: B::Device) -> Result<Self> {
        let dir = model_dir.as_ref();
        let tokenizer       = TokenizerStore::new(dir).load_or_build()?;
        let (model, labels) = CheckpointManager::new(dir).load_model::<B>(&device)?;
        tracing::info!("Model loaded from '{}' with labels {:?}", dir.display(), labels);
        Self::new(model, tokenizer, labels, device)
    }

    /// Replace the set of labels whose predictions are dropped.
    pub fn with_ignore_labels(mut self, ignore: Vec<String>) -> Self {
        self.ignore_labels = ignore;
        self
    }

    pub fn predict(&self, text: &str) -> Result<Vec<RawPrediction>> {
        let encoding = self.tokenizer.encode(text, true)
            .map_err(|e| anyhow!("Cannot tokenize input: {e}"))?;

        let ids      = encoding.get_ids();
        let tokens   = encoding.get_tokens();
        let special  = encoding.get_special_tokens_mask();
        let offsets  = encoding.get_offsets();

        let kept = kept_positions(ids.len(), self.model.max_positions());
        if kept.len() < ids.len() {
            tracing::warn!(
                "Input truncated from {} to {} tokens",
                ids.len(),
                kept.len()
            );
        }
        if kept.is_empty() {
            return Ok(Vec::new());
        }

        // Forward pass
        let input: Vec<i32> = kept.iter().map(|&i| ids[i] as i32).collect();
        let input_tensor = Tensor::<B, 1, Int>::from_ints(
            input.as_slice(), &self.device,
        ).unsqueeze::<2>();

        let logits = self.model.forward(input_tensor);
        let probs: Vec<f32> = burn::tensor::activation::softmax(logits, 2)
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|e| anyhow!("Cannot read model output: {e:?}"))?;

        let mut predictions = Vec::new();
        for (row, &pos) in probs.chunks(self.labels.len()).zip(&kept) {
            if special[pos] == 1 {
                continue;
            }
            let (best, score) = arg_max(row);
            let label = &self.labels[best];
            if self.ignore_labels.contains(label) {
                continue;
            }
            let (start, end) = offsets[pos];
            predictions.push(RawPrediction {
                word:   Some(tokens[pos].clone()),
                entity: Some(label.clone()),
                score:  Some(score),
                index:  Some(pos),
                start:  Some(start),
                end:    Some(end),
            });
        }

        tracing::debug!(
            "{} of {} tokens labelled outside {:?}",
            predictions.len(),
            kept.len(),
            self.ignore_labels
        );
        Ok(predictions)
    }
}

impl<B: Backend> TokenClassifier for TokenClassificationPipeline<B> {
    fn classify(&self, text: &str) -> Result<Vec<RawPrediction>> {
        self.predict(text)
    }

    fn tokenize(&self, text: &str) -> Result<Vec<String>> {
        let encoding = self.tokenizer.encode(text, false)
            .map_err(|e| anyhow!("Cannot tokenize input: {e}"))?;
        Ok(encoding.get_tokens().to_vec())
    }
}

/// Positions of the encoded sequence that fit into `max` slots.
/// The final token ([SEP]) is always kept when truncating.
fn kept_positions(len: usize, max: usize) -> Vec<usize> {
    if len <= max {
        return (0..len).collect();
    }
    if max == 0 {
        return Vec::new();
    }
    let mut kept: Vec<usize> = (0..max - 1).collect();
    kept.push(len - 1);
    kept
}

/// Index and value of the largest probability. Ties go to the lower index.
fn arg_max(row: &[f32]) -> (usize, f32) {
    row.iter()
        .copied()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |best, (i, p)| if p > best.1 { (i, p) } else { best })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::tokenizer_store::VOCAB_FILE;
    use crate::ml::model::BertTokenClassifierConfig;
    use burn::backend::NdArray;
    use std::fs;
    use tempfile::TempDir;

    type TestBackend = NdArray;

    const VOCAB: &str = "[PAD]\n[UNK]\n[CLS]\n[SEP]\n[MASK]\nas\n##pi\n##rin\nhelps\nhead\n##aches\n";

    fn labels() -> Vec<String> {
        vec!["O".into(), "B-DRUG".into(), "I-DRUG".into()]
    }

    fn pipeline(max_positions: usize) -> (TempDir, TokenClassificationPipeline<TestBackend>) {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(VOCAB_FILE), VOCAB).unwrap();
        let tokenizer = TokenizerStore::new(dir.path()).load_or_build().unwrap();

        let device = Default::default();
        let model = BertTokenClassifierConfig::new(32, 8, 1, 2, 16, max_positions, 3)
            .init::<TestBackend>(&device);
        let p = TokenClassificationPipeline::new(model, tokenizer, labels(), device).unwrap();
        (dir, p)
    }

    #[test]
    fn test_one_prediction_per_content_token() {
        let (_dir, p) = pipeline(16);
        let p = p.with_ignore_labels(vec![]);

        let preds = p.predict("Aspirin helps headaches").unwrap();
        let words: Vec<&str> = preds.iter().filter_map(|r| r.word.as_deref()).collect();
        assert_eq!(words, vec!["as", "##pi", "##rin", "helps", "head", "##aches"]);

        for (i, r) in preds.iter().enumerate() {
            // [CLS] sits at index 0
            assert_eq!(r.index, Some(i + 1));
            let score = r.score.unwrap();
            assert!(score > 0.0 && score <= 1.0);
            assert!(labels().contains(r.entity.as_ref().unwrap()));
        }
        assert_eq!((preds[0].start, preds[0].end), (Some(0), Some(2)));
    }

    #[test]
    fn test_ignored_labels_are_dropped() {
        let (_dir, p) = pipeline(16);
        let p = p.with_ignore_labels(labels());
        assert!(p.predict("Aspirin helps headaches").unwrap().is_empty());
    }

    #[test]
    fn test_default_ignores_outside_label() {
        let (_dir, p) = pipeline(16);
        let preds = p.predict("Aspirin helps headaches").unwrap();
        assert!(preds.iter().all(|r| r.entity.as_deref() != Some(OUTSIDE_LABEL)));
    }

    #[test]
    fn test_long_input_is_truncated_to_position_table() {
        let (_dir, p) = pipeline(4);
        let p = p.with_ignore_labels(vec![]);
        // [CLS] as ##pi [SEP] survive out of 8 positions
        let preds = p.predict("Aspirin helps headaches").unwrap();
        assert_eq!(preds.len(), 2);
    }

    #[test]
    fn test_tokenize_has_no_special_tokens() {
        let (_dir, p) = pipeline(16);
        assert_eq!(
            p.tokenize("headaches").unwrap(),
            vec!["head".to_string(), "##aches".to_string()]
        );
    }

    #[test]
    fn test_label_count_must_match_model() {
        let (_dir, p) = pipeline(16);
        let device = Default::default();
        let model = BertTokenClassifierConfig::new(32, 8, 1, 2, 16, 16, 5)
            .init::<TestBackend>(&device);
        let err = TokenClassificationPipeline::new(model, p.tokenizer.clone(), labels(), device);
        assert!(err.is_err());
    }

    #[test]
    fn test_kept_positions() {
        assert_eq!(kept_positions(3, 5), vec![0, 1, 2]);
        assert_eq!(kept_positions(6, 4), vec![0, 1, 2, 5]);
        assert!(kept_positions(6, 0).is_empty());
    }

    #[test]
    fn test_arg_max_prefers_first_on_tie() {
        assert_eq!(arg_max(&[0.2, 0.5, 0.3]), (1, 0.5));
        assert_eq!(arg_max(&[0.5, 0.5]), (0, 0.5));
    }
}
