// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Restores a pretrained HuggingFace token-classification model
// into the burn module tree defined in ml::model.
//
// Expected model directory:
//   model/
//     config.json         ← architecture + id2label
//     pytorch_model.bin   ← weights (fetched on first start)
//     tokenizer.json | vocab.txt
//
// Weights are read with burn-import's PyTorchFileRecorder. The
// HuggingFace parameter names are rewritten into our field names
// before the record is deserialised:
//
//   bert.embeddings.LayerNorm.*                  → embeddings.layer_norm.*
//   bert.encoder.layer.N.attention.self.query.*  → layers.N.self_attn.query.*
//   bert.encoder.layer.N.attention.output.dense  → layers.N.self_attn.output
//   bert.encoder.layer.N.attention.output.LayerNorm → layers.N.norm1
//   bert.encoder.layer.N.intermediate.dense      → layers.N.ffn_linear1
//   bert.encoder.layer.N.output.dense            → layers.N.ffn_linear2
//   bert.encoder.layer.N.output.LayerNorm        → layers.N.norm2
//   classifier.*                                 → classifier.*
//
// Unused tensors (pooler, position_ids buffer) are ignored.

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{FullPrecisionSettings, Recorder},
};
use burn_import::pytorch::{LoadArgs, PyTorchFileRecorder};
use serde::Deserialize;
use std::{collections::HashMap, fs, path::PathBuf};

use crate::ml::model::{BertTokenClassifier, BertTokenClassifierConfig, BertTokenClassifierRecord};

pub const CONFIG_FILE:  &str = "config.json";
pub const WEIGHTS_FILE: &str = "pytorch_model.bin";

/// Ordered (pattern, replacement) pairs applied to every tensor name.
pub const KEY_REMAP: [(&str, &str); 8] = [
    (r"^bert\.",                                                   ""),
    (r"^embeddings\.LayerNorm",                                    "embeddings.layer_norm"),
    (r"^encoder\.layer\.([0-9]+)\.attention\.self\.(query|key|value)", "layers.$1.self_attn.$2"),
    (r"^encoder\.layer\.([0-9]+)\.attention\.output\.dense",       "layers.$1.self_attn.output"),
    (r"^encoder\.layer\.([0-9]+)\.attention\.output\.LayerNorm",   "layers.$1.norm1"),
    (r"^encoder\.layer\.([0-9]+)\.intermediate\.dense",            "layers.$1.ffn_linear1"),
    (r"^encoder\.layer\.([0-9]+)\.output\.dense",                  "layers.$1.ffn_linear2"),
    (r"^encoder\.layer\.([0-9]+)\.output\.LayerNorm",              "layers.$1.norm2"),
];

/// The subset of a HuggingFace BERT `config.json` we need.
#[derive(Debug, Clone, Deserialize)]
pub struct HfModelConfig {
    pub vocab_size:              usize,
    pub hidden_size:             usize,
    pub num_hidden_layers:       usize,
    pub num_attention_heads:     usize,
    pub intermediate_size:       usize,
    pub max_position_embeddings: usize,
    #[serde(default = "default_type_vocab_size")]
    pub type_vocab_size:         usize,
    #[serde(default = "default_layer_norm_eps")]
    pub layer_norm_eps:          f64,
    /// Label names keyed by the stringified class index ("0", "1", ...)
    #[serde(default)]
    pub id2label:                HashMap<String, String>,
}

fn default_type_vocab_size() -> usize { 2 }
fn default_layer_norm_eps() -> f64 { 1e-12 }

impl HfModelConfig {
    /// Label names ordered by class index.
    ///
    /// Fails if the indices are not exactly 0..n.
    pub fn labels(&self) -> Result<Vec<String>> {
        let mut labels = vec![None; self.id2label.len()];
        for (id, name) in &self.id2label {
            let idx: usize = id
                .parse()
                .with_context(|| format!("id2label key '{id}' is not an integer"))?;
            let slot = labels
                .get_mut(idx)
                .with_context(|| format!("id2label index {idx} out of range"))?;
            *slot = Some(name.clone());
        }
        labels
            .into_iter()
            .enumerate()
            .map(|(i, l)| l.with_context(|| format!("id2label has no entry for {i}")))
            .collect()
    }

    /// Build the burn module config for `num_labels` classes.
    pub fn to_model_config(&self, num_labels: usize) -> BertTokenClassifierConfig {
        BertTokenClassifierConfig::new(
            self.vocab_size,
            self.hidden_size,
            self.num_hidden_layers,
            self.num_attention_heads,
            self.intermediate_size,
            self.max_position_embeddings,
            num_labels,
        )
        .with_type_vocab_size(self.type_vocab_size)
        .with_layer_norm_eps(self.layer_norm_eps)
    }
}

/// Reads model configuration and weights from one directory.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn weights_path(&self) -> PathBuf {
        self.dir.join(WEIGHTS_FILE)
    }

    /// Load and parse `config.json`.
    pub fn load_config(&self) -> Result<HfModelConfig> {
        let path = self.dir.join(CONFIG_FILE);

        let json = fs::read_to_string(&path)
            .with_context(|| {
                format!("Cannot read model config from '{}'", path.display())
            })?;

        serde_json::from_str(&json)
            .with_context(|| format!("Invalid model config '{}'", path.display()))
    }

    /// Build the model described by `config.json` and load the
    /// pretrained weights into it. Returns the model and its labels.
    pub fn load_model<B: Backend>(
        &self,
        device: &B::Device,
    ) -> Result<(BertTokenClassifier<B>, Vec<String>)> {
        let cfg    = self.load_config()?;
        let labels = cfg.labels()?;
        let model  = cfg.to_model_config(labels.len()).init::<B>(device);

        let path = self.weights_path();
        tracing::info!(
            "Loading {} layers / {} labels from '{}'",
            cfg.num_hidden_layers,
            labels.len(),
            path.display()
        );

        let args = KEY_REMAP
            .iter()
            .fold(LoadArgs::new(path.clone()), |args, (pattern, replacement)| {
                args.with_key_remap(pattern, replacement)
            });

        let record: BertTokenClassifierRecord<B> =
            PyTorchFileRecorder::<FullPrecisionSettings>::default()
                .load(args, device)
                .with_context(|| {
                    format!("Cannot load weights '{}'. Run `token-lens fetch` first?", path.display())
                })?;

        Ok((model.load_record(record), labels))
    }
}
