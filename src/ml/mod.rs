// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All burn framework code lives here. No other layer builds
// tensors; the rest of the crate only sees the TokenClassifier
// trait and RawPrediction values.
//
//   model.rs      — BERT encoder + token-classification head
//                   • word / position / token-type embeddings
//                   • post-norm encoder blocks (MHA + GELU FFN)
//                   • linear classifier per token
//
//   inferencer.rs — tokenise → forward → softmax → per-token
//                   label and score, skipping special tokens
//
// Reference: Devlin et al. (2019) BERT

/// BERT token-classification architecture
pub mod model;

/// Inference pipeline implementing TokenClassifier
pub mod inferencer;

/// Backend used for inference
#[cfg(not(feature = "wgpu"))]
pub type InferBackend = burn::backend::NdArray;

#[cfg(feature = "wgpu")]
pub type InferBackend = burn::backend::Wgpu;
