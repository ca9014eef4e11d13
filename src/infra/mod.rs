// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that touches the filesystem or the network:
//
//   interaction_log.rs — Append-only CSV audit log of analyses.
//                        Append, read back, reset to header.
//
//   tokenizer_store.rs — Loads the model's WordPiece tokenizer,
//                        generating tokenizer.json from vocab.txt
//                        when the model folder has no JSON.
//
//   checkpoint.rs      — Reads config.json and loads the
//                        pretrained PyTorch weights into burn.
//
//   model_fetcher.rs   — Downloads the weights once if they
//                        are not on disk yet.

/// Interaction log store
pub mod interaction_log;

/// Tokenizer loading / generation
pub mod tokenizer_store;

/// Model config and weight loading
pub mod checkpoint;

/// One-time weight download
pub mod model_fetcher;
