// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Post-processing between the model and the outside world:
//
//   TokenClassificationPipeline (ml)
//       │  Vec<RawPrediction>
//       ▼
//   Normalizer              → cleaned PredictionTokens
//       │
//       ▼
//   page / JSON / InteractionLog

/// Raw prediction → PredictionToken cleaning
pub mod normalizer;
