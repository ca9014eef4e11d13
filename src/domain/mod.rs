// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain structs, enums and traits describing what the system
// talks about: predictions, log records, errors, and the
// classifier abstraction.
//
// Rules for this layer:
//   - NO burn types
//   - NO file I/O or network calls
//   - NO HTTP types

/// Raw and normalised per-token predictions
pub mod prediction;

/// Interaction log row and the predictions text format
pub mod log_record;

/// Input / log / inference error types
pub mod errors;

/// Abstractions implemented by other layers
pub mod traits;
