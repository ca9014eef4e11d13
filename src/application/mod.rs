// ============================================================
// Layer 2 — Application Layer
// ============================================================
// Use cases tie the domain, data, ml and infra layers together.
// The CLI and web layers only call into this layer.
//
//   analyze_use_case.rs — analyze / clear / read the log,
//                         plus the AppConfig they are built from

pub mod analyze_use_case;
