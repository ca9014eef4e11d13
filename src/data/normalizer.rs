// ============================================================
// Layer 4 — Result Normalizer
// ============================================================
// Turns raw pipeline output into display/log-ready tokens.
//
// Per entry (applied independently, order preserved):
//   1. text  — raw word or "[UNK]", with every "##" removed
//   2. label — raw entity or "N/A"
//   3. score — raw score or 0.0, clamped to [0, 1], rounded to 4 dp
//
// This is a total function: missing fields get defaults, an empty
// input gives an empty output, nothing is added or dropped.

use crate::domain::prediction::{PredictionToken, RawPrediction};

/// WordPiece prefix marking a fragment joined to the previous token
pub const CONTINUATION_MARKER: &str = "##";

/// Placeholder for an entry without token text
pub const UNKNOWN_TOKEN: &str = "[UNK]";

/// Placeholder for an entry without a label
pub const MISSING_LABEL: &str = "N/A";

pub struct Normalizer;

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    /// Normalise a whole pipeline result.
    pub fn normalize(&self, raw: &[RawPrediction]) -> Vec<PredictionToken> {
        raw.iter().map(|r| self.normalize_one(r)).collect()
    }

    /// Normalise a single entry.
    pub fn normalize_one(&self, raw: &RawPrediction) -> PredictionToken {
        let text = raw
            .word
            .as_deref()
            .unwrap_or(UNKNOWN_TOKEN)
            .replace(CONTINUATION_MARKER, "");

        let label = raw
            .entity
            .clone()
            .unwrap_or_else(|| MISSING_LABEL.to_string());

        let score = round4(clamp_unit(raw.score.map(f64::from).unwrap_or(0.0)));

        PredictionToken { text, label, score }
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Clamp into [0, 1]; NaN becomes 0.
fn clamp_unit(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}

/// Round half away from zero to 4 decimal places.
fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn has_at_most_four_decimals(x: f64) -> bool {
        let scaled = x * 10_000.0;
        (scaled - scaled.round()).abs() < 1e-6
    }

    #[test]
    fn test_missing_fields_get_defaults() {
        let n = Normalizer::new();
        let out = n.normalize(&[RawPrediction::default()]);
        assert_eq!(out, vec![PredictionToken::new("[UNK]", "N/A", 0.0)]);
    }

    #[test]
    fn test_strips_continuation_marker_everywhere() {
        let n = Normalizer::new();
        let raw = RawPrediction::new("##ir##in", "B-DRUG", 0.5);
        assert_eq!(n.normalize_one(&raw).text, "irin");
    }

    #[test]
    fn test_rounds_score_to_four_decimals() {
        let n = Normalizer::new();
        let raw = RawPrediction::new("aspirin", "B-DRUG", 0.987_654);
        let score = n.normalize_one(&raw).score;
        assert!((score - 0.9877).abs() < 1e-9, "got {score}");
    }

    #[test]
    fn test_clamps_out_of_range_scores() {
        let n = Normalizer::new();
        assert_eq!(n.normalize_one(&RawPrediction::new("a", "X", 1.7)).score, 1.0);
        assert_eq!(n.normalize_one(&RawPrediction::new("a", "X", -0.2)).score, 0.0);
        assert_eq!(n.normalize_one(&RawPrediction::new("a", "X", f32::NAN)).score, 0.0);
    }

    #[test]
    fn test_empty_input_gives_empty_output() {
        assert!(Normalizer::new().normalize(&[]).is_empty());
    }

    #[test]
    fn test_totality_over_mixed_entries() {
        let raw = vec![
            RawPrediction::new("as", "B-Chemical", 0.912_345),
            RawPrediction { word: Some("##pi".into()), ..RawPrediction::default() },
            RawPrediction { entity: Some("I-Chemical".into()), score: Some(0.333_33), ..RawPrediction::default() },
            RawPrediction::new("##rin", "I-Chemical", 0.999_99),
        ];
        let out = Normalizer::new().normalize(&raw);

        assert_eq!(out.len(), raw.len());
        for tok in &out {
            assert!((0.0..=1.0).contains(&tok.score));
            assert!(has_at_most_four_decimals(tok.score));
            assert!(!tok.label.is_empty());
            assert!(!tok.text.contains(CONTINUATION_MARKER));
        }
        // Order is preserved
        let texts: Vec<&str> = out.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["as", "pi", "[UNK]", "rin"]);
    }
}
