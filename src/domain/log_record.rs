// ============================================================
// Layer 3 — LogRecord and the predictions text format
// ============================================================
// A LogRecord is one row of the interaction log:
//
//   timestamp,user_input,predictions
//   2026-10-19 14:03:11,Aspirin helps headaches,"Aspirin (DRUG, 0.9876)"
//
// The predictions column is a single free-text field. Its format is
// owned by `render_predictions` so the in-memory PredictionToken and
// its on-disk rendering can change independently:
//
//   word1 (label1, 0.1234); word2 (label2, 0.5678)
//
// CSV quoting of the whole field (it always contains ", " once there
// is at least one prediction) is left to the csv writer.

use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};

use crate::domain::prediction::PredictionToken;

/// Column names, in file order
pub const LOG_HEADER: [&str; 3] = ["timestamp", "user_input", "predictions"];

/// strftime pattern for the timestamp column
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Separator between rendered predictions
const ENTRY_SEPARATOR: &str = "; ";

/// One logged interaction. Field order matches LOG_HEADER so the
/// csv crate can (de)serialise it positionally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub timestamp:   String,
    pub user_input:  String,
    pub predictions: String,
}

impl LogRecord {
    /// Build a record stamped with the current local time.
    pub fn now(user_input: &str, predictions: &[PredictionToken]) -> Self {
        Self::at(Local::now(), user_input, predictions)
    }

    /// Build a record stamped with an explicit time.
    pub fn at<Tz: TimeZone>(
        when:        DateTime<Tz>,
        user_input:  &str,
        predictions: &[PredictionToken],
    ) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        Self {
            timestamp:   when.format(TIMESTAMP_FORMAT).to_string(),
            user_input:  user_input.to_string(),
            predictions: render_predictions(predictions),
        }
    }

    /// The record as an ordered row, for writers that take string slices
    pub fn as_row(&self) -> [&str; 3] {
        [&self.timestamp, &self.user_input, &self.predictions]
    }
}

/// Render one prediction as `word (label, score)` with a 4-decimal score.
pub fn render_prediction(p: &PredictionToken) -> String {
    format!("{} ({}, {:.4})", p.text, p.label, p.score)
}

/// Join all predictions into the single-string log format.
/// An empty slice renders as the empty string.
pub fn render_predictions(predictions: &[PredictionToken]) -> String {
    predictions
        .iter()
        .map(render_prediction)
        .collect::<Vec<_>>()
        .join(ENTRY_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    #[test]
    fn test_render_single_prediction() {
        let p = PredictionToken::new("Aspirin", "DRUG", 0.9876);
        assert_eq!(render_predictions(&[p]), "Aspirin (DRUG, 0.9876)");
    }

    #[test]
    fn test_render_pads_score_to_four_decimals() {
        let preds = vec![
            PredictionToken::new("a", "X", 0.5),
            PredictionToken::new("b", "N/A", 0.0),
        ];
        assert_eq!(render_predictions(&preds), "a (X, 0.5000); b (N/A, 0.0000)");
    }

    #[test]
    fn test_render_empty_is_empty_string() {
        assert_eq!(render_predictions(&[]), "");
    }

    #[test]
    fn test_timestamp_format() {
        let naive = NaiveDate::from_ymd_opt(2026, 3, 9)
            .and_then(|d| d.and_hms_opt(7, 5, 1))
            .expect("valid date");
        let when = Utc.from_utc_datetime(&naive);
        let rec = LogRecord::at(when, "hi", &[]);
        assert_eq!(rec.timestamp, "2026-03-09 07:05:01");
        assert_eq!(rec.as_row(), ["2026-03-09 07:05:01", "hi", ""]);
    }
}
