// ============================================================
// Layer 6 — Interaction Log
// ============================================================
// Append-only CSV audit log of every successful analysis.
//
// File layout (UTF-8, "\r\n" line endings):
//   timestamp,user_input,predictions
//   2026-10-19 14:03:11,Aspirin helps headaches,"Aspirin (DRUG, 0.9876)"
//   ...
//
// States of the backing file:
//
//   absent ──append──▶ header-only+row ──append──▶ populated
//     │                                              │
//     └──────────────reset──▶ header-only ◀──reset───┘
//
// There is no delete operation; reset truncates and re-writes
// the header. Fields containing commas, quotes or newlines are
// quoted by the csv writer.

use std::{
    fs::{self, File, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
};

use crate::domain::{
    errors::LogError,
    log_record::{LogRecord, LOG_HEADER},
    prediction::PredictionToken,
};

/// Default file name, relative to the working directory
pub const DEFAULT_LOG_FILE: &str = "interaction_logs.csv";

/// Owns the path of the interaction log and every operation on it.
#[derive(Debug, Clone)]
pub struct InteractionLog {
    path: PathBuf,
}

impl InteractionLog {
    /// Create a handle. Nothing touches the disk until the first
    /// append or reset.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path as configured (may be relative)
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name used for downloads
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_LOG_FILE.to_string())
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Append one interaction, creating the file with its header first
    /// if needed. The row is flushed and synced before returning.
    ///
    /// Returns the absolute path of the log.
    pub fn append(
        &self,
        user_input:  &str,
        predictions: &[PredictionToken],
    ) -> Result<PathBuf, LogError> {
        self.append_record(&LogRecord::now(user_input, predictions))
    }

    /// Append a pre-built record.
    pub fn append_record(&self, record: &LogRecord) -> Result<PathBuf, LogError> {
        let is_new = !self.exists();

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| LogError::io(&self.path, e))?;

        let mut writer = row_writer(file);
        if is_new {
            writer
                .write_record(LOG_HEADER)
                .map_err(|e| LogError::csv(&self.path, e))?;
        }
        writer
            .write_record(record.as_row())
            .map_err(|e| LogError::csv(&self.path, e))?;

        self.finish(writer)?;

        tracing::debug!(
            "Logged interaction at {} ({} chars of predictions)",
            record.timestamp,
            record.predictions.len(),
        );

        fs::canonicalize(&self.path).map_err(|e| LogError::io(&self.path, e))
    }

    /// Full text of the log, header included.
    ///
    /// The log must exist: reading before the first append or reset
    /// is reported as `LogError::Missing` rather than an I/O error.
    pub fn read(&self) -> Result<String, LogError> {
        match fs::read_to_string(&self.path) {
            Ok(s) => Ok(s),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(LogError::Missing(self.path.clone()))
            }
            Err(e) => Err(LogError::io(&self.path, e)),
        }
    }

    /// Parse every data row. A missing log has no records.
    pub fn records(&self) -> Result<Vec<LogRecord>, LogError> {
        if !self.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(&self.path)
            .map_err(|e| LogError::csv(&self.path, e))?;

        reader
            .deserialize::<LogRecord>()
            .map(|row| row.map_err(|e| LogError::csv(&self.path, e)))
            .collect()
    }

    /// Discard every record, leaving only the header row.
    /// Idempotent, and creates the file if it is absent.
    pub fn reset(&self) -> Result<(), LogError> {
        let file = File::create(&self.path).map_err(|e| LogError::io(&self.path, e))?;

        let mut writer = row_writer(file);
        writer
            .write_record(LOG_HEADER)
            .map_err(|e| LogError::csv(&self.path, e))?;
        self.finish(writer)?;

        tracing::info!("Interaction log cleared: '{}'", self.path.display());
        Ok(())
    }

    /// Flush the csv buffer and push the bytes to disk.
    fn finish(&self, writer: csv::Writer<File>) -> Result<(), LogError> {
        let mut file = writer
            .into_inner()
            .map_err(|e| LogError::io(&self.path, e.into_error()))?;
        file.flush().map_err(|e| LogError::io(&self.path, e))?;
        file.sync_data().map_err(|e| LogError::io(&self.path, e))
    }
}

impl Default for InteractionLog {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_FILE)
    }
}

fn row_writer(file: File) -> csv::Writer<File> {
    csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::log_record::TIMESTAMP_FORMAT;
    use chrono::NaiveDateTime;
    use tempfile::TempDir;

    const HEADER_LINE: &str = "timestamp,user_input,predictions";

    fn log_in(dir: &TempDir) -> InteractionLog {
        InteractionLog::new(dir.path().join(DEFAULT_LOG_FILE))
    }

    fn aspirin() -> Vec<PredictionToken> {
        vec![PredictionToken::new("Aspirin", "DRUG", 0.9876)]
    }

    #[test]
    fn test_two_appends_write_one_header_and_two_rows() {
        let dir = TempDir::new().unwrap();
        let log = log_in(&dir);
        assert!(!log.exists());

        log.append("first", &[]).unwrap();
        log.append("second", &aspirin()).unwrap();

        let content = log.read().unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], HEADER_LINE);
        assert!(lines[1].ends_with(",first,"));
        assert!(lines[2].contains(",second,"));
        assert_eq!(content.matches(HEADER_LINE).count(), 1);
    }

    #[test]
    fn test_rows_end_with_crlf() {
        let dir = TempDir::new().unwrap();
        let log = log_in(&dir);
        log.append("Aspirin helps headaches", &aspirin()).unwrap();

        let content = log.read().unwrap();
        assert!(content.starts_with(&format!("{HEADER_LINE}\r\n")));
        assert!(content.ends_with(",Aspirin helps headaches,\"Aspirin (DRUG, 0.9876)\"\r\n"));
        assert_eq!(content.matches("\r\n").count(), 2);
        assert_eq!(content.matches('\n').count(), 2);
    }

    #[test]
    fn test_append_returns_absolute_path() {
        let dir = TempDir::new().unwrap();
        let log = log_in(&dir);
        let path = log.append("x", &[]).unwrap();
        assert!(path.is_absolute());
        assert!(path.ends_with(DEFAULT_LOG_FILE));
    }

    #[test]
    fn test_row_format_round_trip() {
        let dir = TempDir::new().unwrap();
        let log = log_in(&dir);
        log.append("Aspirin helps headaches", &aspirin()).unwrap();

        let content = log.read().unwrap();
        let last = content.lines().last().unwrap();
        let (ts, rest) = last.split_at(19);
        assert_eq!(rest, ",Aspirin helps headaches,\"Aspirin (DRUG, 0.9876)\"");
        assert!(NaiveDateTime::parse_from_str(ts, TIMESTAMP_FORMAT).is_ok(), "bad ts {ts}");
    }

    #[test]
    fn test_user_input_with_delimiters_is_quoted_and_parses_back() {
        let dir = TempDir::new().unwrap();
        let log = log_in(&dir);
        let input = "dose: 5mg, twice \"daily\"\nwith food";
        log.append(input, &aspirin()).unwrap();

        let records = log.records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].user_input, input);
        assert_eq!(records[0].predictions, "Aspirin (DRUG, 0.9876)");
    }

    #[test]
    fn test_reset_is_idempotent_and_creates_missing_file() {
        let dir = TempDir::new().unwrap();
        let log = log_in(&dir);

        log.reset().unwrap();
        assert_eq!(log.read().unwrap(), format!("{HEADER_LINE}\r\n"));

        log.append("something", &aspirin()).unwrap();
        log.reset().unwrap();
        log.reset().unwrap();
        assert_eq!(log.read().unwrap(), format!("{HEADER_LINE}\r\n"));
        assert!(log.records().unwrap().is_empty());
    }

    #[test]
    fn test_append_after_reset_does_not_duplicate_header() {
        let dir = TempDir::new().unwrap();
        let log = log_in(&dir);
        log.reset().unwrap();
        log.append("after", &[]).unwrap();

        let content = log.read().unwrap();
        assert_eq!(content.matches(HEADER_LINE).count(), 1);
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn test_read_missing_log_is_explicit_error() {
        let dir = TempDir::new().unwrap();
        let log = log_in(&dir);
        assert!(matches!(log.read(), Err(LogError::Missing(_))));
        assert!(log.records().unwrap().is_empty());
    }

    #[test]
    fn test_unwritable_path_reports_log_error() {
        let dir = TempDir::new().unwrap();
        // Parent "directory" is a regular file, so the log can never be created
        let blocker = dir.path().join("not_a_dir");
        fs::write(&blocker, b"x").unwrap();
        let log = InteractionLog::new(blocker.join(DEFAULT_LOG_FILE));

        let err = log.append("x", &aspirin()).unwrap_err();
        assert!(matches!(err, LogError::Io { .. }));
        assert!(err.to_string().contains("cannot access interaction log"));
        assert!(log.reset().is_err());
    }

    #[test]
    fn test_file_name_for_download() {
        assert_eq!(InteractionLog::default().file_name(), DEFAULT_LOG_FILE);
        assert_eq!(InteractionLog::new("/tmp/x/audit.csv").file_name(), "audit.csv");
    }
}
