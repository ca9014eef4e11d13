// ============================================================
// Layer 6 — Model Artifact Fetcher
// ============================================================
// One-time "download if missing" step for the model weights.
//
//   weights present  → nothing happens
//   weights missing  → GET url → <file>.part → rename to <file>
//
// An interrupted download never leaves a truncated
// pytorch_model.bin behind.

use anyhow::{bail, Context, Result};
use std::{
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
    time::Duration,
};

/// Default location of the fine-tuned token-classification weights.
pub const DEFAULT_WEIGHTS_URL: &str =
    "https://drive.google.com/uc?export=download&confirm=t&id=1M-i8hQOt9JMICttv2eFYXFqbaJorcuIJ";

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// What `ensure_present` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    AlreadyPresent,
    Downloaded { bytes: u64 },
}

pub struct ModelFetcher {
    url:  String,
    dest: PathBuf,
}

impl ModelFetcher {
    pub fn new(url: impl Into<String>, dest: impl Into<PathBuf>) -> Self {
        Self { url: url.into(), dest: dest.into() }
    }

    pub fn dest(&self) -> &Path {
        &self.dest
    }

    /// Make sure the artifact exists locally, downloading it if not.
    pub fn ensure_present(&self) -> Result<FetchOutcome> {
        if self.dest.is_file() {
            tracing::info!("Model already exists at '{}'. Skipping download.", self.dest.display());
            return Ok(FetchOutcome::AlreadyPresent);
        }

        if let Some(parent) = self.dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Cannot create model directory '{}'", parent.display()))?;
        }

        tracing::info!("Downloading model from {} ...", self.url);
        let bytes = self.download()?;
        tracing::info!("Download complete: {} bytes written to '{}'", bytes, self.dest.display());

        Ok(FetchOutcome::Downloaded { bytes })
    }

    fn download(&self) -> Result<u64> {
        let client = reqwest::blocking::Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .build()
            .context("Cannot build HTTP client")?;

        let mut response = client
            .get(&self.url)
            .send()
            .with_context(|| format!("Failed to request '{}'", self.url))?
            .error_for_status()
            .with_context(|| format!("Download of '{}' was refused", self.url))?;

        // Large Drive files answer with an HTML confirmation page instead of the file.
        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("text/html"));
        if is_html {
            bail!(
                "'{}' returned an HTML page instead of model weights; \
                 download the file manually to '{}'",
                self.url,
                self.dest.display()
            );
        }

        let part = self.part_path();
        let written = {
            let mut out = BufWriter::new(
                File::create(&part)
                    .with_context(|| format!("Cannot create '{}'", part.display()))?,
            );
            let n = io::copy(&mut response, &mut out)
                .with_context(|| format!("Download interrupted while writing '{}'", part.display()))?;
            out.flush()?;
            n
        };

        fs::rename(&part, &self.dest)
            .with_context(|| format!("Cannot move '{}' into place", part.display()))?;
        Ok(written)
    }

    fn part_path(&self) -> PathBuf {
        let mut name = self.dest.as_os_str().to_owned();
        name.push(".part");
        PathBuf::from(name)
    }
}
