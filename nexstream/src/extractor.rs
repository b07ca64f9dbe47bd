//! Media extraction capability
//!
//! The resolver and the search endpoint only need two things from the outside
//! world: "describe the media behind this reference" and "search for this
//! term". [`MediaExtractor`] is that seam; [`YtDlpExtractor`] implements it by
//! running the `yt-dlp` command line tool in metadata-only mode.

use crate::error::{Error, Result};
use crate::models::{MediaInfo, SearchEntry, SearchResponse};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

/// Default extractor program
pub const DEFAULT_PROGRAM: &str = "yt-dlp";

/// Format preference: best audio-only webm, else best audio-only, else best
pub const DEFAULT_FORMAT: &str = "bestaudio[ext=webm]/bestaudio/best";

/// Something able to turn a media reference into metadata and format URLs
#[async_trait]
pub trait MediaExtractor: Send + Sync {
    /// Extracts metadata for `reference` without downloading any media
    async fn extract(&self, reference: &str, format: &str) -> Result<MediaInfo>;

    /// Runs a flat search and returns at most `limit` entries
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchEntry>>;
}

/// [`MediaExtractor`] backed by the `yt-dlp` executable
#[derive(Debug, Clone)]
pub struct YtDlpExtractor {
    program: String,
}

impl Default for YtDlpExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM)
    }
}

impl YtDlpExtractor {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments for a metadata-only extraction
    fn extract_args(reference: &str, format: &str) -> Vec<String> {
        vec![
            "--dump-single-json".to_string(),
            "--no-warnings".to_string(),
            "--skip-download".to_string(),
            "--no-playlist".to_string(),
            "--format".to_string(),
            format.to_string(),
            "--".to_string(),
            reference.to_string(),
        ]
    }

    /// Arguments for a flat search query
    fn search_args(query: &str, limit: usize) -> Vec<String> {
        vec![
            "--dump-single-json".to_string(),
            "--no-warnings".to_string(),
            "--flat-playlist".to_string(),
            "--ignore-errors".to_string(),
            "--".to_string(),
            format!("ytsearch{}:{}", limit, query),
        ]
    }

    /// Runs the program and returns its stdout
    ///
    /// With `tolerate_failure`, a non-zero exit status is accepted as long as
    /// something was written on stdout (`--ignore-errors` reports partial
    /// failures that way).
    async fn run(&self, args: &[String], tolerate_failure: bool) -> Result<Vec<u8>> {
        debug!(program = %self.program, ?args, "Running extractor");

        let output = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await?;

        if output.status.success() || (tolerate_failure && !output.stdout.is_empty()) {
            return Ok(output.stdout);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let detail = stderr
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .unwrap_or("no diagnostic output")
            .trim()
            .to_string();
        Err(Error::extraction(format!("{} ({})", detail, output.status)))
    }
}

#[async_trait]
impl MediaExtractor for YtDlpExtractor {
    async fn extract(&self, reference: &str, format: &str) -> Result<MediaInfo> {
        info!(reference, format, "Extracting stream metadata");
        let stdout = self.run(&Self::extract_args(reference, format), false).await?;
        Ok(serde_json::from_slice(&stdout)?)
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchEntry>> {
        info!(query, limit, "Searching");
        let stdout = self.run(&Self::search_args(query, limit), true).await?;
        let response: SearchResponse = serde_json::from_slice(&stdout)?;
        Ok(response
            .entries
            .unwrap_or_default()
            .into_iter()
            .flatten()
            .collect())
    }
}
