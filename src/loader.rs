//! Fetching tabular sources from a URL or the local filesystem.

use std::fmt;
use std::io::Read;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::core::source::{self, SourceFormat, SourceRow};
use crate::error::SourceError;
use crate::workspace::Workspace;

/// Where the rows of an import come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceRequest {
    /// Published CSV, fetched with a plain GET.
    Url(String),
    /// CSV or workbook on disk.
    File(PathBuf),
}

impl SourceRequest {
    /// `http://` and `https://` inputs are URLs, anything else is a path.
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        if is_url(trimmed) {
            SourceRequest::Url(trimmed.to_string())
        } else {
            SourceRequest::File(PathBuf::from(trimmed))
        }
    }
}

impl fmt::Display for SourceRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceRequest::Url(url) => f.write_str(url),
            SourceRequest::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Decoded rows of one fetched source.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSource {
    pub format: SourceFormat,
    pub rows: Vec<SourceRow>,
}

pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Fetch and decode a source. URLs are always read as CSV text.
pub async fn fetch(request: &SourceRequest) -> Result<LoadedSource, SourceError> {
    match request {
        SourceRequest::Url(url) => {
            let bytes = fetch_url(url).await?;
            let text = String::from_utf8_lossy(&bytes);
            Ok(LoadedSource {
                format: SourceFormat::Csv,
                rows: source::parse_csv(&text),
            })
        }
        SourceRequest::File(path) => {
            let bytes = tokio::fs::read(path)
                .await
                .map_err(|source| SourceError::Io {
                    path: path.clone(),
                    source,
                })?;
            let format = SourceFormat::detect(Some(path), &bytes);
            debug!(path = %path.display(), ?format, bytes = bytes.len(), "read source file");
            Ok(LoadedSource {
                format,
                rows: source::parse(format, &bytes)?,
            })
        }
    }
}

/// GET `url` on the blocking pool and return the body.
pub async fn fetch_url(url: &str) -> Result<Vec<u8>, SourceError> {
    let owned = url.to_string();
    tokio::task::spawn_blocking(move || get_blocking(&owned))
        .await
        .map_err(|err| SourceError::Task(err.to_string()))?
}

/// Blocking GET used by [`fetch_url`] and by renderers loading remote images.
pub fn get_blocking(url: &str) -> Result<Vec<u8>, SourceError> {
    let http_error = |message: String| SourceError::Http {
        url: url.to_string(),
        message,
    };
    let response = ureq::get(url)
        .call()
        .map_err(|err| http_error(err.to_string()))?;
    let mut bytes = Vec::new();
    response
        .into_reader()
        .read_to_end(&mut bytes)
        .map_err(|err| http_error(format!("failed to read response: {err}")))?;
    Ok(bytes)
}

/// Load `request` into the workspace's candidate list.
///
/// A failure is logged and leaves the candidate list empty; the working set
/// is never touched. Returns whether the candidates were replaced.
pub async fn load_into(workspace: &mut Workspace, request: &SourceRequest) -> bool {
    let ticket = workspace.begin_load();
    info!(source = %request, variant = %ticket.variant(), "loading source");
    match fetch(request).await {
        Ok(loaded) => workspace.complete_load(ticket, loaded.rows),
        Err(err) => {
            workspace.fail_load(ticket, &err);
            false
        }
    }
}
