//! Error types shared by the library seams.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures while obtaining or decoding tabular source data.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("request to {url} failed: {message}")]
    Http { url: String, message: String },
    #[error("workbook could not be decoded: {0}")]
    Workbook(String),
    #[error("workbook has no worksheets")]
    NoSheet,
    #[error("background task failed: {0}")]
    Task(String),
}

impl From<calamine::Error> for SourceError {
    fn from(err: calamine::Error) -> Self {
        SourceError::Workbook(err.to_string())
    }
}

/// Failures while turning page descriptors into output.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("working set is empty; nothing to print")]
    EmptyWorkingSet,
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("failed to load font {path}: {message}")]
    Font { path: PathBuf, message: String },
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("failed to format document: {0}")]
    Format(#[from] std::fmt::Error),
}

/// Failures while reading or writing the settings file.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to access settings at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("settings at {path} are not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
