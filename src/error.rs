use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal installation failures. Optimization problems are reported through
/// [`crate::models::OptimizeOutcome`] instead and never show up here.
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("Invalid release version: {0:?}")]
    InvalidVersion(String),

    #[error("Download failed: {status} ({url})")]
    DownloadFailed { status: u16, url: String },

    #[error("Network error while fetching {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Too many redirects while fetching {url}")]
    TooManyRedirects { url: String },

    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Binary not found in archive, expected {}", .0.display())]
    BinaryMissing(PathBuf),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl InstallError {
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        InstallError::Io {
            context: context.into(),
            source,
        }
    }
}

/// Failures of the launcher itself, before or while starting the binary
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("Refusing to launch {}: it is this launcher", .0.display())]
    SelfReference(PathBuf),

    #[error("Failed to execute {}: {source}", .path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type InstallResult<T> = Result<T, InstallError>;
