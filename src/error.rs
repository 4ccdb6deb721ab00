use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the install pipeline.
///
/// [`InstallerError::UnsupportedPlatform`] and [`InstallerError::Config`] are fatal for a whole run;
/// every other variant only abandons the artifact that raised it.
#[derive(Error, Debug)]
pub enum InstallerError {
    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("Could not find artifacts. Looked in:\n        {remote}\n        {}", local.display())]
    ArtifactNotFound { remote: String, local: PathBuf },

    #[error("Could not download {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Could not unzip {}: {source}", archive.display())]
    Extraction {
        archive: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not copy {} to {}: {source}", src.display(), dst.display())]
    Copy {
        src: PathBuf,
        dst: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Install state error: {0}")]
    StateStore(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, InstallerError>;

impl InstallerError {
    /// Whether the error prevents any further artifact from being installed.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::UnsupportedPlatform(_) | Self::Config(_))
    }

    pub(crate) fn extraction(archive: impl Into<PathBuf>, source: impl Into<std::io::Error>) -> Self {
        Self::Extraction {
            archive: archive.into(),
            source: source.into(),
        }
    }

    pub(crate) fn copy(src: impl Into<PathBuf>, dst: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Copy {
            src: src.into(),
            dst: dst.into(),
            source,
        }
    }
}
