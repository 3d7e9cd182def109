//! Errors for POM download and resolution.
//!
//! Only malformed-input invariant violations are meant to surface as hard
//! errors from a resolution run. Per-dependency problems (download failures,
//! unresolvable versions, unresolved placeholders) are recorded as `failure`
//! data on the affected graph node instead.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PomError {
    #[error("Failed to download POM for '{gav}': {message}")]
    Download { gav: String, message: String },

    #[error("Failed to download metadata for '{group_artifact}': {message}")]
    MetadataDownload {
        group_artifact: String,
        message: String,
    },

    #[error("Failed to parse POM: {message}")]
    Parse { message: String },

    #[error("Malformed POM: {message}")]
    Malformed { message: String },

    #[error("Resolution did not converge after {restarts} restarts")]
    ResolutionLoop { restarts: usize },
}

impl PomError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Whether this error aborts a resolution run.
    ///
    /// Non-fatal errors become `failure` markers on the affected node.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Malformed { .. } | Self::ResolutionLoop { .. })
    }
}

pub type Result<T> = std::result::Result<T, PomError>;
