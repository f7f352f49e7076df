//! Error types for the fpm installer.
//!
//! Every stage of an installation returns one of these variants to its caller. The only
//! failure that is *not* surfaced here is a single candidate download failing inside the
//! acquisition cascade: that is expected and the cascade moves on to the next candidate.

use std::path::PathBuf;
use thiserror::Error;

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum InstallError {
    /// Required input is missing or malformed (e.g. no token for "latest").
    #[error("configuration error: {message}")]
    ConfigurationError { message: String },

    /// Querying the release index for the latest tag failed.
    #[error("failed to query the latest fpm release: {message}")]
    ReleaseIndexError {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),

    /// Listed for completeness with `UnsupportedPlatform`. Never produced today:
    /// `Arch::from_reported` maps every architecture, falling back to x86_64.
    #[error("unsupported architecture: {0}")]
    UnsupportedArchitecture(String),

    /// Every prebuilt artifact name was tried and none could be downloaded.
    #[error("no prebuilt fpm binary could be downloaded (tried: {})", tried.join(", "))]
    AllCandidatesFailed { tried: Vec<String> },

    #[error("building fpm from source is not possible: {reason}")]
    SourceBuildIneligible { reason: String },

    #[error("no Fortran compiler found (looked for: {}). {remediation}", searched.join(", "))]
    CompilerNotFound {
        searched: Vec<String>,
        remediation: String,
    },

    #[error("failed to download fpm source archive from {url}")]
    SourceDownloadFailed {
        url: String,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("failed to extract fpm source archive: {message}")]
    ExtractionFailed {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("fpm install script failed in {}", dir.display())]
    InstallScriptFailed {
        dir: PathBuf,
        #[source]
        source: Option<BoxedSource>,
    },

    /// Local filesystem work outside the stages above (download and install directories).
    #[error("{message}")]
    Io {
        message: String,
        #[source]
        source: BoxedSource,
    },
}

impl InstallError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            message: message.into(),
        }
    }

    pub fn io(message: impl Into<String>, source: impl Into<BoxedSource>) -> Self {
        Self::Io {
            message: message.into(),
            source: source.into(),
        }
    }
}

pub type InstallResult<T> = Result<T, InstallError>;
