//! Error types for the licensing module.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failure to persist the credential artifact.
#[derive(Debug, Error)]
pub enum WriteError {
    /// The process may not write the artifact location.
    #[error("permission denied writing {}", path.display())]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Any other I/O failure.
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl WriteError {
    /// Classifies an I/O error raised while writing `path`.
    pub(crate) fn from_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::PermissionDenied {
            Self::PermissionDenied { path, source }
        } else {
            Self::Io { path, source }
        }
    }

    /// True when retrying with elevated privileges may help.
    #[must_use]
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. })
    }
}

/// Failure to load the credential artifact.
#[derive(Debug, Error)]
pub enum ReadError {
    /// No artifact at the configured path.
    #[error("license file not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// The artifact exists but does not decode to a valid record.
    #[error("license file is corrupt: {0}")]
    Corrupt(String),

    /// The artifact exists but could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Failure of a single time source.
#[derive(Debug, Error)]
pub enum TimeSourceError {
    /// DNS lookup failed.
    #[error("failed to resolve {host}: {source}")]
    Resolve {
        host: String,
        #[source]
        source: io::Error,
    },

    /// DNS lookup returned no usable address.
    #[error("no address found for {0}")]
    NoAddress(String),

    /// Socket error while sending or receiving.
    #[error("socket error: {0}")]
    Io(#[from] io::Error),

    /// No reply within the allotted time.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The reply could not be decoded.
    #[error("malformed reply: {0}")]
    Malformed(String),
}

/// One failed attempt recorded by the time authority.
#[derive(Debug)]
pub struct SourceFailure {
    /// Name of the source that failed.
    pub source: String,
    /// Why it failed.
    pub error: TimeSourceError,
}

impl fmt::Display for SourceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.source, self.error)
    }
}

/// Every configured time source failed.
#[derive(Debug, Error)]
#[error("trusted time unavailable ({})", describe_failures(.failures))]
pub struct TimeUnavailable {
    /// Per-source failures, in the order they were attempted.
    pub failures: Vec<SourceFailure>,
}

fn describe_failures(failures: &[SourceFailure]) -> String {
    if failures.is_empty() {
        return "no time sources configured".to_string();
    }
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Failure to obtain key material from the issuing service.
#[derive(Debug, Error)]
pub enum IssuanceError {
    /// The service answered but refused to issue a key.
    #[error("key issuance denied: {reason}")]
    Denied { reason: String },

    /// The service could not be reached in time.
    #[error("issuing service unreachable: {0}")]
    Unreachable(String),

    /// The client could not be set up.
    #[error("issuance client error: {0}")]
    Client(String),
}

/// Licensing errors surfaced to callers.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// Writing the artifact failed.
    #[error(transparent)]
    Write(#[from] WriteError),

    /// Reading the artifact failed.
    #[error(transparent)]
    Read(#[from] ReadError),

    /// No trusted time could be obtained.
    #[error(transparent)]
    TimeUnavailable(#[from] TimeUnavailable),

    /// Remote key issuance failed.
    #[error(transparent)]
    Issuance(#[from] IssuanceError),

    /// The requested expiration cannot be stored.
    #[error("invalid expiration: {0}")]
    InvalidExpiration(String),

    /// The blocking runtime could not be started.
    #[error("runtime error: {0}")]
    Runtime(String),
}

impl LicenseError {
    /// True when the failure is a denied write that elevated privileges
    /// might resolve.
    #[must_use]
    pub fn needs_elevation(&self) -> bool {
        matches!(self, Self::Write(e) if e.is_permission_denied())
    }
}

/// Result type for license operations.
pub type LicenseResult<T> = Result<T, LicenseError>;
