use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::model::ProxyMode;

/// Failure of one deployment or backup unit. Each variant names the step
/// that failed so an operator can act on the summary line alone.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("cannot read staged artifact {}: {source}", path.display())]
    StageRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("staged artifact {} failed checksum: expected {expected}, got {actual}", path.display())]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("reverse proxy did not confirm {mode} mode: {reason}")]
    ProxyReload { mode: ProxyMode, reason: String },

    #[error("failed to stop {service}: {reason}")]
    ServiceStop { service: String, reason: String },

    #[error("failed to move {} onto {} (service left stopped): {source}", staged.display(), artifact.display())]
    ArtifactSwap {
        staged: PathBuf,
        artifact: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{service} did not come up on the new artifact: {reason}")]
    ServiceStart { service: String, reason: String },

    #[error("database snapshot into {} failed: {reason}", path.display())]
    Snapshot { path: PathBuf, reason: String },

    #[error("upload to {bucket}/{key} failed: {reason}")]
    Upload {
        bucket: String,
        key: String,
        reason: String,
    },

    #[error("failed to remove local snapshot {}: {source}", path.display())]
    Cleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DeployError {
    /// Stable name of the failure class, used in summaries and tests.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::StageRead { .. } => "StageReadError",
            Self::ChecksumMismatch { .. } => "ChecksumMismatch",
            Self::ProxyReload { .. } => "ProxyReloadError",
            Self::ServiceStop { .. } => "ServiceStopError",
            Self::ArtifactSwap { .. } => "ArtifactSwapError",
            Self::ServiceStart { .. } => "ServiceStartError",
            Self::Snapshot { .. } => "SnapshotError",
            Self::Upload { .. } => "UploadError",
            Self::Cleanup { .. } => "CleanupError",
        }
    }
}

/// Error reported by an external collaborator (process manager, proxy,
/// database engine, object store).
#[derive(Debug, Error)]
pub enum ExternalError {
    #[error("timed out after {}s", .0.as_secs_f32())]
    Timeout(Duration),

    #[error("{0}")]
    Failed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ExternalError {
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed(reason.into())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file \"{}\" not found", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
