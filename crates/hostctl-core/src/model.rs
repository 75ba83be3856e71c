use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::DeployError;

/// Suffix appended to an artifact path to locate its staged replacement.
pub const STAGED_SUFFIX: &str = "new";

/// Suffix appended to a staged path to locate its optional SHA-256 sidecar.
pub const CHECKSUM_SUFFIX: &str = "sha256";

/// A named OS-level process unit and the artifact it runs from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Service {
    pub name: String,
    /// Unit name handed to the process manager.
    pub unit: String,
    pub artifact_path: PathBuf,
    pub staged_path: PathBuf,
    pub requires_proxy_maintenance: bool,
}

impl Service {
    pub fn new(
        name: impl Into<String>,
        artifact_path: impl Into<PathBuf>,
        requires_proxy_maintenance: bool,
    ) -> Self {
        let name = name.into();
        let artifact_path = artifact_path.into();
        Self {
            unit: name.clone(),
            staged_path: staged_path_for(&artifact_path),
            name,
            artifact_path,
            requires_proxy_maintenance,
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    pub fn checksum_path(&self) -> PathBuf {
        append_suffix(&self.staged_path, CHECKSUM_SUFFIX)
    }
}

pub fn staged_path_for(artifact_path: &Path) -> PathBuf {
    append_suffix(artifact_path, STAGED_SUFFIX)
}

fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut raw = path.as_os_str().to_owned();
    raw.push(".");
    raw.push(suffix);
    PathBuf::from(raw)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProxyMode {
    Live,
    Maintenance,
}

impl fmt::Display for ProxyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyMode::Live => f.write_str("live"),
            ProxyMode::Maintenance => f.write_str("maintenance"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceStatus {
    Running,
    Stopped,
    Unknown,
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceStatus::Running => f.write_str("running"),
            ServiceStatus::Stopped => f.write_str("stopped"),
            ServiceStatus::Unknown => f.write_str("unknown"),
        }
    }
}

/// Upper bounds for every blocking call made against a collaborator.
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    pub stop: Duration,
    pub start: Duration,
    pub status: Duration,
    pub reload: Duration,
    pub snapshot: Duration,
    pub upload: Duration,
    /// Status polls after a start before the service counts as not running.
    pub health_attempts: u32,
    pub health_interval: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            stop: Duration::from_secs(30),
            start: Duration::from_secs(30),
            status: Duration::from_secs(10),
            reload: Duration::from_secs(15),
            snapshot: Duration::from_secs(300),
            upload: Duration::from_secs(600),
            health_attempts: 5,
            health_interval: Duration::from_secs(1),
        }
    }
}

#[derive(Debug)]
pub enum Outcome {
    /// No staged artifact was waiting.
    Skipped,
    Succeeded,
    Failed(DeployError),
}

/// Terminal result of one service's deployment attempt in a run.
#[derive(Debug)]
pub struct DeploymentOutcome {
    pub service: String,
    pub outcome: Outcome,
}

impl DeploymentOutcome {
    pub fn new(service: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            service: service.into(),
            outcome,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, Outcome::Failed(_))
    }

    pub fn error(&self) -> Option<&DeployError> {
        match &self.outcome {
            Outcome::Failed(err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for DeploymentOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            Outcome::Skipped => write!(f, "{}: skipped (no staged artifact)", self.service),
            Outcome::Succeeded => write!(f, "{}: deployed", self.service),
            Outcome::Failed(err) => write!(f, "{}: FAILED [{}] {}", self.service, err.kind(), err),
        }
    }
}
