use std::fmt;
use std::sync::Arc;

use hostctl_core::ports::ServiceManager;
use hostctl_core::{DeployError, ExternalError, Service, ServiceStatus, Timeouts};
use tracing::{debug, info, warn};

use crate::bounded;

/// Where a service is in its stop/swap/start sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SwapStage {
    Running,
    Stopping,
    Swapped,
    Starting,
    Failed,
}

impl fmt::Display for SwapStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SwapStage::Running => "running",
            SwapStage::Stopping => "stopping",
            SwapStage::Swapped => "swapped",
            SwapStage::Starting => "starting",
            SwapStage::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Stops one service, renames its staged artifact into place and starts it again.
pub struct ServiceController {
    manager: Arc<dyn ServiceManager>,
    timeouts: Timeouts,
}

impl ServiceController {
    pub fn new(manager: Arc<dyn ServiceManager>, timeouts: Timeouts) -> Self {
        Self { manager, timeouts }
    }

    pub async fn status(&self, service: &Service) -> Result<ServiceStatus, ExternalError> {
        bounded(self.timeouts.status, self.manager.status(&service.unit)).await
    }

    pub async fn swap(&self, service: &Service) -> Result<(), DeployError> {
        let mut stage = SwapStage::Running;
        let result = self.drive(service, &mut stage).await;
        if let Err(err) = &result {
            warn!(service = %service.name, stage = %stage, "deployment failed: {err}");
        }
        result
    }

    async fn drive(&self, service: &Service, stage: &mut SwapStage) -> Result<(), DeployError> {
        let name = &service.name;

        advance(stage, SwapStage::Stopping, name);
        if let Err(err) = bounded(self.timeouts.stop, self.manager.stop(&service.unit)).await {
            *stage = SwapStage::Failed;
            return Err(DeployError::ServiceStop {
                service: name.clone(),
                reason: err.to_string(),
            });
        }

        // Rename is the commit point: on failure the old artifact is untouched
        // and the service stays stopped for an operator to inspect.
        if let Err(source) = tokio::fs::rename(&service.staged_path, &service.artifact_path).await {
            *stage = SwapStage::Failed;
            return Err(DeployError::ArtifactSwap {
                staged: service.staged_path.clone(),
                artifact: service.artifact_path.clone(),
                source,
            });
        }
        advance(stage, SwapStage::Swapped, name);
        discard_checksum(service);

        advance(stage, SwapStage::Starting, name);
        if let Err(err) = bounded(self.timeouts.start, self.manager.start(&service.unit)).await {
            *stage = SwapStage::Failed;
            return Err(DeployError::ServiceStart {
                service: name.clone(),
                reason: err.to_string(),
            });
        }
        if let Err(reason) = self.confirm_running(service).await {
            *stage = SwapStage::Failed;
            return Err(DeployError::ServiceStart {
                service: name.clone(),
                reason,
            });
        }

        advance(stage, SwapStage::Running, name);
        info!(service = %name, "deployed {}", service.artifact_path.display());
        Ok(())
    }

    /// Polls at least once, whatever `health_attempts` says.
    async fn confirm_running(&self, service: &Service) -> Result<(), String> {
        let attempts = self.timeouts.health_attempts.max(1);
        let mut last = String::from("not checked");
        for attempt in 1..=attempts {
            match self.status(service).await {
                Ok(ServiceStatus::Running) => return Ok(()),
                Ok(status) => last = format!("status was {status}"),
                Err(err) => last = format!("status query failed: {err}"),
            }
            debug!(service = %service.name, attempt, "{last}");
            if attempt < attempts {
                tokio::time::sleep(self.timeouts.health_interval).await;
            }
        }
        Err(format!("{last} after {attempts} checks"))
    }
}

fn discard_checksum(service: &Service) {
    let sidecar = service.checksum_path();
    if let Err(err) = hostctl_utils::remove_if_exists(&sidecar) {
        warn!(service = %service.name, "failed to remove {}: {err}", sidecar.display());
    }
}

fn advance(stage: &mut SwapStage, next: SwapStage, service: &str) {
    debug!(service, "{stage} -> {next}");
    *stage = next;
}
