mod audit;
mod backup;
mod orchestrator;
mod proxy;
mod service;
mod stager;

#[cfg(test)]
mod testing;

use std::future::Future;
use std::time::Duration;

use hostctl_core::ExternalError;

pub use audit::{ServiceState, StateAuditor};
pub use backup::{BackupJob, BackupPlan, BackupReport, BackupStep, StepKind};
pub use orchestrator::{DeploymentOrchestrator, DeploymentReport};
pub use proxy::ProxyModeController;
pub use service::ServiceController;
pub use stager::ArtifactStager;

/// Run a collaborator call with an upper bound. Expiry drops the future,
/// which kills any child process spawned with `kill_on_drop`.
pub(crate) async fn bounded<T, F>(limit: Duration, call: F) -> Result<T, ExternalError>
where
    F: Future<Output = Result<T, ExternalError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(ExternalError::Timeout(limit)),
    }
}
