use hostctl_core::{Service, ServiceStatus};

use crate::service::ServiceController;
use crate::stager::ArtifactStager;

/// Observed state of one service outside of a deployment.
#[derive(Debug)]
pub struct ServiceState {
    pub service: String,
    pub pending: Result<bool, String>,
    pub status: Result<ServiceStatus, String>,
}

impl ServiceState {
    /// A service that is not running while nothing is staged for it was most
    /// likely left behind by an interrupted or failed run.
    pub fn anomaly(&self) -> Option<String> {
        match (&self.pending, &self.status) {
            (Err(err), _) => Some(format!("cannot inspect staging area: {err}")),
            (Ok(false), Ok(ServiceStatus::Stopped)) => {
                Some("stopped with no staged artifact pending".to_string())
            }
            (Ok(false), Ok(ServiceStatus::Unknown)) => {
                Some("state unknown with no staged artifact pending".to_string())
            }
            (_, Err(err)) => Some(format!("status query failed: {err}")),
            _ => None,
        }
    }
}

/// Reports inconsistencies between the staging area and what the process
/// manager says is running. Never corrects anything.
pub struct StateAuditor<'a> {
    stager: ArtifactStager,
    services: &'a ServiceController,
}

impl<'a> StateAuditor<'a> {
    pub fn new(stager: ArtifactStager, services: &'a ServiceController) -> Self {
        Self { stager, services }
    }

    pub async fn inspect(&self, services: &[Service]) -> Vec<ServiceState> {
        let mut states = Vec::with_capacity(services.len());
        for service in services {
            let pending = self.stager.is_pending(service).map_err(|err| err.to_string());
            let status = self.services.status(service).await.map_err(|err| err.to_string());
            states.push(ServiceState {
                service: service.name.clone(),
                pending,
                status,
            });
        }
        states
    }

    pub async fn anomalies(&self, services: &[Service]) -> Vec<(String, String)> {
        self.inspect(services)
            .await
            .into_iter()
            .filter_map(|state| state.anomaly().map(|reason| (state.service, reason)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeManager, fast_timeouts, journal, unique_temp_dir};
    use std::fs;
    use std::sync::Arc;

    #[tokio::test]
    async fn stopped_service_without_staged_artifact_is_flagged() {
        let dir = unique_temp_dir("audit");
        let site = Service::new("site", dir.join("site"), true);
        let tasks = Service::new("tasks", dir.join("tasks"), false);
        let bot = Service::new("bot", dir.join("bot"), false);
        fs::write(&tasks.staged_path, b"v2").expect("stage tasks");

        let log = journal();
        let manager = FakeManager::new(&log)
            .with_status("site", ServiceStatus::Stopped)
            .with_status("tasks", ServiceStatus::Stopped);
        let controller = ServiceController::new(Arc::new(manager), fast_timeouts());
        let auditor = StateAuditor::new(ArtifactStager::new(), &controller);

        let anomalies = auditor.anomalies(&[site, tasks, bot]).await;
        assert_eq!(
            anomalies,
            vec![(
                "site".to_string(),
                "stopped with no staged artifact pending".to_string()
            )]
        );
        let _ = fs::remove_dir_all(dir);
    }
}
