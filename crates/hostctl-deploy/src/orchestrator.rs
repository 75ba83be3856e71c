use hostctl_core::{DeployError, DeploymentOutcome, Outcome, ProxyMode, Service};
use tracing::{info, warn};

use crate::proxy::ProxyModeController;
use crate::service::ServiceController;
use crate::stager::ArtifactStager;

/// Result of one `deploy` run.
#[derive(Debug, Default)]
pub struct DeploymentReport {
    /// One entry per configured service, in configuration order.
    pub outcomes: Vec<DeploymentOutcome>,
    /// Set when the proxy could not be returned to live routing after the
    /// maintenance window. Per-service outcomes are unaffected by it.
    pub live_restore_error: Option<DeployError>,
}

impl DeploymentReport {
    pub fn has_failures(&self) -> bool {
        self.live_restore_error.is_some() || self.outcomes.iter().any(DeploymentOutcome::is_failed)
    }

    pub fn deployed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.outcome, Outcome::Succeeded))
            .count()
    }
}

pub struct DeploymentOrchestrator {
    stager: ArtifactStager,
    proxy: ProxyModeController,
    services: ServiceController,
}

impl DeploymentOrchestrator {
    pub fn new(
        stager: ArtifactStager,
        proxy: ProxyModeController,
        services: ServiceController,
    ) -> Self {
        Self {
            stager,
            proxy,
            services,
        }
    }

    pub async fn run(&self, services: &[Service]) -> DeploymentReport {
        let mut slots: Vec<Option<Outcome>> = services.iter().map(|_| None).collect();
        let mut maintenance = Vec::new();
        let mut direct = Vec::new();

        for (idx, service) in services.iter().enumerate() {
            match self.stager.is_pending(service) {
                Ok(false) => slots[idx] = Some(Outcome::Skipped),
                Ok(true) => match self.stager.verify_checksum(service) {
                    Ok(()) if service.requires_proxy_maintenance => maintenance.push(idx),
                    Ok(()) => direct.push(idx),
                    Err(err) => slots[idx] = Some(Outcome::Failed(err)),
                },
                Err(err) => slots[idx] = Some(Outcome::Failed(err)),
            }
        }

        let mut report = DeploymentReport::default();
        if maintenance.is_empty() && direct.is_empty() {
            info!("no staged artifacts pending");
        }

        if !maintenance.is_empty() {
            match self.proxy.set_mode(ProxyMode::Maintenance).await {
                Ok(()) => {
                    for &idx in &maintenance {
                        slots[idx] = Some(self.swap(&services[idx]).await);
                    }
                }
                Err(err) => {
                    warn!("not deploying proxy-fronted services: {err}");
                    let reason = match &err {
                        DeployError::ProxyReload { reason, .. } => reason.clone(),
                        other => other.to_string(),
                    };
                    for &idx in &maintenance {
                        slots[idx] = Some(Outcome::Failed(DeployError::ProxyReload {
                            mode: ProxyMode::Maintenance,
                            reason: reason.clone(),
                        }));
                    }
                }
            }

            // Always close the window, whatever happened inside it.
            if let Err(err) = self.proxy.set_mode(ProxyMode::Live).await {
                warn!("reverse proxy left out of live mode: {err}");
                report.live_restore_error = Some(err);
            }
        }

        for &idx in &direct {
            slots[idx] = Some(self.swap(&services[idx]).await);
        }

        report.outcomes = services
            .iter()
            .zip(slots)
            .map(|(service, slot)| {
                DeploymentOutcome::new(service.name.clone(), slot.unwrap_or(Outcome::Skipped))
            })
            .collect();
        report
    }

    async fn swap(&self, service: &Service) -> Outcome {
        match self.services.swap(service).await {
            Ok(()) => Outcome::Succeeded,
            Err(err) => Outcome::Failed(err),
        }
    }
}
