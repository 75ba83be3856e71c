use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use hostctl_core::config::Config;
use hostctl_deploy::{ArtifactStager, DeploymentOrchestrator, StateAuditor};
use tracing::warn;

use crate::settings;

#[derive(Args)]
pub struct DeployArgs {
    /// List the services with a staged artifact and exit without touching anything
    #[arg(long)]
    dry_run: bool,
}

pub async fn exec(config: &Config, args: DeployArgs) -> Result<ExitCode> {
    let services = config.services();
    let stager = ArtifactStager::new();

    if args.dry_run {
        let pending = stager.find_pending(&services)?;
        if pending.is_empty() {
            println!("Nothing staged.");
        }
        for service in pending {
            println!("{}: staged at {}", service.name, service.staged_path.display());
        }
        return Ok(ExitCode::SUCCESS);
    }

    let _lock = settings::acquire_run_lock(config, "deploy")?;

    let controller = super::service_controller(config);
    for (service, reason) in StateAuditor::new(stager, &controller).anomalies(&services).await {
        warn!(service = %service, "anomaly before deploy: {reason}");
        println!("{service}: WARNING {reason}");
    }

    let orchestrator =
        DeploymentOrchestrator::new(stager, super::proxy_controller(config), controller);
    let report = orchestrator.run(&services).await;

    for outcome in &report.outcomes {
        println!("{outcome}");
    }
    if let Some(err) = &report.live_restore_error {
        println!("proxy: FAILED [{}] {err}", err.kind());
    }
    println!(
        "Deployed {} of {} service(s).",
        report.deployed_count(),
        report.outcomes.len()
    );

    Ok(if report.has_failures() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
