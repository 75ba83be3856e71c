use std::process::ExitCode;

use anyhow::Result;
use hostctl_core::config::Config;
use hostctl_deploy::{ArtifactStager, StateAuditor};

pub async fn exec(config: &Config) -> Result<ExitCode> {
    let services = config.services();

    match super::proxy_controller(config).current_mode().await {
        Ok(Some(mode)) => println!("proxy: {mode}"),
        Ok(None) => println!("proxy: unrecognised active config"),
        Err(err) => println!("proxy: unknown ({err})"),
    }

    let controller = super::service_controller(config);
    let states = StateAuditor::new(ArtifactStager::new(), &controller)
        .inspect(&services)
        .await;

    let mut anomalies = 0;
    for state in &states {
        let status = match &state.status {
            Ok(status) => status.to_string(),
            Err(err) => format!("unknown ({err})"),
        };
        let staged = match &state.pending {
            Ok(true) => "staged artifact pending",
            Ok(false) => "nothing staged",
            Err(_) => "staging area unreadable",
        };
        println!("{}: {status}, {staged}", state.service);
        if let Some(reason) = state.anomaly() {
            anomalies += 1;
            println!("{}: WARNING {reason}", state.service);
        }
    }

    Ok(if anomalies == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
