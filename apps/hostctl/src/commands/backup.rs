use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use hostctl_core::config::Config;
use hostctl_deploy::{BackupJob, BackupPlan};
use hostctl_exec::{S3Store, SqliteSnapshot};

use crate::settings;

pub async fn exec(config: &Config) -> Result<ExitCode> {
    let backup = config
        .backup
        .as_ref()
        .context("backup is not configured (add a [backup] section)")?;
    let _lock = settings::acquire_run_lock(config, "backup")?;

    let database = config.resolve(&backup.database);
    let file_stem = database
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| "database".to_string());
    let store = S3Store::from_config(backup).context("Failed to configure object store")?;

    let timeouts = config.timeouts();
    let job = BackupJob::new(
        Arc::new(SqliteSnapshot::new(database, timeouts.snapshot)),
        Arc::new(store),
        BackupPlan {
            work_dir: backup.work_dir.clone().unwrap_or_else(std::env::temp_dir),
            file_stem,
            bucket: backup.bucket.clone(),
            key: backup.key.clone(),
        },
        timeouts,
    );

    let report = job.run().await;
    for step in &report.steps {
        println!("{step}");
    }

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
