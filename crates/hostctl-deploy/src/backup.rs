use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use hostctl_core::ports::{ObjectStore, SnapshotEngine};
use hostctl_core::{DeployError, Timeouts};
use tracing::{info, warn};

use crate::bounded;

/// Where the snapshot goes locally and remotely.
#[derive(Debug, Clone)]
pub struct BackupPlan {
    pub work_dir: PathBuf,
    /// File name prefix for the temporary snapshot.
    pub file_stem: String,
    pub bucket: String,
    pub key: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Snapshot,
    Upload,
    Cleanup,
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepKind::Snapshot => f.write_str("snapshot"),
            StepKind::Upload => f.write_str("upload"),
            StepKind::Cleanup => f.write_str("cleanup"),
        }
    }
}

#[derive(Debug)]
pub struct BackupStep {
    pub kind: StepKind,
    /// Human-readable detail on success.
    pub result: Result<String, DeployError>,
}

impl fmt::Display for BackupStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.result {
            Ok(detail) => write!(f, "{}: ok ({detail})", self.kind),
            Err(err) => write!(f, "{}: FAILED [{}] {err}", self.kind, err.kind()),
        }
    }
}

#[derive(Debug, Default)]
pub struct BackupReport {
    pub steps: Vec<BackupStep>,
}

impl BackupReport {
    fn push(&mut self, kind: StepKind, result: Result<String, DeployError>) {
        self.steps.push(BackupStep { kind, result });
    }

    pub fn is_success(&self) -> bool {
        self.steps.iter().all(|step| step.result.is_ok())
    }

    /// First failure, in step order.
    pub fn into_result(self) -> Result<(), DeployError> {
        match self.steps.into_iter().find_map(|step| step.result.err()) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Local snapshot file that is removed when dropped unless `remove` already
/// took care of it.
struct SnapshotFile {
    path: PathBuf,
    removed: bool,
}

impl SnapshotFile {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            removed: false,
        }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn remove(&mut self) -> io::Result<()> {
        hostctl_utils::remove_if_exists(&self.path)?;
        self.removed = true;
        Ok(())
    }
}

impl Drop for SnapshotFile {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        if let Err(err) = hostctl_utils::remove_if_exists(&self.path) {
            warn!("failed to remove snapshot {}: {err}", self.path.display());
        }
    }
}

/// Snapshots the embedded database and ships it to object storage under a
/// fixed key. The local snapshot never outlives `run`.
pub struct BackupJob {
    engine: Arc<dyn SnapshotEngine>,
    store: Arc<dyn ObjectStore>,
    plan: BackupPlan,
    timeouts: Timeouts,
}

impl BackupJob {
    pub fn new(
        engine: Arc<dyn SnapshotEngine>,
        store: Arc<dyn ObjectStore>,
        plan: BackupPlan,
        timeouts: Timeouts,
    ) -> Self {
        Self {
            engine,
            store,
            plan,
            timeouts,
        }
    }

    pub async fn run(&self) -> BackupReport {
        let mut report = BackupReport::default();
        let path = self.plan.work_dir.join(format!(
            "{}-{}.snapshot",
            self.plan.file_stem,
            hostctl_utils::now_millis()
        ));
        // guard exists before the engine writes anything, so partial files go too
        let mut snapshot = SnapshotFile::new(path);

        match self.take_snapshot(snapshot.path()).await {
            Ok(size) => {
                info!("snapshot written to {} ({size} bytes)", snapshot.path().display());
                report.push(StepKind::Snapshot, Ok(format!("{size} bytes")));
            }
            Err(err) => {
                warn!("backup aborted: {err}");
                report.push(StepKind::Snapshot, Err(err));
                report.push(StepKind::Cleanup, cleanup(&mut snapshot));
                return report;
            }
        }

        let upload = bounded(
            self.timeouts.upload,
            self.store.put(&self.plan.bucket, &self.plan.key, snapshot.path()),
        )
        .await
        .map(|()| format!("{}/{}", self.plan.bucket, self.plan.key))
        .map_err(|err| DeployError::Upload {
            bucket: self.plan.bucket.clone(),
            key: self.plan.key.clone(),
            reason: err.to_string(),
        });
        match &upload {
            Ok(target) => info!("snapshot uploaded to {target}"),
            Err(err) => warn!("{err}"),
        }
        report.push(StepKind::Upload, upload);

        report.push(StepKind::Cleanup, cleanup(&mut snapshot));
        report
    }

    async fn take_snapshot(&self, path: &Path) -> Result<u64, DeployError> {
        let fail = |reason: String| DeployError::Snapshot {
            path: path.to_path_buf(),
            reason,
        };
        tokio::fs::create_dir_all(&self.plan.work_dir)
            .await
            .map_err(|err| fail(format!("cannot create {}: {err}", self.plan.work_dir.display())))?;
        bounded(self.timeouts.snapshot, self.engine.snapshot(path))
            .await
            .map_err(|err| fail(err.to_string()))?;
        let meta = tokio::fs::metadata(path)
            .await
            .map_err(|err| fail(format!("snapshot file missing after success: {err}")))?;
        Ok(meta.len())
    }
}

fn cleanup(snapshot: &mut SnapshotFile) -> Result<String, DeployError> {
    snapshot
        .remove()
        .map(|()| format!("removed {}", snapshot.path().display()))
        .map_err(|source| DeployError::Cleanup {
            path: snapshot.path().to_path_buf(),
            source,
        })
}
