//! In-memory collaborators that record every call into a shared journal.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use hostctl_core::ports::{ObjectStore, ReverseProxy, ServiceManager, SnapshotEngine};
use hostctl_core::{ExternalError, ProxyMode, ServiceStatus, Timeouts};

pub type Journal = Arc<Mutex<Vec<String>>>;

pub fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(journal: &Journal) -> Vec<String> {
    journal.lock().expect("journal lock").clone()
}

pub fn unique_temp_dir(prefix: &str) -> PathBuf {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    let dir = std::env::temp_dir().join(format!("hostctl-deploy-{prefix}-{nanos}-{seq}"));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

pub fn fast_timeouts() -> Timeouts {
    use std::time::Duration;
    Timeouts {
        stop: Duration::from_millis(200),
        start: Duration::from_millis(200),
        status: Duration::from_millis(200),
        reload: Duration::from_millis(200),
        snapshot: Duration::from_millis(200),
        upload: Duration::from_millis(200),
        health_attempts: 3,
        health_interval: Duration::from_millis(5),
    }
}

fn record(journal: &Journal, entry: String) {
    journal.lock().expect("journal lock").push(entry);
}

#[derive(Default)]
pub struct FakeManager {
    journal: Journal,
    fail_stop: HashSet<String>,
    fail_start: HashSet<String>,
    hang_stop: HashSet<String>,
    unhealthy: HashSet<String>,
    statuses: Mutex<HashMap<String, ServiceStatus>>,
}

impl FakeManager {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            ..Self::default()
        }
    }

    pub fn failing_stop(mut self, unit: &str) -> Self {
        self.fail_stop.insert(unit.to_string());
        self
    }

    pub fn failing_start(mut self, unit: &str) -> Self {
        self.fail_start.insert(unit.to_string());
        self
    }

    pub fn hanging_stop(mut self, unit: &str) -> Self {
        self.hang_stop.insert(unit.to_string());
        self
    }

    /// Start succeeds but the unit never reports running.
    pub fn unhealthy(mut self, unit: &str) -> Self {
        self.unhealthy.insert(unit.to_string());
        self
    }

    pub fn with_status(self, unit: &str, status: ServiceStatus) -> Self {
        self.statuses
            .lock()
            .expect("status lock")
            .insert(unit.to_string(), status);
        self
    }

    fn set_status(&self, unit: &str, status: ServiceStatus) {
        self.statuses
            .lock()
            .expect("status lock")
            .insert(unit.to_string(), status);
    }
}

#[async_trait]
impl ServiceManager for FakeManager {
    async fn stop(&self, unit: &str) -> Result<(), ExternalError> {
        record(&self.journal, format!("stop:{unit}"));
        if self.hang_stop.contains(unit) {
            std::future::pending::<()>().await;
        }
        if self.fail_stop.contains(unit) {
            return Err(ExternalError::failed("unit refused to stop"));
        }
        self.set_status(unit, ServiceStatus::Stopped);
        Ok(())
    }

    async fn start(&self, unit: &str) -> Result<(), ExternalError> {
        record(&self.journal, format!("start:{unit}"));
        if self.fail_start.contains(unit) {
            return Err(ExternalError::failed("exit status 1"));
        }
        if !self.unhealthy.contains(unit) {
            self.set_status(unit, ServiceStatus::Running);
        }
        Ok(())
    }

    async fn status(&self, unit: &str) -> Result<ServiceStatus, ExternalError> {
        record(&self.journal, format!("status:{unit}"));
        Ok(self
            .statuses
            .lock()
            .expect("status lock")
            .get(unit)
            .copied()
            .unwrap_or(ServiceStatus::Running))
    }
}

pub struct FakeProxy {
    journal: Journal,
    mode: Mutex<Option<ProxyMode>>,
    fail_apply: HashSet<ProxyMode>,
    /// Apply reports success without changing the served mode.
    silently_ignore: bool,
}

impl FakeProxy {
    pub fn new(journal: &Journal, mode: ProxyMode) -> Self {
        Self {
            journal: journal.clone(),
            mode: Mutex::new(Some(mode)),
            fail_apply: HashSet::new(),
            silently_ignore: false,
        }
    }

    pub fn failing(mut self, mode: ProxyMode) -> Self {
        self.fail_apply.insert(mode);
        self
    }

    pub fn ignoring_applies(mut self) -> Self {
        self.silently_ignore = true;
        self
    }

    pub fn mode(&self) -> Option<ProxyMode> {
        *self.mode.lock().expect("mode lock")
    }
}

#[async_trait]
impl ReverseProxy for FakeProxy {
    async fn active_mode(&self) -> Result<Option<ProxyMode>, ExternalError> {
        Ok(self.mode())
    }

    async fn apply(&self, mode: ProxyMode) -> Result<(), ExternalError> {
        record(&self.journal, format!("proxy:{mode}"));
        if self.fail_apply.contains(&mode) {
            return Err(ExternalError::failed("reload exited with status 1"));
        }
        if !self.silently_ignore {
            *self.mode.lock().expect("mode lock") = Some(mode);
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeEngine {
    fail: bool,
    hang: bool,
}

impl FakeEngine {
    /// Writes part of a snapshot and then fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            hang: false,
        }
    }

    pub fn hanging() -> Self {
        Self {
            fail: false,
            hang: true,
        }
    }
}

#[async_trait]
impl SnapshotEngine for FakeEngine {
    async fn snapshot(&self, dest: &Path) -> Result<(), ExternalError> {
        tokio::fs::write(dest, b"SQLite format 3\0partial").await?;
        if self.hang {
            std::future::pending::<()>().await;
        }
        if self.fail {
            return Err(ExternalError::failed("database is locked"));
        }
        tokio::fs::write(dest, b"SQLite format 3\0complete").await?;
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeStore {
    fail: bool,
    pub uploads: Mutex<Vec<(String, String, Vec<u8>)>>,
}

impl FakeStore {
    pub fn failing() -> Self {
        Self {
            fail: true,
            uploads: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ObjectStore for FakeStore {
    async fn put(&self, bucket: &str, key: &str, local: &Path) -> Result<(), ExternalError> {
        let bytes = tokio::fs::read(local).await?;
        if self.fail {
            return Err(ExternalError::failed("403 Forbidden"));
        }
        self.uploads
            .lock()
            .expect("uploads lock")
            .push((bucket.to_string(), key.to_string(), bytes));
        Ok(())
    }
}
