//! Seams to the external collaborators. Everything the orchestrator does to
//! the host goes through one of these traits.

use std::path::Path;

use async_trait::async_trait;

use crate::errors::ExternalError;
use crate::model::{ProxyMode, ServiceStatus};

#[async_trait]
pub trait ServiceManager: Send + Sync {
    async fn stop(&self, unit: &str) -> Result<(), ExternalError>;

    async fn start(&self, unit: &str) -> Result<(), ExternalError>;

    async fn status(&self, unit: &str) -> Result<ServiceStatus, ExternalError>;
}

#[async_trait]
pub trait ReverseProxy: Send + Sync {
    /// Mode the proxy is actually serving, read from the proxy's own state.
    /// `None` when the active configuration matches neither variant.
    async fn active_mode(&self) -> Result<Option<ProxyMode>, ExternalError>;

    /// Install the routing configuration for `mode` and reload the proxy.
    async fn apply(&self, mode: ProxyMode) -> Result<(), ExternalError>;
}

#[async_trait]
pub trait SnapshotEngine: Send + Sync {
    /// Write a consistent point-in-time copy of the live database to `dest`.
    async fn snapshot(&self, dest: &Path) -> Result<(), ExternalError>;
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload `local` under `key`, replacing any existing object.
    async fn put(&self, bucket: &str, key: &str, local: &Path) -> Result<(), ExternalError>;
}
