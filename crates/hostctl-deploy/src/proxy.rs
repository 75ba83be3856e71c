use std::sync::Arc;
use std::time::Duration;

use hostctl_core::ports::ReverseProxy;
use hostctl_core::{DeployError, ExternalError, ProxyMode};
use tracing::{debug, info};

use crate::bounded;

/// Switches the reverse proxy between live and maintenance routing. The
/// served mode is always read back from the proxy, never remembered here.
pub struct ProxyModeController {
    proxy: Arc<dyn ReverseProxy>,
    timeout: Duration,
}

impl ProxyModeController {
    pub fn new(proxy: Arc<dyn ReverseProxy>, timeout: Duration) -> Self {
        Self { proxy, timeout }
    }

    pub async fn current_mode(&self) -> Result<Option<ProxyMode>, ExternalError> {
        bounded(self.timeout, self.proxy.active_mode()).await
    }

    pub async fn set_mode(&self, mode: ProxyMode) -> Result<(), DeployError> {
        let fail = |reason: String| DeployError::ProxyReload { mode, reason };

        let before = self
            .current_mode()
            .await
            .map_err(|err| fail(format!("cannot read active mode: {err}")))?;
        if before == Some(mode) {
            debug!("reverse proxy already in {mode} mode");
            return Ok(());
        }

        info!("switching reverse proxy to {mode} mode");
        bounded(self.timeout, self.proxy.apply(mode))
            .await
            .map_err(|err| fail(err.to_string()))?;

        let after = self
            .current_mode()
            .await
            .map_err(|err| fail(format!("cannot confirm active mode: {err}")))?;
        if after != Some(mode) {
            return Err(fail(format!(
                "proxy reports {} after reload",
                after.map_or_else(|| "an unrecognised config".to_string(), |m| m.to_string())
            )));
        }

        info!("reverse proxy confirmed {mode} mode");
        Ok(())
    }
}
