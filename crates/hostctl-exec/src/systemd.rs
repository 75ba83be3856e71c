use async_trait::async_trait;
use hostctl_core::ports::ServiceManager;
use hostctl_core::{ExternalError, ServiceStatus};

use crate::command::{run_checked, run_unchecked};

/// Drives services through `systemctl`.
pub struct SystemdManager {
    program: String,
}

impl Default for SystemdManager {
    fn default() -> Self {
        Self::new("systemctl")
    }
}

impl SystemdManager {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl ServiceManager for SystemdManager {
    async fn stop(&self, unit: &str) -> Result<(), ExternalError> {
        run_checked(&self.program, &["stop", unit]).await?;
        Ok(())
    }

    async fn start(&self, unit: &str) -> Result<(), ExternalError> {
        run_checked(&self.program, &["start", unit]).await?;
        Ok(())
    }

    async fn status(&self, unit: &str) -> Result<ServiceStatus, ExternalError> {
        // is-active exits non-zero for anything but "active"; stdout is what counts
        let output = run_unchecked(&self.program, &["is-active", unit]).await?;
        Ok(parse_is_active(&String::from_utf8_lossy(&output.stdout)))
    }
}

fn parse_is_active(output: &str) -> ServiceStatus {
    match output.trim() {
        "active" | "reloading" => ServiceStatus::Running,
        "inactive" | "failed" => ServiceStatus::Stopped,
        _ => ServiceStatus::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_active_states_map_to_status() {
        assert_eq!(parse_is_active("active\n"), ServiceStatus::Running);
        assert_eq!(parse_is_active("inactive\n"), ServiceStatus::Stopped);
        assert_eq!(parse_is_active("failed\n"), ServiceStatus::Stopped);
        assert_eq!(parse_is_active("activating\n"), ServiceStatus::Unknown);
        assert_eq!(parse_is_active(""), ServiceStatus::Unknown);
    }

    #[tokio::test]
    async fn failing_systemctl_surfaces_as_external_error() {
        let manager = SystemdManager::new("false");
        let err = manager.stop("vzdv-site").await.expect_err("stop fails");
        assert!(err.to_string().contains("false stop vzdv-site failed"));
    }
}
