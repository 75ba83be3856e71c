use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use hostctl_core::ports::ReverseProxy;
use hostctl_core::{ExternalError, ProxyMode};
use tracing::warn;

use crate::command::run_checked;

/// Reverse proxy whose routing is a single config file. Switching modes
/// atomically replaces that file with the live or maintenance variant and
/// runs the reload command; a failed reload puts the previous file back.
pub struct FileSwapProxy {
    active: PathBuf,
    live: PathBuf,
    maintenance: PathBuf,
    reload: Vec<String>,
}

impl FileSwapProxy {
    pub fn new(active: PathBuf, live: PathBuf, maintenance: PathBuf, reload: Vec<String>) -> Self {
        Self {
            active,
            live,
            maintenance,
            reload,
        }
    }

    fn variant(&self, mode: ProxyMode) -> &Path {
        match mode {
            ProxyMode::Live => &self.live,
            ProxyMode::Maintenance => &self.maintenance,
        }
    }

    async fn reload(&self) -> Result<(), ExternalError> {
        let (program, args) = self
            .reload
            .split_first()
            .ok_or_else(|| ExternalError::failed("reload command is empty"))?;
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        run_checked(program, &args).await?;
        Ok(())
    }
}

async fn read_optional(path: &Path) -> io::Result<Option<Vec<u8>>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err),
    }
}

async fn read_variant(path: &Path) -> Result<Vec<u8>, ExternalError> {
    tokio::fs::read(path)
        .await
        .map_err(|err| ExternalError::failed(format!("cannot read {}: {err}", path.display())))
}

#[async_trait]
impl ReverseProxy for FileSwapProxy {
    async fn active_mode(&self) -> Result<Option<ProxyMode>, ExternalError> {
        let Some(active) = read_optional(&self.active).await? else {
            return Ok(None);
        };
        let live = read_variant(&self.live).await?;
        let maintenance = read_variant(&self.maintenance).await?;
        if live == maintenance {
            return Err(ExternalError::failed(
                "live and maintenance configs are identical; mode cannot be told apart",
            ));
        }

        if active == live {
            Ok(Some(ProxyMode::Live))
        } else if active == maintenance {
            Ok(Some(ProxyMode::Maintenance))
        } else {
            Ok(None)
        }
    }

    async fn apply(&self, mode: ProxyMode) -> Result<(), ExternalError> {
        let desired = read_variant(self.variant(mode)).await?;
        let previous = read_optional(&self.active).await?;

        hostctl_utils::write_bytes_atomic(&self.active, &desired)?;

        if let Err(err) = self.reload().await {
            let restored = match &previous {
                Some(bytes) => hostctl_utils::write_bytes_atomic(&self.active, bytes),
                None => hostctl_utils::remove_if_exists(&self.active),
            };
            if let Err(restore_err) = restored {
                warn!(
                    "failed to restore {} after reload failure: {restore_err}",
                    self.active.display()
                );
            }
            return Err(err);
        }
        Ok(())
    }
}
