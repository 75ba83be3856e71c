use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use hostctl_core::ExternalError;
use hostctl_core::ports::SnapshotEngine;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{ConnectOptions, Connection};

/// Online snapshot of a SQLite database through `VACUUM INTO`, which writes
/// a transactionally consistent copy while other connections keep working.
/// The source file is never created if missing.
///
/// A caller-side timeout only drops the future: the statement already handed
/// to sqlx's worker thread runs to completion, holding a read transaction on
/// the source. `busy_timeout` caps how long the engine itself waits on locks
/// so a contended database gives up on its own within the same bound.
pub struct SqliteSnapshot {
    database: PathBuf,
    busy_timeout: Duration,
}

impl SqliteSnapshot {
    pub fn new(database: PathBuf, busy_timeout: Duration) -> Self {
        Self {
            database,
            busy_timeout,
        }
    }
}

#[async_trait]
impl SnapshotEngine for SqliteSnapshot {
    async fn snapshot(&self, dest: &Path) -> Result<(), ExternalError> {
        let dest = dest.to_str().ok_or_else(|| {
            ExternalError::failed(format!("snapshot path {} is not valid UTF-8", dest.display()))
        })?;

        let mut conn = SqliteConnectOptions::new()
            .filename(&self.database)
            .busy_timeout(self.busy_timeout)
            .connect()
            .await
            .map_err(|err| {
                ExternalError::failed(format!("cannot open {}: {err}", self.database.display()))
            })?;

        let result = sqlx::query("VACUUM INTO ?")
            .bind(dest)
            .execute(&mut conn)
            .await
            .map_err(|err| ExternalError::failed(format!("VACUUM INTO failed: {err}")));
        let _ = conn.close().await;
        result?;
        Ok(())
    }
}
