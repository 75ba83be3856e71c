//! Adapters binding the collaborator traits to the host: systemd, a
//! file-swapped reverse proxy config, SQLite and S3-compatible storage.

mod command;
mod proxy;
mod s3;
mod sqlite;
mod systemd;

pub use command::{CommandError, run_checked, run_unchecked};
pub use proxy::FileSwapProxy;
pub use s3::S3Store;
pub use sqlite::SqliteSnapshot;
pub use systemd::SystemdManager;
