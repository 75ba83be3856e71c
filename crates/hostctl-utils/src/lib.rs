mod fs;
mod lock;
mod paths;

pub use fs::{remove_if_exists, write_bytes_atomic};
pub use lock::{LockGuard, acquire_lock, is_lock_contended};
pub use paths::{RuntimePaths, ensure_dir};

pub fn now_millis() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
