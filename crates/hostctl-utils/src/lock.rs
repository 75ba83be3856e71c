use fs2::FileExt;
use std::{fs::File, fs::OpenOptions, path::Path};

/// Holds an exclusive advisory lock until dropped.
pub struct LockGuard {
    _file: File,
}

/// Fails with `ErrorKind::WouldBlock` if another process holds the lock.
pub fn acquire_lock(path: &Path) -> std::io::Result<LockGuard> {
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .read(true)
        .write(true)
        .open(path)?;

    file.try_lock_exclusive()?;
    Ok(LockGuard { _file: file })
}

pub fn is_lock_contended(err: &std::io::Error) -> bool {
    err.kind() == fs2::lock_contended_error().kind()
}
