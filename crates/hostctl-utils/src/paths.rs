use std::path::{Path, PathBuf};

/// Directory holding the run locks. Every caller on the host must agree on
/// it, so it is never derived from per-user environment variables.
pub struct RuntimePaths {
    pub runtime_dir: PathBuf,
}

impl RuntimePaths {
    pub fn new(runtime_dir: impl Into<PathBuf>) -> Self {
        Self {
            runtime_dir: runtime_dir.into(),
        }
    }

    /// Lock file guarding one kind of run (`deploy`, `backup`).
    pub fn lock_path(&self, run: &str) -> PathBuf {
        self.runtime_dir.join(format!("{run}.lock"))
    }
}

pub fn ensure_dir(p: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(p)
}
