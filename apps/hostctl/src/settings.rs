use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use hostctl_core::config::{Config, DEFAULT_CONFIG_FILE_NAME};
use hostctl_utils::{LockGuard, RuntimePaths, acquire_lock, ensure_dir, is_lock_contended};
use tracing::debug;

pub fn load_config(path_override: Option<PathBuf>) -> Result<Config> {
    let path = resolve_config_path(path_override, std::env::var("HOSTCTL_CONFIG").ok());
    debug!("loading config from {}", path.display());
    Config::load_from_disk(&path).with_context(|| format!("Failed to load {}", path.display()))
}

fn resolve_config_path(path_override: Option<PathBuf>, env_value: Option<String>) -> PathBuf {
    path_override
        .or_else(|| normalize_optional(env_value).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE_NAME))
}

/// Take the exclusive lock for one kind of run, so two deploys (or two
/// backups) never overlap.
pub fn acquire_run_lock(config: &Config, run: &str) -> Result<LockGuard> {
    let paths = RuntimePaths::new(config.lock_dir());
    ensure_dir(&paths.runtime_dir).with_context(|| {
        format!("Failed to create lock directory {}", paths.runtime_dir.display())
    })?;
    lock(&paths.lock_path(run), run)
}

fn lock(path: &Path, run: &str) -> Result<LockGuard> {
    match acquire_lock(path) {
        Ok(guard) => Ok(guard),
        Err(err) if is_lock_contended(&err) => {
            bail!("another {run} is already running (lock held at {})", path.display())
        }
        Err(err) => {
            Err(err).with_context(|| format!("Failed to acquire lock {}", path.display()))
        }
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value.and_then(|val| {
        let trimmed = val.trim().to_string();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_beats_environment_beats_default() {
        assert_eq!(
            resolve_config_path(Some(PathBuf::from("/etc/hostctl.toml")), Some("env.toml".into())),
            PathBuf::from("/etc/hostctl.toml")
        );
        assert_eq!(
            resolve_config_path(None, Some(" env.toml ".into())),
            PathBuf::from("env.toml")
        );
        assert_eq!(
            resolve_config_path(None, Some("   ".into())),
            PathBuf::from(DEFAULT_CONFIG_FILE_NAME)
        );
    }

    #[test]
    fn held_lock_is_reported_as_concurrent_run() {
        let path = std::env::temp_dir().join(format!(
            "hostctl-cli-lock-{}",
            hostctl_utils::now_millis()
        ));
        let _held = lock(&path, "deploy").expect("first lock");

        let err = lock(&path, "deploy").err().expect("second lock fails");
        assert!(err.to_string().starts_with("another deploy is already running"));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn run_lock_is_shared_per_run_kind() {
        let dir = std::env::temp_dir().join(format!(
            "hostctl-cli-run-lock-{}",
            hostctl_utils::now_millis()
        ));
        let config = Config::parse(&format!(
            r#"
root = "/opt/vzdv"
lock_dir = "{}"

[proxy]
active_config = "Caddyfile"
live_config = "Caddyfile.live"
maintenance_config = "Caddyfile.maintenance"
reload_command = ["true"]
"#,
            dir.display()
        ))
        .expect("config parses");

        let _held = acquire_run_lock(&config, "deploy").expect("first deploy lock");
        assert!(dir.join("deploy.lock").exists());
        let err = acquire_run_lock(&config, "deploy").err().expect("second deploy blocked");
        assert!(err.to_string().starts_with("another deploy is already running"));
        acquire_run_lock(&config, "backup").expect("backup lock is separate");
        let _ = std::fs::remove_dir_all(dir);
    }
}
