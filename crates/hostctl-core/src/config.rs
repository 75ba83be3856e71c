use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::errors::ConfigError;
use crate::model::{Service, Timeouts};

/// Default place to look for the config file.
pub const DEFAULT_CONFIG_FILE_NAME: &str = "hostctl.toml";

/// Run locks live here unless `lock_dir` says otherwise.
pub const DEFAULT_LOCK_DIR: &str = "/run/hostctl";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Deployment root; relative artifact and database paths resolve against it.
    pub root: PathBuf,
    /// Directory for the run locks; relative paths resolve against `root`.
    /// Defaults to `/run/hostctl` so every caller on the host shares one lock.
    #[serde(default)]
    pub lock_dir: Option<PathBuf>,
    #[serde(default)]
    pub timeouts: ConfigTimeouts,
    pub proxy: ConfigProxy,
    #[serde(default)]
    pub services: Vec<ConfigService>,
    #[serde(default)]
    pub backup: Option<ConfigBackup>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConfigTimeouts {
    pub stop_secs: u64,
    pub start_secs: u64,
    pub status_secs: u64,
    pub reload_secs: u64,
    pub snapshot_secs: u64,
    pub upload_secs: u64,
    pub health_attempts: u32,
    pub health_interval_ms: u64,
}

impl Default for ConfigTimeouts {
    fn default() -> Self {
        let defaults = Timeouts::default();
        Self {
            stop_secs: defaults.stop.as_secs(),
            start_secs: defaults.start.as_secs(),
            status_secs: defaults.status.as_secs(),
            reload_secs: defaults.reload.as_secs(),
            snapshot_secs: defaults.snapshot.as_secs(),
            upload_secs: defaults.upload.as_secs(),
            health_attempts: defaults.health_attempts,
            health_interval_ms: defaults.health_interval.as_millis() as u64,
        }
    }
}

impl ConfigTimeouts {
    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            stop: Duration::from_secs(self.stop_secs),
            start: Duration::from_secs(self.start_secs),
            status: Duration::from_secs(self.status_secs),
            reload: Duration::from_secs(self.reload_secs),
            snapshot: Duration::from_secs(self.snapshot_secs),
            upload: Duration::from_secs(self.upload_secs),
            health_attempts: self.health_attempts,
            health_interval: Duration::from_millis(self.health_interval_ms),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfigProxy {
    /// Configuration file the proxy actually loads.
    pub active_config: PathBuf,
    pub live_config: PathBuf,
    pub maintenance_config: PathBuf,
    /// argv of the reload command, e.g. `["systemctl", "reload", "caddy"]`.
    pub reload_command: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfigService {
    pub name: String,
    #[serde(default)]
    pub unit: Option<String>,
    pub artifact: PathBuf,
    #[serde(default)]
    pub requires_proxy_maintenance: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfigBackup {
    pub database: PathBuf,
    /// Where the temporary snapshot is written; defaults to the system temp dir.
    #[serde(default)]
    pub work_dir: Option<PathBuf>,
    pub bucket: String,
    pub key: String,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub path_style: bool,
    #[serde(default)]
    pub access_key_id_path: Option<PathBuf>,
    #[serde(default)]
    pub secret_access_key_path: Option<PathBuf>,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

impl Config {
    /// Read the TOML file at the given path and validate it.
    pub fn load_from_disk(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = BTreeSet::new();
        for service in &self.services {
            if service.name.trim().is_empty() {
                return Err(invalid("service name must not be empty"));
            }
            if !seen.insert(service.name.as_str()) {
                return Err(invalid(format!("duplicate service name '{}'", service.name)));
            }
            if service.artifact.as_os_str().is_empty() {
                return Err(invalid(format!(
                    "service '{}' has an empty artifact path",
                    service.name
                )));
            }
            if service.unit.as_deref().is_some_and(|unit| unit.trim().is_empty()) {
                return Err(invalid(format!("service '{}' has an empty unit name", service.name)));
            }
        }

        if self.proxy.reload_command.is_empty() {
            return Err(invalid("proxy.reload_command must name a program"));
        }
        if self.proxy.live_config == self.proxy.maintenance_config {
            return Err(invalid("proxy live and maintenance configs must be different files"));
        }

        let t = &self.timeouts;
        let secs = [
            ("stop_secs", t.stop_secs),
            ("start_secs", t.start_secs),
            ("status_secs", t.status_secs),
            ("reload_secs", t.reload_secs),
            ("snapshot_secs", t.snapshot_secs),
            ("upload_secs", t.upload_secs),
        ];
        if let Some((name, _)) = secs.iter().find(|(_, value)| *value == 0) {
            return Err(invalid(format!("timeouts.{name} must be positive")));
        }
        if t.health_attempts == 0 {
            return Err(invalid("timeouts.health_attempts must be at least 1"));
        }

        if let Some(backup) = &self.backup {
            if backup.bucket.trim().is_empty() || backup.key.trim().is_empty() {
                return Err(invalid("backup.bucket and backup.key must not be empty"));
            }
        }

        Ok(())
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Service records in configuration order, paths resolved against `root`.
    pub fn services(&self) -> Vec<Service> {
        self.services
            .iter()
            .map(|entry| {
                let service = Service::new(
                    entry.name.clone(),
                    self.resolve(&entry.artifact),
                    entry.requires_proxy_maintenance,
                );
                match &entry.unit {
                    Some(unit) => service.with_unit(unit.trim()),
                    None => service,
                }
            })
            .collect()
    }

    pub fn timeouts(&self) -> Timeouts {
        self.timeouts.timeouts()
    }

    /// Host-wide lock directory, independent of the caller's environment.
    pub fn lock_dir(&self) -> PathBuf {
        match &self.lock_dir {
            Some(dir) => self.resolve(dir),
            None => PathBuf::from(DEFAULT_LOCK_DIR),
        }
    }
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
root = "/opt/vzdv"

[timeouts]
stop_secs = 20
health_attempts = 3

[proxy]
active_config = "/etc/caddy/Caddyfile"
live_config = "/etc/caddy/Caddyfile.live"
maintenance_config = "/etc/caddy/Caddyfile.maintenance"
reload_command = ["systemctl", "reload", "caddy"]

[[services]]
name = "vzdv-site"
artifact = "vzdv-site"
requires_proxy_maintenance = true

[[services]]
name = "vzdv-tasks"
unit = "vzdv-tasks.service"
artifact = "/usr/local/bin/vzdv-tasks"

[backup]
database = "vzdv.db"
bucket = "vzdv-backups"
key = "vzdv.db"
"#;

    #[test]
    fn parses_sample_and_resolves_paths() {
        let config = Config::parse(SAMPLE).expect("sample parses");
        let services = config.services();
        assert_eq!(services.len(), 2);

        assert_eq!(services[0].artifact_path, PathBuf::from("/opt/vzdv/vzdv-site"));
        assert_eq!(services[0].staged_path, PathBuf::from("/opt/vzdv/vzdv-site.new"));
        assert!(services[0].requires_proxy_maintenance);
        assert_eq!(services[0].unit, "vzdv-site");

        assert_eq!(services[1].artifact_path, PathBuf::from("/usr/local/bin/vzdv-tasks"));
        assert_eq!(services[1].unit, "vzdv-tasks.service");
        assert!(!services[1].requires_proxy_maintenance);

        let backup = config.backup.as_ref().expect("backup section");
        assert_eq!(config.resolve(&backup.database), PathBuf::from("/opt/vzdv/vzdv.db"));
        assert_eq!(backup.region, "us-east-1");
    }

    #[test]
    fn timeouts_fall_back_to_defaults() {
        let config = Config::parse(SAMPLE).expect("sample parses");
        let timeouts = config.timeouts();
        assert_eq!(timeouts.stop, Duration::from_secs(20));
        assert_eq!(timeouts.start, Timeouts::default().start);
        assert_eq!(timeouts.health_attempts, 3);
    }

    #[test]
    fn rejects_duplicate_service_names() {
        let text = SAMPLE.replace("name = \"vzdv-tasks\"", "name = \"vzdv-site\"");
        let err = Config::parse(&text).expect_err("duplicate names rejected");
        assert!(err.to_string().contains("duplicate service name 'vzdv-site'"));
    }

    #[test]
    fn rejects_zero_timeouts() {
        let text = SAMPLE.replace("stop_secs = 20", "stop_secs = 0");
        let err = Config::parse(&text).expect_err("zero timeout rejected");
        assert!(err.to_string().contains("timeouts.stop_secs"));
    }

    #[test]
    fn rejects_zero_health_attempts() {
        let text = SAMPLE.replace("health_attempts = 3", "health_attempts = 0");
        let err = Config::parse(&text).expect_err("zero attempts rejected");
        assert!(err.to_string().contains("timeouts.health_attempts"));
    }

    #[test]
    fn lock_dir_is_host_wide_by_default_and_resolves_against_root() {
        let config = Config::parse(SAMPLE).expect("sample parses");
        assert_eq!(config.lock_dir(), PathBuf::from(DEFAULT_LOCK_DIR));

        let text = SAMPLE.replace(
            "root = \"/opt/vzdv\"",
            "root = \"/opt/vzdv\"\nlock_dir = \"locks\"",
        );
        let config = Config::parse(&text).expect("lock_dir parses");
        assert_eq!(config.lock_dir(), PathBuf::from("/opt/vzdv/locks"));
    }

    #[test]
    fn rejects_empty_reload_command() {
        let text = SAMPLE.replace(
            "reload_command = [\"systemctl\", \"reload\", \"caddy\"]",
            "reload_command = []",
        );
        assert!(matches!(Config::parse(&text), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn missing_file_is_reported() {
        let path = std::env::temp_dir().join("hostctl-config-does-not-exist.toml");
        assert!(matches!(
            Config::load_from_disk(&path),
            Err(ConfigError::NotFound(_))
        ));
    }
}
