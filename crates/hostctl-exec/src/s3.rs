use std::path::{Path, PathBuf};

use async_trait::async_trait;
use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use hostctl_core::ExternalError;
use hostctl_core::config::ConfigBackup;
use hostctl_core::ports::ObjectStore;
use tracing::info;

/// S3-compatible object store (AWS, Backblaze B2, MinIO, ...).
pub struct S3Store {
    client: S3Client,
}

impl S3Store {
    pub fn from_config(config: &ConfigBackup) -> Result<Self, ExternalError> {
        let access_key_id = credential(config.access_key_id_path.as_deref(), "AWS_ACCESS_KEY_ID")?;
        let secret_access_key = credential(
            config.secret_access_key_path.as_deref(),
            "AWS_SECRET_ACCESS_KEY",
        )?;

        let mut builder = aws_sdk_s3::config::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(Credentials::new(
                access_key_id,
                secret_access_key,
                None,
                None,
                "hostctl",
            ));

        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }
        if config.path_style {
            builder = builder.force_path_style(true);
        }

        info!(region = %config.region, "object store client configured");
        Ok(Self {
            client: S3Client::from_conf(builder.build()),
        })
    }
}

/// Read a credential from its configured file, falling back to the environment.
fn credential(path: Option<&Path>, env_var: &str) -> Result<String, ExternalError> {
    let value = match path {
        Some(path) => std::fs::read_to_string(path).map_err(|err| {
            ExternalError::failed(format!("cannot read credential file {}: {err}", path.display()))
        })?,
        None => std::env::var(env_var).unwrap_or_default(),
    };
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(ExternalError::failed(format!(
            "no object store credential: set {env_var} or configure a credential file"
        )));
    }
    Ok(value)
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn put(&self, bucket: &str, key: &str, local: &Path) -> Result<(), ExternalError> {
        let body = ByteStream::from_path(PathBuf::from(local)).await.map_err(|err| {
            ExternalError::failed(format!("cannot read {}: {err}", local.display()))
        })?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .send()
            .await
            .map_err(|err| ExternalError::failed(DisplayErrorContext(&err).to_string()))?;
        Ok(())
    }
}
