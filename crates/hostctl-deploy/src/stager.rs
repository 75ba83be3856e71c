use std::fs;
use std::io;

use hostctl_core::{DeployError, Service};
use sha2::{Digest, Sha256};

/// Detects services whose replacement artifact is waiting on disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct ArtifactStager;

impl ArtifactStager {
    pub fn new() -> Self {
        Self
    }

    /// A missing staged file is the normal "nothing to do" answer; any other
    /// filesystem error is surfaced.
    pub fn is_pending(&self, service: &Service) -> Result<bool, DeployError> {
        service
            .staged_path
            .try_exists()
            .map_err(|source| DeployError::StageRead {
                path: service.staged_path.clone(),
                source,
            })
    }

    pub fn find_pending(&self, services: &[Service]) -> Result<Vec<Service>, DeployError> {
        let mut pending = Vec::new();
        for service in services {
            if self.is_pending(service)? {
                pending.push(service.clone());
            }
        }
        Ok(pending)
    }

    /// Check the staged artifact against its `.sha256` sidecar, if one was
    /// published alongside it. No sidecar means nothing to verify.
    pub fn verify_checksum(&self, service: &Service) -> Result<(), DeployError> {
        let sidecar = service.checksum_path();
        let expected = match fs::read_to_string(&sidecar) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(source) => {
                return Err(DeployError::StageRead {
                    path: sidecar,
                    source,
                });
            }
        };
        // accept `sha256sum` output: "<digest>  <file name>"
        let expected = expected
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();

        let bytes = fs::read(&service.staged_path).map_err(|source| DeployError::StageRead {
            path: service.staged_path.clone(),
            source,
        })?;
        let actual = hex::encode(Sha256::digest(&bytes));

        if actual != expected {
            return Err(DeployError::ChecksumMismatch {
                path: service.staged_path.clone(),
                expected,
                actual,
            });
        }
        Ok(())
    }
}
