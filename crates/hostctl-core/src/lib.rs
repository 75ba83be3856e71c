pub mod config;
mod errors;
pub mod model;
pub mod ports;

pub use errors::{ConfigError, DeployError, ExternalError};
pub use model::{
    DeploymentOutcome, Outcome, ProxyMode, Service, ServiceStatus, Timeouts, staged_path_for,
};
