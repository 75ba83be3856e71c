pub mod backup;
pub mod deploy;
pub mod status;

use std::sync::Arc;

use hostctl_core::config::Config;
use hostctl_deploy::{ProxyModeController, ServiceController};
use hostctl_exec::{FileSwapProxy, SystemdManager};

fn proxy_controller(config: &Config) -> ProxyModeController {
    let proxy = &config.proxy;
    let adapter = FileSwapProxy::new(
        config.resolve(&proxy.active_config),
        config.resolve(&proxy.live_config),
        config.resolve(&proxy.maintenance_config),
        proxy.reload_command.clone(),
    );
    ProxyModeController::new(Arc::new(adapter), config.timeouts().reload)
}

fn service_controller(config: &Config) -> ServiceController {
    ServiceController::new(Arc::new(SystemdManager::default()), config.timeouts())
}
