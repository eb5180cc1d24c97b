//! Process runtime

use tracing::info;
use vaultadm_config::AppConfig;
use vaultadm_telemetry::{init_tracing, init_tracing_json};

/// Directory configuration is loaded from unless `VAULTADM_CONFIG_DIR` is set
pub const DEFAULT_CONFIG_DIR: &str = "config";

pub fn config_dir() -> String {
    std::env::var("VAULTADM_CONFIG_DIR").unwrap_or_else(|_| DEFAULT_CONFIG_DIR.to_string())
}

/// Initialize logging for the process
pub fn init_runtime(config: &AppConfig) {
    if config.is_production() {
        init_tracing_json(&config.telemetry.log_level);
    } else {
        init_tracing(&config.telemetry.log_level);
    }

    info!(
        app_name = %config.app_name,
        app_env = %config.app_env,
        "Runtime initialized"
    );
}
