//! vaultadm-config - configuration loading

use std::collections::BTreeMap;
use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use secrecy::Secret;
use serde::Deserialize;
use thiserror::Error;

/// Prefix of environment variables that override file configuration.
///
/// Nested keys are separated by a double underscore, e.g.
/// `VAULTADM_VAULT__HOST=vault.internal`.
pub const ENV_PREFIX: &str = "VAULTADM_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    Load(#[from] figment::Error),
}

/// Secret store connection
#[derive(Debug, Clone, Deserialize)]
pub struct SecretStoreConfig {
    #[serde(default = "default_protocol")]
    pub protocol: String,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Optional path prefix appended to the base URL
    #[serde(default)]
    pub path: String,
    /// Enterprise namespace sent as `X-Vault-Namespace`
    #[serde(default)]
    pub namespace: Option<String>,
    /// PEM bundle trusted in addition to the system roots
    #[serde(default)]
    pub root_ca_cert_path: Option<PathBuf>,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Token used for authenticated operations on an already initialized store
    #[serde(default)]
    pub auth_token: Option<Secret<String>>,
}

fn default_protocol() -> String {
    "http".to_string()
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    8200
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for SecretStoreConfig {
    fn default() -> Self {
        Self {
            protocol: default_protocol(),
            host: default_host(),
            port: default_port(),
            path: String::new(),
            namespace: None,
            root_ca_cert_path: None,
            request_timeout_secs: default_request_timeout(),
            auth_token: None,
        }
    }
}

impl SecretStoreConfig {
    /// Build `protocol://host:port[/path]`
    ///
    /// A single trailing slash is stripped from `path`, so an empty path and
    /// `/` both yield the bare authority.
    pub fn build_url(&self, path: &str) -> String {
        let path = path.strip_suffix('/').unwrap_or(path);
        let separator = if path.is_empty() || path.starts_with('/') {
            ""
        } else {
            "/"
        };
        format!(
            "{}://{}:{}{}{}",
            self.protocol, self.host, self.port, separator, path
        )
    }

    /// Base URL of the configured store, including its path prefix
    pub fn base_url(&self) -> String {
        self.build_url(&self.path)
    }
}

/// Key/value engine mount
#[derive(Debug, Clone, Deserialize)]
pub struct KvEngineConfig {
    #[serde(default = "default_kv_mount")]
    pub mount_point: String,
    #[serde(default = "default_kv_version")]
    pub version: String,
}

fn default_kv_mount() -> String {
    "secret".to_string()
}

fn default_kv_version() -> String {
    "2".to_string()
}

impl Default for KvEngineConfig {
    fn default() -> Self {
        Self {
            mount_point: default_kv_mount(),
            version: default_kv_version(),
        }
    }
}

/// Consul engine mount
#[derive(Debug, Clone, Deserialize)]
pub struct ConsulEngineConfig {
    #[serde(default = "default_consul_mount")]
    pub mount_point: String,
    #[serde(default = "default_lease_ttl")]
    pub default_lease_ttl: String,
}

fn default_consul_mount() -> String {
    "consul".to_string()
}

fn default_lease_ttl() -> String {
    "1h".to_string()
}

impl Default for ConsulEngineConfig {
    fn default() -> Self {
        Self {
            mount_point: default_consul_mount(),
            default_lease_ttl: default_lease_ttl(),
        }
    }
}

/// Provisioning workflow settings
#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapConfig {
    #[serde(default = "default_secret_shares")]
    pub secret_shares: u32,
    #[serde(default = "default_secret_threshold")]
    pub secret_threshold: u32,
    /// Base64 key shares for a store that was initialized by an earlier run
    #[serde(default)]
    pub unseal_keys: Vec<Secret<String>>,
    /// Policy name -> path of the policy document
    #[serde(default)]
    pub policies: BTreeMap<String, PathBuf>,
    #[serde(default)]
    pub kv: KvEngineConfig,
    /// Consul engine is only mounted when this section is present
    #[serde(default)]
    pub consul: Option<ConsulEngineConfig>,
}

fn default_secret_shares() -> u32 {
    5
}

fn default_secret_threshold() -> u32 {
    3
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            secret_shares: default_secret_shares(),
            secret_threshold: default_secret_threshold(),
            unseal_keys: Vec::new(),
            policies: BTreeMap::new(),
            kv: KvEngineConfig::default(),
            consul: None,
        }
    }
}

/// Telemetry
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default = "default_app_env")]
    pub app_env: String,
    #[serde(default)]
    pub vault: SecretStoreConfig,
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

fn default_app_name() -> String {
    "vaultadm".to_string()
}

fn default_app_env() -> String {
    "development".to_string()
}

impl AppConfig {
    /// Load from `{config_dir}/default.toml`, `{config_dir}/{APP_ENV}.toml`
    /// and `VAULTADM_*` environment variables, later sources winning
    pub fn load(config_dir: &str) -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| default_app_env());

        let config: Self = Figment::new()
            .merge(Toml::file(format!("{}/default.toml", config_dir)))
            .merge(Toml::file(format!("{}/{}.toml", config_dir, env)))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        Ok(config)
    }

    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }
}
