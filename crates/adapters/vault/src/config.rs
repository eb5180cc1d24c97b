//! Transport configuration for [`HttpExecutor`](crate::HttpExecutor)

use std::path::PathBuf;

/// Vault transport configuration
#[derive(Debug, Clone)]
pub struct VaultConfig {
    /// Base URL every request path is joined to, e.g. `http://localhost:8200`
    pub base_url: String,

    /// Enterprise namespace sent as `X-Vault-Namespace`
    pub namespace: Option<String>,

    /// Additional PEM root certificate to trust
    pub root_ca_cert_path: Option<PathBuf>,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8200".to_string(),
            namespace: None,
            root_ca_cert_path: None,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Builder for VaultConfig
pub struct VaultConfigBuilder {
    config: VaultConfig,
}

impl VaultConfigBuilder {
    /// Create a new builder with base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            config: VaultConfig {
                base_url: base_url.into(),
                ..Default::default()
            },
        }
    }

    /// Set namespace; an empty string leaves it unset
    pub fn with_namespace(mut self, namespace: Option<String>) -> Self {
        self.config.namespace = namespace.filter(|ns| !ns.is_empty());
        self
    }

    pub fn with_root_ca_cert(mut self, path: Option<PathBuf>) -> Self {
        self.config.root_ca_cert_path = path;
        self
    }

    /// Set request timeout
    pub fn with_request_timeout(mut self, timeout_secs: u64) -> Self {
        self.config.request_timeout_secs = timeout_secs;
        self
    }

    pub fn build(self) -> VaultConfig {
        self.config
    }
}
