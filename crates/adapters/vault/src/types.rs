//! Wire types of the Vault `sys/` API

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub const HEALTH_API: &str = "/v1/sys/health";
pub const INIT_API: &str = "/v1/sys/init";
pub const UNSEAL_API: &str = "/v1/sys/unseal";
pub const MOUNTS_API: &str = "/v1/sys/mounts";
pub const POLICY_API: &str = "/v1/sys/policies/acl";

/// Secret engines this client knows how to mount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecretEngine {
    #[serde(rename = "kv")]
    KeyValue,
    #[serde(rename = "consul")]
    Consul,
}

impl SecretEngine {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::KeyValue => "kv",
            Self::Consul => "consul",
        }
    }
}

impl AsRef<str> for SecretEngine {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for SecretEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InitRequest {
    pub secret_shares: u32,
    pub secret_threshold: u32,
}

/// Result of initializing the store, handed through untouched
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct InitResponse {
    pub root_token: String,
    #[serde(default)]
    pub keys: Vec<String>,
    #[serde(default)]
    pub keys_base64: Vec<String>,
}

impl fmt::Debug for InitResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InitResponse")
            .field("root_token", &"[REDACTED]")
            .field("keys", &format_args!("[{} REDACTED]", self.keys.len()))
            .field(
                "keys_base64",
                &format_args!("[{} REDACTED]", self.keys_base64.len()),
            )
            .finish()
    }
}

#[derive(Serialize)]
pub struct UnsealRequest<'a> {
    pub key: &'a str,
}

/// Seal status reported after each key share
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UnsealResponse {
    pub sealed: bool,
    /// Threshold
    #[serde(default)]
    pub t: u32,
    /// Number of shares
    #[serde(default)]
    pub n: u32,
    #[serde(default)]
    pub progress: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateAclPolicyRequest<'a> {
    pub policy: &'a str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SecretsEngineOptions {
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SecretsEngineConfig {
    pub default_lease_ttl: String,
}

/// Mount descriptor posted to `sys/mounts/<mount point>`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnableSecretsEngineRequest {
    #[serde(rename = "type")]
    pub engine: SecretEngine,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<SecretsEngineOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<SecretsEngineConfig>,
}

impl EnableSecretsEngineRequest {
    pub fn key_value(version: impl Into<String>) -> Self {
        Self {
            engine: SecretEngine::KeyValue,
            description: "key/value secret storage".to_string(),
            options: Some(SecretsEngineOptions {
                version: version.into(),
            }),
            config: None,
        }
    }

    pub fn consul(default_lease_ttl: impl Into<String>) -> Self {
        Self {
            engine: SecretEngine::Consul,
            description: "consul secret storage".to_string(),
            options: None,
            config: Some(SecretsEngineConfig {
                default_lease_ttl: default_lease_ttl.into(),
            }),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MountInfo {
    #[serde(rename = "type")]
    pub engine_type: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListSecretEnginesResponse {
    #[serde(default)]
    pub data: HashMap<String, MountInfo>,
}

impl ListSecretEnginesResponse {
    /// Mount registered at `mount_point`.
    ///
    /// Vault reports mount points with a trailing slash (`secret/`); the
    /// exact key wins, otherwise the slash-normalized form is looked up.
    pub fn mount(&self, mount_point: &str) -> Option<&MountInfo> {
        self.data
            .get(mount_point)
            .or_else(|| self.data.get(&format!("{}/", mount_point.trim_matches('/'))))
    }

    pub fn has_engine(&self, mount_point: &str, engine: &str) -> bool {
        self.mount(mount_point)
            .is_some_and(|mount| mount.engine_type == engine)
    }
}
