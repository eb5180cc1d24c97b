//! Provisioning workflow
//!
//! Brings a Vault server from whatever state it is in to initialized,
//! unsealed, with the configured policies and secret engines in place.
//! Every step runs once; the first failure aborts the run.

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use vaultadm_adapter_vault::{
    check_vault_health, Execute, InitResponse, SecretEngine, VaultClient, VaultConfig,
    VaultConfigBuilder, VaultHealthStatus,
};
use vaultadm_config::{AppConfig, ConsulEngineConfig, KvEngineConfig, SecretStoreConfig};
use vaultadm_errors::{AppError, AppResult};

/// ACL policy to install
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    pub name: String,
    pub document: String,
}

/// Everything a provisioning run needs, resolved from configuration
#[derive(Debug, Clone)]
pub struct ProvisionPlan {
    pub secret_shares: u32,
    pub secret_threshold: u32,
    /// Key shares of a store initialized by an earlier run
    pub unseal_keys: Vec<SecretString>,
    /// Token of a store initialized by an earlier run
    pub auth_token: Option<SecretString>,
    pub policies: Vec<Policy>,
    pub kv: Option<KvEngineConfig>,
    pub consul: Option<ConsulEngineConfig>,
}

impl ProvisionPlan {
    /// Resolve the plan, reading every policy document from disk
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let bootstrap = &config.bootstrap;

        let policies = bootstrap
            .policies
            .iter()
            .map(|(name, path)| {
                std::fs::read_to_string(path)
                    .map(|document| Policy {
                        name: name.clone(),
                        document,
                    })
                    .map_err(|e| {
                        AppError::not_found(format!(
                            "policy '{}' document {}: {}",
                            name,
                            path.display(),
                            e
                        ))
                    })
            })
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Self {
            secret_shares: bootstrap.secret_shares,
            secret_threshold: bootstrap.secret_threshold,
            unseal_keys: bootstrap.unseal_keys.clone(),
            auth_token: config.vault.auth_token.clone(),
            policies,
            kv: Some(bootstrap.kv.clone()),
            consul: bootstrap.consul.clone(),
        })
    }
}

/// Transport settings for the configured store
pub fn vault_config(store: &SecretStoreConfig) -> VaultConfig {
    VaultConfigBuilder::new(store.base_url())
        .with_namespace(store.namespace.clone())
        .with_root_ca_cert(store.root_ca_cert_path.clone())
        .with_request_timeout(store.request_timeout_secs)
        .build()
}

/// What a run changed
#[derive(Debug, Serialize)]
pub struct ProvisionOutcome {
    pub initial_health: VaultHealthStatus,
    /// Present only when this run initialized the store
    #[serde(skip_serializing_if = "Option::is_none")]
    pub init: Option<InitResponse>,
    pub unsealed: bool,
    pub policies_installed: Vec<String>,
    pub engines_enabled: Vec<String>,
}

/// A run that stopped part way
///
/// `init` is set when the store was initialized before the failing step.
/// Vault hands out the root token and key shares once, so the caller must
/// surface them even though the run failed.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct ProvisionFailure {
    #[source]
    pub error: AppError,
    pub init: Option<InitResponse>,
}

impl From<AppError> for ProvisionFailure {
    fn from(error: AppError) -> Self {
        Self { error, init: None }
    }
}

/// Steps completed after initialization
struct Configured {
    unsealed: bool,
    policies_installed: Vec<String>,
    engines_enabled: Vec<String>,
}

pub struct Provisioner<E> {
    client: VaultClient<E>,
    plan: ProvisionPlan,
}

impl<E: Execute> Provisioner<E> {
    pub fn new(client: VaultClient<E>, plan: ProvisionPlan) -> Self {
        Self { client, plan }
    }

    pub async fn run(&self) -> Result<ProvisionOutcome, ProvisionFailure> {
        let health = check_vault_health(&self.client)
            .await
            .map_err(AppError::from)?;
        info!(?health, "Vault state before provisioning");
        if let VaultHealthStatus::Unknown(status) = health {
            return Err(AppError::external_service(format!(
                "unexpected health status {status} from secret store"
            ))
            .into());
        }

        let init = if health.is_initialized() {
            None
        } else {
            let resp = self
                .client
                .init(self.plan.secret_shares, self.plan.secret_threshold)
                .await
                .map_err(AppError::from)?;
            info!(
                shares = resp.keys_base64.len(),
                "Secret store initialized, root token and key shares are only in this run's output"
            );
            Some(resp)
        };

        match self.configure(health, init.as_ref()).await {
            Ok(done) => Ok(ProvisionOutcome {
                initial_health: health,
                init,
                unsealed: done.unsealed,
                policies_installed: done.policies_installed,
                engines_enabled: done.engines_enabled,
            }),
            Err(error) => Err(ProvisionFailure { error, init }),
        }
    }

    async fn configure(
        &self,
        health: VaultHealthStatus,
        init: Option<&InitResponse>,
    ) -> AppResult<Configured> {
        let unsealed = if health.is_sealed() {
            self.unseal(init).await?;
            true
        } else {
            false
        };

        let token = match init {
            Some(resp) => SecretString::new(resp.root_token.clone()),
            None => self.plan.auth_token.clone().ok_or_else(|| {
                AppError::config("vault.auth_token is required for an initialized secret store")
            })?,
        };

        let mut policies_installed = Vec::with_capacity(self.plan.policies.len());
        for policy in &self.plan.policies {
            self.client
                .install_policy(&token, &policy.name, &policy.document)
                .await?;
            policies_installed.push(policy.name.clone());
        }

        let mut engines_enabled = Vec::new();
        if let Some(kv) = &self.plan.kv {
            if !self
                .client
                .check_secret_engine_installed(&token, &kv.mount_point, SecretEngine::KeyValue)
                .await?
            {
                self.client
                    .enable_kv_secret_engine(&token, &kv.mount_point, &kv.version)
                    .await?;
                engines_enabled.push(kv.mount_point.clone());
            } else {
                info!(mount_point = %kv.mount_point, "KV secret engine already installed");
            }
        }
        if let Some(consul) = &self.plan.consul {
            if !self
                .client
                .check_secret_engine_installed(&token, &consul.mount_point, SecretEngine::Consul)
                .await?
            {
                self.client
                    .enable_consul_secret_engine(
                        &token,
                        &consul.mount_point,
                        &consul.default_lease_ttl,
                    )
                    .await?;
                engines_enabled.push(consul.mount_point.clone());
            } else {
                info!(mount_point = %consul.mount_point, "Consul secret engine already installed");
            }
        }

        Ok(Configured {
            unsealed,
            policies_installed,
            engines_enabled,
        })
    }

    async fn unseal(&self, init: Option<&InitResponse>) -> AppResult<()> {
        match init {
            Some(resp) => {
                self.client.unseal(&resp.keys_base64).await?;
            }
            None => {
                if self.plan.unseal_keys.is_empty() {
                    warn!("Secret store is sealed and no unseal keys are configured");
                    return Err(AppError::failed_precondition(
                        "secret store is sealed and bootstrap.unseal_keys is empty",
                    ));
                }
                let keys: Vec<&str> = self
                    .plan
                    .unseal_keys
                    .iter()
                    .map(|key| key.expose_secret().as_str())
                    .collect();
                self.client.unseal(&keys).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_vault_config_from_store() {
        let store = SecretStoreConfig {
            protocol: "https".to_string(),
            host: "vault.internal".to_string(),
            port: 8201,
            path: "/".to_string(),
            namespace: Some("edge".to_string()),
            request_timeout_secs: 7,
            ..Default::default()
        };
        let config = vault_config(&store);
        assert_eq!(config.base_url, "https://vault.internal:8201");
        assert_eq!(config.namespace.as_deref(), Some("edge"));
        assert_eq!(config.request_timeout_secs, 7);
    }

    #[test]
    fn test_plan_reads_policy_documents() {
        let path = std::env::temp_dir().join(format!("vaultadm-policy-{}.hcl", std::process::id()));
        std::fs::write(&path, "path \"secret/*\" {}").unwrap();

        let mut config = default_config();
        config
            .bootstrap
            .policies
            .insert("reader".to_string(), path.clone());
        let plan = ProvisionPlan::from_config(&config).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(
            plan.policies,
            vec![Policy {
                name: "reader".to_string(),
                document: "path \"secret/*\" {}".to_string(),
            }]
        );
        assert_eq!(plan.kv.map(|kv| kv.mount_point), Some("secret".to_string()));
        assert!(plan.consul.is_none());
    }

    #[test]
    fn test_plan_missing_policy_file() {
        let mut config = default_config();
        config.bootstrap.policies.insert(
            "reader".to_string(),
            PathBuf::from("/nonexistent/reader.hcl"),
        );
        let err = ProvisionPlan::from_config(&config).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    fn default_config() -> AppConfig {
        AppConfig {
            app_name: "vaultadm".to_string(),
            app_env: "test".to_string(),
            vault: Default::default(),
            bootstrap: Default::default(),
            telemetry: Default::default(),
        }
    }
}
