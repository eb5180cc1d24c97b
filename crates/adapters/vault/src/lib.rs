//! vaultadm-adapter-vault - HashiCorp Vault administration adapter
//!
//! Provides the operations needed to bring up a fresh Vault server:
//! - Health checking
//! - Initialization (Shamir secret sharing parameters)
//! - Unsealing with key shares
//! - ACL policy installation
//! - Secret engine mounting (KV, Consul)
//!
//! All operations go through a single [`Execute`] implementation, which
//! performs one HTTP exchange per call and checks the response status.

pub mod client;
pub mod config;
pub mod error;
pub mod health;
pub mod request;
pub mod types;
pub mod unseal;

pub use client::VaultClient;
pub use config::{VaultConfig, VaultConfigBuilder};
pub use error::VaultError;
pub use health::{check_vault_health, VaultHealthStatus};
pub use request::{Exchange, Execute, HttpExecutor, RequestArgs, RequestBody};
pub use types::{EnableSecretsEngineRequest, InitResponse, SecretEngine, UnsealResponse};
pub use unseal::UnsealState;
