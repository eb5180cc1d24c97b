//! Administrative operations
//!
//! Each operation is one declarative [`RequestArgs`] handed to the executor;
//! unsealing lives in [`crate::unseal`].

use reqwest::{Method, StatusCode};
use secrecy::SecretString;
use tracing::info;

use crate::config::VaultConfig;
use crate::error::VaultError;
use crate::request::{Execute, HttpExecutor, RequestArgs};
use crate::types::{
    EnableSecretsEngineRequest, InitRequest, InitResponse, ListSecretEnginesResponse,
    UpdateAclPolicyRequest, HEALTH_API, INIT_API, MOUNTS_API, POLICY_API,
};

/// Administrative client for a Vault server
pub struct VaultClient<E = HttpExecutor> {
    pub(crate) executor: E,
}

impl VaultClient<HttpExecutor> {
    /// Create a client talking HTTP to `config.base_url`
    pub fn new(config: &VaultConfig) -> Result<Self, VaultError> {
        info!(base_url = %config.base_url, "Creating Vault client");
        Ok(Self::with_executor(HttpExecutor::new(config)?))
    }
}

impl<E: Execute> VaultClient<E> {
    pub fn with_executor(executor: E) -> Self {
        Self { executor }
    }

    /// Query `sys/health` and return the HTTP status it answered with.
    ///
    /// Vault signals "sealed", "standby" and friends with non-200 codes, so
    /// any status is a successful check; only a missing response is an error.
    pub async fn health_check(&self) -> Result<u16, VaultError> {
        let args = RequestArgs::new(Method::GET, HEALTH_API, "health check", StatusCode::OK);

        let status = match self.executor.execute(args).await {
            Ok(exchange) => exchange.status.as_u16(),
            Err(VaultError::UnexpectedStatus { actual, .. }) => actual,
            Err(VaultError::Decode { status, .. }) => status,
            Err(err) => return Err(err),
        };

        info!(status, "Vault health check HTTP status");
        Ok(status)
    }

    /// Initialize the store, splitting the master key into `secret_shares`
    /// shares of which `secret_threshold` are needed to unseal.
    pub async fn init(
        &self,
        secret_shares: u32,
        secret_threshold: u32,
    ) -> Result<InitResponse, VaultError> {
        if secret_shares == 0 || secret_threshold == 0 || secret_threshold > secret_shares {
            return Err(VaultError::InvalidArgument(format!(
                "secret threshold must be between 1 and the number of shares \
                 (shares={secret_shares}, threshold={secret_threshold})"
            )));
        }

        info!(
            shares = secret_shares,
            threshold = secret_threshold,
            "Vault init strategy (SSS parameters)"
        );

        let request = InitRequest {
            secret_shares,
            secret_threshold,
        };
        let args = RequestArgs::new(
            Method::POST,
            INIT_API,
            "initialize secret store",
            StatusCode::OK,
        )
        .with_json(&request)?;

        self.executor.execute(args).await?.decode()
    }

    /// Install (or replace) the ACL policy `policy_name`
    pub async fn install_policy(
        &self,
        token: &SecretString,
        policy_name: &str,
        policy_document: &str,
    ) -> Result<(), VaultError> {
        let path = format!("{}/{}", POLICY_API, urlencoding::encode(policy_name));
        let args = RequestArgs::new(Method::PUT, path, "install policy", StatusCode::NO_CONTENT)
            .with_token(token)
            .with_json(&UpdateAclPolicyRequest {
                policy: policy_document,
            })?;

        self.executor.execute(args).await?;
        info!(policy = policy_name, "Vault policy installed");
        Ok(())
    }

    /// Mount a key/value engine of `kv_version` at `mount_point`
    pub async fn enable_kv_secret_engine(
        &self,
        token: &SecretString,
        mount_point: &str,
        kv_version: &str,
    ) -> Result<(), VaultError> {
        self.enable_secret_engine(
            token,
            mount_point,
            &EnableSecretsEngineRequest::key_value(kv_version),
            "update mounts",
        )
        .await
    }

    /// Mount the Consul engine at `mount_point`
    pub async fn enable_consul_secret_engine(
        &self,
        token: &SecretString,
        mount_point: &str,
        default_lease_ttl: &str,
    ) -> Result<(), VaultError> {
        self.enable_secret_engine(
            token,
            mount_point,
            &EnableSecretsEngineRequest::consul(default_lease_ttl),
            "update mounts for Consul",
        )
        .await
    }

    pub async fn enable_secret_engine(
        &self,
        token: &SecretString,
        mount_point: &str,
        request: &EnableSecretsEngineRequest,
        operation: &'static str,
    ) -> Result<(), VaultError> {
        let args = RequestArgs::new(
            Method::POST,
            mount_path(mount_point),
            operation,
            StatusCode::NO_CONTENT,
        )
        .with_token(token)
        .with_json(request)?;

        self.executor.execute(args).await?;
        info!(
            engine = %request.engine,
            mount_point,
            "Vault secret engine enabled"
        );
        Ok(())
    }

    /// List mounted engines
    pub async fn list_secret_engines(
        &self,
        token: &SecretString,
    ) -> Result<ListSecretEnginesResponse, VaultError> {
        let args = RequestArgs::new(Method::GET, MOUNTS_API, "query mounts", StatusCode::OK)
            .with_token(token);

        self.executor.execute(args).await?.decode()
    }

    /// Whether `mount_point` is mounted with an engine of type `engine`.
    ///
    /// A failed listing is returned as an error, never as `false`.
    pub async fn check_secret_engine_installed(
        &self,
        token: &SecretString,
        mount_point: &str,
        engine: impl AsRef<str>,
    ) -> Result<bool, VaultError> {
        let mounts = self.list_secret_engines(token).await?;
        Ok(mounts.has_engine(mount_point, engine.as_ref()))
    }
}

fn mount_path(mount_point: &str) -> String {
    format!("{}/{}", MOUNTS_API, mount_point.trim_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{Exchange, MockExecute, RequestBody};
    use crate::types::SecretEngine;
    use secrecy::ExposeSecret;
    use serde_json::json;

    fn exchange(status: StatusCode, body: serde_json::Value) -> Exchange {
        Exchange {
            operation: "test",
            status,
            body: serde_json::to_vec(&body).unwrap(),
        }
    }

    fn unexpected(operation: &'static str, expected: u16, actual: u16) -> VaultError {
        VaultError::UnexpectedStatus {
            operation,
            expected,
            actual,
            errors: Vec::new(),
        }
    }

    fn token() -> SecretString {
        SecretString::new("hvs.root".to_string())
    }

    #[test]
    fn mount_path_joins_without_double_slash() {
        assert_eq!(mount_path("secret"), "/v1/sys/mounts/secret");
        assert_eq!(mount_path("/secret/"), "/v1/sys/mounts/secret");
        assert_eq!(mount_path("team/kv"), "/v1/sys/mounts/team/kv");
    }

    #[tokio::test]
    async fn health_check_treats_unhealthy_status_as_success() {
        let mut mock = MockExecute::new();
        mock.expect_execute()
            .withf(|args| {
                args.path == HEALTH_API && args.auth_token.is_none() && args.method == Method::GET
            })
            .times(1)
            .returning(|_| Err(unexpected("health check", 200, 503)));

        let status = VaultClient::with_executor(mock).health_check().await.unwrap();
        assert_eq!(status, 503);
    }

    #[tokio::test]
    async fn health_check_keeps_status_when_body_unreadable() {
        let mut mock = MockExecute::new();
        mock.expect_execute().times(1).returning(|_| {
            Err(VaultError::Decode {
                operation: "health check",
                status: 200,
                message: "connection reset while reading body".to_string(),
            })
        });

        let status = VaultClient::with_executor(mock).health_check().await.unwrap();
        assert_eq!(status, 200);
    }

    #[tokio::test]
    async fn health_check_propagates_transport_failure() {
        let mut mock = MockExecute::new();
        mock.expect_execute().times(1).returning(|_| {
            Err(VaultError::NoResponse {
                operation: "health check",
                source: "connection refused".into(),
            })
        });

        let err = VaultClient::with_executor(mock)
            .health_check()
            .await
            .unwrap_err();
        assert_eq!(err.status(), None);
    }

    #[tokio::test]
    async fn init_sends_sss_parameters_unauthenticated() {
        let mut mock = MockExecute::new();
        mock.expect_execute()
            .withf(|args| {
                args.path == INIT_API
                    && args.auth_token.is_none()
                    && args.expected_status == StatusCode::OK
                    && args.body
                        == RequestBody::Json(json!({"secret_shares": 5, "secret_threshold": 3}))
            })
            .times(1)
            .returning(|_| {
                Ok(exchange(
                    StatusCode::OK,
                    json!({
                        "root_token": "hvs.root",
                        "keys": ["k1", "k2", "k3", "k4", "k5"],
                        "keys_base64": ["b1", "b2", "b3", "b4", "b5"]
                    }),
                ))
            });

        let resp = VaultClient::with_executor(mock).init(5, 3).await.unwrap();
        assert_eq!(resp.root_token, "hvs.root");
        assert_eq!(resp.keys, vec!["k1", "k2", "k3", "k4", "k5"]);
        assert_eq!(resp.keys_base64, vec!["b1", "b2", "b3", "b4", "b5"]);
    }

    #[tokio::test]
    async fn init_rejects_threshold_above_shares_without_request() {
        let mut mock = MockExecute::new();
        mock.expect_execute().never();

        let err = VaultClient::with_executor(mock).init(3, 5).await.unwrap_err();
        assert!(matches!(err, VaultError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn install_policy_escapes_name_and_authenticates() {
        let mut mock = MockExecute::new();
        mock.expect_execute()
            .withf(|args| {
                args.method == Method::PUT
                    && args.path == "/v1/sys/policies/acl/edge%20admin"
                    && args.expected_status == StatusCode::NO_CONTENT
                    && args
                        .auth_token
                        .as_ref()
                        .is_some_and(|t| t.expose_secret() == "hvs.root")
                    && args.body == RequestBody::Json(json!({"policy": "path \"*\" {}"}))
            })
            .times(1)
            .returning(|_| Ok(exchange(StatusCode::NO_CONTENT, json!(null))));

        VaultClient::with_executor(mock)
            .install_policy(&token(), "edge admin", "path \"*\" {}")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn install_policy_reports_operation_on_mismatch() {
        let mut mock = MockExecute::new();
        mock.expect_execute()
            .times(1)
            .returning(|args| Err(unexpected(args.operation, 204, 403)));

        let err = VaultClient::with_executor(mock)
            .install_policy(&token(), "admin", "doc")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("install policy"));
        assert_eq!(err.status(), Some(403));
    }

    #[tokio::test]
    async fn enable_kv_and_consul_share_one_mount_call() {
        let mut mock = MockExecute::new();
        mock.expect_execute()
            .withf(|args| {
                args.path == "/v1/sys/mounts/secret"
                    && args.operation == "update mounts"
                    && args.body
                        == RequestBody::Json(json!({
                            "type": "kv",
                            "description": "key/value secret storage",
                            "options": {"version": "2"}
                        }))
            })
            .times(1)
            .returning(|_| Ok(exchange(StatusCode::NO_CONTENT, json!(null))));
        mock.expect_execute()
            .withf(|args| {
                args.path == "/v1/sys/mounts/consul"
                    && args.operation == "update mounts for Consul"
                    && args.body
                        == RequestBody::Json(json!({
                            "type": "consul",
                            "description": "consul secret storage",
                            "config": {"default_lease_ttl": "1h"}
                        }))
            })
            .times(1)
            .returning(|_| Ok(exchange(StatusCode::NO_CONTENT, json!(null))));

        let client = VaultClient::with_executor(mock);
        client
            .enable_kv_secret_engine(&token(), "secret", "2")
            .await
            .unwrap();
        client
            .enable_consul_secret_engine(&token(), "consul", "1h")
            .await
            .unwrap();
    }

    fn mounts_exchange() -> Exchange {
        exchange(
            StatusCode::OK,
            json!({"data": {"secret/": {"type": "kv"}, "consul/": {"type": "consul"}}}),
        )
    }

    #[tokio::test]
    async fn check_secret_engine_installed_requires_matching_type() {
        let mut mock = MockExecute::new();
        mock.expect_execute()
            .withf(|args| args.path == MOUNTS_API && args.auth_token.is_some())
            .times(3)
            .returning(|_| Ok(mounts_exchange()));

        let client = VaultClient::with_executor(mock);
        assert!(client
            .check_secret_engine_installed(&token(), "secret/", SecretEngine::KeyValue)
            .await
            .unwrap());
        assert!(!client
            .check_secret_engine_installed(&token(), "secret/", SecretEngine::Consul)
            .await
            .unwrap());
        assert!(!client
            .check_secret_engine_installed(&token(), "pki/", "pki")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn check_secret_engine_installed_short_circuits_on_error() {
        let mut mock = MockExecute::new();
        mock.expect_execute()
            .times(1)
            .returning(|args| Err(unexpected(args.operation, 200, 403)));

        let result = VaultClient::with_executor(mock)
            .check_secret_engine_installed(&token(), "secret/", SecretEngine::KeyValue)
            .await;
        assert!(matches!(
            result,
            Err(VaultError::UnexpectedStatus { actual: 403, .. })
        ));
    }
}
