//! Request executor
//!
//! Every administrative operation is a single [`RequestArgs`] value handed to
//! [`Execute::execute`]. The executor performs exactly one HTTP exchange and
//! only hands the body back when the status is the one the operation expects.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::config::VaultConfig;
use crate::error::VaultError;

pub const VAULT_TOKEN_HEADER: &str = "X-Vault-Token";
pub const VAULT_NAMESPACE_HEADER: &str = "X-Vault-Namespace";

/// Request payload; a call carries at most one kind of body
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Raw(Vec<u8>),
}

/// Parameters of one administrative call
#[derive(Debug)]
pub struct RequestArgs {
    /// `None` sends the request unauthenticated
    pub auth_token: Option<SecretString>,
    pub method: Method,
    pub path: String,
    pub body: RequestBody,
    /// Human readable operation name used in logs and errors
    pub operation: &'static str,
    pub expected_status: StatusCode,
}

impl RequestArgs {
    pub fn new(
        method: Method,
        path: impl Into<String>,
        operation: &'static str,
        expected_status: StatusCode,
    ) -> Self {
        Self {
            auth_token: None,
            method,
            path: path.into(),
            body: RequestBody::Empty,
            operation,
            expected_status,
        }
    }

    /// Authenticate with `token`; an empty token leaves the call unauthenticated
    pub fn with_token(mut self, token: &SecretString) -> Self {
        self.auth_token = if token.expose_secret().is_empty() {
            None
        } else {
            Some(token.clone())
        };
        self
    }

    pub fn with_json<T: Serialize>(mut self, body: &T) -> Result<Self, VaultError> {
        let value = serde_json::to_value(body).map_err(|source| VaultError::Encode {
            operation: self.operation,
            source,
        })?;
        self.body = RequestBody::Json(value);
        Ok(self)
    }

    pub fn with_raw_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = RequestBody::Raw(body.into());
        self
    }
}

/// A response whose status matched the expectation
#[derive(Debug, Clone)]
pub struct Exchange {
    pub operation: &'static str,
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl Exchange {
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, VaultError> {
        serde_json::from_slice(&self.body).map_err(|e| VaultError::Decode {
            operation: self.operation,
            status: self.status.as_u16(),
            message: e.to_string(),
        })
    }
}

/// Performs one HTTP exchange per call
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Execute: Send + Sync {
    /// Returns the exchange when the status equals `args.expected_status`,
    /// [`VaultError::UnexpectedStatus`] on any other status and
    /// [`VaultError::NoResponse`] when no status was obtained at all.
    async fn execute(&self, args: RequestArgs) -> Result<Exchange, VaultError>;
}

/// [`Execute`] implementation on top of `reqwest`
#[derive(Debug, Clone)]
pub struct HttpExecutor {
    http: reqwest::Client,
    base_url: String,
    namespace: Option<String>,
}

impl HttpExecutor {
    fn user_agent() -> String {
        format!("vaultadm/{}", env!("CARGO_PKG_VERSION"))
    }

    pub fn new(config: &VaultConfig) -> Result<Self, VaultError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(Self::user_agent())
            .timeout(Duration::from_secs(config.request_timeout_secs));

        if let Some(path) = &config.root_ca_cert_path {
            let pem = std::fs::read(path).map_err(|e| {
                VaultError::Client(format!("cannot read CA certificate {}: {e}", path.display()))
            })?;
            let cert = reqwest::Certificate::from_pem(&pem).map_err(|e| {
                VaultError::Client(format!("invalid CA certificate {}: {e}", path.display()))
            })?;
            builder = builder.add_root_certificate(cert);
        }

        let http = builder
            .build()
            .map_err(|e| VaultError::Client(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            namespace: config.namespace.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl Execute for HttpExecutor {
    async fn execute(&self, args: RequestArgs) -> Result<Exchange, VaultError> {
        let operation = args.operation;
        let url = self.url(&args.path);

        let mut request = self.http.request(args.method.clone(), &url);
        if let Some(token) = &args.auth_token {
            request = request.header(VAULT_TOKEN_HEADER, token.expose_secret());
        }
        if let Some(namespace) = &self.namespace {
            request = request.header(VAULT_NAMESPACE_HEADER, namespace);
        }
        request = match args.body {
            RequestBody::Empty => request,
            RequestBody::Json(value) => request.json(&value),
            RequestBody::Raw(bytes) => request.body(bytes),
        };

        let resp = request
            .send()
            .await
            .map_err(|e| VaultError::NoResponse {
                operation,
                source: Box::new(e),
            })?;

        let status = resp.status();
        debug!(
            operation,
            method = %args.method,
            path = %args.path,
            status = status.as_u16(),
            "Vault request completed"
        );

        if status != args.expected_status {
            let errors = parse_vault_errors(resp).await;
            return Err(VaultError::UnexpectedStatus {
                operation,
                expected: args.expected_status.as_u16(),
                actual: status.as_u16(),
                errors,
            });
        }

        let body = resp.bytes().await.map_err(|e| VaultError::Decode {
            operation,
            status: status.as_u16(),
            message: format!("cannot read response body: {e}"),
        })?;

        Ok(Exchange {
            operation,
            status,
            body: body.to_vec(),
        })
    }
}

/// Collect the `errors` array Vault puts in failure responses
async fn parse_vault_errors(resp: reqwest::Response) -> Vec<String> {
    resp.json::<Value>()
        .await
        .ok()
        .and_then(|v| {
            v.get("errors")?.as_array().map(|arr| {
                arr.iter()
                    .filter_map(|e| e.as_str().map(String::from))
                    .collect()
            })
        })
        .unwrap_or_default()
}
