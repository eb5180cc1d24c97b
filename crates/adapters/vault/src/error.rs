//! Error types for the Vault adapter

use thiserror::Error;
use vaultadm_errors::AppError;

/// Boxed transport failure, kept opaque so fake executors can produce one
pub type TransportError = Box<dyn std::error::Error + Send + Sync>;

/// Errors surfaced by the request executor and the administrative operations
#[derive(Debug, Error)]
pub enum VaultError {
    /// The request never produced an HTTP status (connection refused, TLS, timeout)
    #[error("{operation} failed: no response from secret store: {source}")]
    NoResponse {
        operation: &'static str,
        #[source]
        source: TransportError,
    },

    /// A response arrived but its status is not the one the operation declares
    #[error(
        "{} failed: expected HTTP status {}, got {}{}",
        .operation,
        .expected,
        .actual,
        backend_errors(.errors)
    )]
    UnexpectedStatus {
        operation: &'static str,
        expected: u16,
        actual: u16,
        errors: Vec<String>,
    },

    #[error("{operation} failed: cannot decode HTTP {status} response: {message}")]
    Decode {
        operation: &'static str,
        status: u16,
        message: String,
    },

    #[error("{operation} failed: cannot encode request body: {source}")]
    Encode {
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Every key share was applied and the store still reports itself sealed
    #[error(
        "unseal threshold not reached after {applied} key share(s) (progress {progress}/{threshold})"
    )]
    ThresholdNotReached {
        applied: usize,
        progress: u32,
        threshold: u32,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("cannot build HTTP client: {0}")]
    Client(String),
}

fn backend_errors(errors: &[String]) -> String {
    if errors.is_empty() {
        String::new()
    } else {
        format!(" ({})", errors.join(", "))
    }
}

impl VaultError {
    /// HTTP status observed for this failure, `None` when no response arrived
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::UnexpectedStatus { actual, .. } => Some(*actual),
            Self::Decode { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<VaultError> for AppError {
    fn from(err: VaultError) -> Self {
        let message = err.to_string();
        match err {
            VaultError::UnexpectedStatus {
                actual: 401 | 403, ..
            } => AppError::forbidden(message),
            VaultError::UnexpectedStatus { actual: 404, .. } => AppError::not_found(message),
            // Any other status as well as a missing response is the store's problem
            VaultError::UnexpectedStatus { .. } | VaultError::NoResponse { .. } => {
                AppError::external_service(message)
            }
            VaultError::Decode { .. } | VaultError::Encode { .. } => AppError::internal(message),
            VaultError::ThresholdNotReached { .. } => AppError::failed_precondition(message),
            VaultError::InvalidArgument(_) => AppError::validation(message),
            VaultError::Client(_) => AppError::config(message),
        }
    }
}
