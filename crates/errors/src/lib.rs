//! vaultadm-errors - unified error handling
//!
//! Every workflow step surfaces its failure as an [`AppError`]; the binary
//! logs it and exits with [`AppError::exit_code`].

use thiserror::Error;

/// Application error type
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Failed precondition: {0}")]
    FailedPrecondition(String),
}

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn external_service(msg: impl Into<String>) -> Self {
        Self::ExternalService(msg.into())
    }

    pub fn failed_precondition(msg: impl Into<String>) -> Self {
        Self::FailedPrecondition(msg.into())
    }

    /// Process exit code for the `vaultadm` binary
    ///
    /// Follows the BSD `sysexits.h` conventions so that provisioning
    /// pipelines can tell a misconfiguration from an unreachable backend.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 65,         // EX_DATAERR
            Self::NotFound(_) => 66,           // EX_NOINPUT
            Self::ExternalService(_) => 69,    // EX_UNAVAILABLE
            Self::Internal(_) => 70,           // EX_SOFTWARE
            Self::FailedPrecondition(_) => 75, // EX_TEMPFAIL
            Self::Forbidden(_) => 77,          // EX_NOPERM
            Self::Config(_) => 78,             // EX_CONFIG
        }
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;
