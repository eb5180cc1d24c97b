//! Health check functionality for Vault

use serde::Serialize;
use tracing::{debug, warn};

use crate::client::VaultClient;
use crate::error::VaultError;
use crate::request::Execute;

/// Server state derived from the `sys/health` status code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VaultHealthStatus {
    /// 200: initialized, unsealed and active
    Active,
    /// 429: unsealed standby
    Standby,
    /// 472: disaster recovery secondary
    DrSecondary,
    /// 473: performance standby
    PerformanceStandby,
    /// 501: not initialized
    NotInitialized,
    /// 503: sealed
    Sealed,
    Unknown(u16),
}

impl VaultHealthStatus {
    pub fn from_status(status: u16) -> Self {
        match status {
            200 => Self::Active,
            429 => Self::Standby,
            472 => Self::DrSecondary,
            473 => Self::PerformanceStandby,
            501 => Self::NotInitialized,
            503 => Self::Sealed,
            other => Self::Unknown(other),
        }
    }

    pub fn is_initialized(&self) -> bool {
        !matches!(self, Self::NotInitialized | Self::Unknown(_))
    }

    /// An uninitialized server is sealed as well
    pub fn is_sealed(&self) -> bool {
        matches!(self, Self::NotInitialized | Self::Sealed)
    }

    /// Whether the server answers authenticated requests
    pub fn is_healthy(&self) -> bool {
        matches!(
            self,
            Self::Active | Self::Standby | Self::PerformanceStandby
        )
    }
}

/// Perform health check on Vault client
pub async fn check_vault_health<E: Execute>(
    client: &VaultClient<E>,
) -> Result<VaultHealthStatus, VaultError> {
    debug!("Performing Vault health check");

    let start = std::time::Instant::now();
    let status = client.health_check().await?;
    let health = VaultHealthStatus::from_status(status);

    let response_time_ms = start.elapsed().as_millis() as u64;
    if health.is_healthy() {
        debug!(?health, response_time_ms, "Vault health check passed");
    } else {
        warn!(?health, status, response_time_ms, "Vault is not ready");
    }

    Ok(health)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{Exchange, MockExecute};
    use reqwest::StatusCode;

    #[test]
    fn test_status_table() {
        assert_eq!(VaultHealthStatus::from_status(200), VaultHealthStatus::Active);
        assert_eq!(VaultHealthStatus::from_status(429), VaultHealthStatus::Standby);
        assert_eq!(
            VaultHealthStatus::from_status(472),
            VaultHealthStatus::DrSecondary
        );
        assert_eq!(
            VaultHealthStatus::from_status(473),
            VaultHealthStatus::PerformanceStandby
        );
        assert_eq!(
            VaultHealthStatus::from_status(501),
            VaultHealthStatus::NotInitialized
        );
        assert_eq!(VaultHealthStatus::from_status(503), VaultHealthStatus::Sealed);
        assert_eq!(
            VaultHealthStatus::from_status(500),
            VaultHealthStatus::Unknown(500)
        );
    }

    #[test]
    fn test_uninitialized_is_sealed() {
        let status = VaultHealthStatus::NotInitialized;
        assert!(!status.is_initialized());
        assert!(status.is_sealed());
        assert!(!status.is_healthy());
    }

    #[test]
    fn test_sealed_vault_is_unhealthy() {
        let status = VaultHealthStatus::Sealed;
        assert!(status.is_initialized());
        assert!(!status.is_healthy());
    }

    #[tokio::test]
    async fn test_check_vault_health_classifies_sealed() {
        let mut mock = MockExecute::new();
        mock.expect_execute().times(1).returning(|args| {
            Err(VaultError::UnexpectedStatus {
                operation: args.operation,
                expected: 200,
                actual: 503,
                errors: Vec::new(),
            })
        });

        let health = check_vault_health(&VaultClient::with_executor(mock))
            .await
            .unwrap();
        assert_eq!(health, VaultHealthStatus::Sealed);
    }

    #[tokio::test]
    async fn test_check_vault_health_active() {
        let mut mock = MockExecute::new();
        mock.expect_execute().times(1).returning(|args| {
            Ok(Exchange {
                operation: args.operation,
                status: StatusCode::OK,
                body: b"{}".to_vec(),
            })
        });

        let health = check_vault_health(&VaultClient::with_executor(mock))
            .await
            .unwrap();
        assert!(health.is_healthy());
    }
}
