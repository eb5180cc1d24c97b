//! Unseal protocol
//!
//! Key shares are submitted one at a time, in order, until Vault reports it
//! is no longer sealed. The threshold is not known up front; it is whatever
//! number of shares flips `sealed` to `false`.

use reqwest::{Method, StatusCode};
use tracing::{error, info};

use crate::client::VaultClient;
use crate::error::VaultError;
use crate::request::{Execute, RequestArgs};
use crate::types::{UnsealRequest, UnsealResponse, UNSEAL_API};

/// Where an unseal sequence stands after each applied share
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnsealState {
    Sealed {
        applied: usize,
        progress: u32,
        threshold: u32,
    },
    Unsealed {
        applied: usize,
        response: UnsealResponse,
    },
}

impl Default for UnsealState {
    fn default() -> Self {
        Self::Sealed {
            applied: 0,
            progress: 0,
            threshold: 0,
        }
    }
}

impl UnsealState {
    pub fn applied(&self) -> usize {
        match self {
            Self::Sealed { applied, .. } | Self::Unsealed { applied, .. } => *applied,
        }
    }

    /// Transition after Vault accepted one more share
    pub fn advance(self, response: UnsealResponse) -> Self {
        let applied = self.applied() + 1;
        if response.sealed {
            Self::Sealed {
                applied,
                progress: response.progress,
                threshold: response.t,
            }
        } else {
            Self::Unsealed { applied, response }
        }
    }

    /// Error for a sequence that ran out of shares in this state
    fn exhausted(self) -> VaultError {
        match self {
            Self::Sealed {
                applied,
                progress,
                threshold,
            } => VaultError::ThresholdNotReached {
                applied,
                progress,
                threshold,
            },
            Self::Unsealed { applied, response } => VaultError::ThresholdNotReached {
                applied,
                progress: response.progress,
                threshold: response.t,
            },
        }
    }
}

impl<E: Execute> VaultClient<E> {
    /// Apply base64 key shares until the store unseals.
    ///
    /// Stops at the first share that unseals the store; the remaining shares
    /// are never sent. A failed submission aborts immediately and shares
    /// already applied stay applied.
    pub async fn unseal<S: AsRef<str>>(
        &self,
        keys_base64: &[S],
    ) -> Result<UnsealResponse, VaultError> {
        info!("Vault unsealing process, applying key shares");

        let total = keys_base64.len();
        let mut state = UnsealState::default();

        for key in keys_base64 {
            let share = state.applied() + 1;

            let response = match self.submit_key_share(key.as_ref()).await {
                Ok(response) => response,
                Err(err) => {
                    error!(share, total, error = %err, "Error applying key share");
                    return Err(err);
                }
            };
            info!(share, total, "Vault key share successfully applied");

            match state.advance(response) {
                UnsealState::Unsealed { response, .. } => {
                    info!("Vault key share threshold reached, unsealing complete");
                    return Ok(response);
                }
                sealed => state = sealed,
            }
        }

        Err(state.exhausted())
    }

    async fn submit_key_share(&self, key: &str) -> Result<UnsealResponse, VaultError> {
        let args = RequestArgs::new(
            Method::POST,
            UNSEAL_API,
            "unseal secret store",
            StatusCode::OK,
        )
        .with_json(&UnsealRequest { key })?;

        self.executor.execute(args).await?.decode()
    }
}
