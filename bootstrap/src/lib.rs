//! vaultadm-bootstrap - secret store provisioning
//!
//! Composes the adapter operations into the initialize / unseal / configure
//! workflow run by the `vaultadm` binary.

mod provision;
mod runtime;

pub use provision::*;
pub use runtime::*;
