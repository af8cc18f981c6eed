use super::{RecoveryError, StoreError};

/// Top-level error type for the FlightVault recovery core.
/// Subsystem errors convert into this via `From` impls, the same
/// composition `CortexError` uses over its subsystem error enums.
#[derive(Debug, thiserror::Error)]
pub enum FlightVaultError {
    #[error("precondition failed: {0}")]
    Precondition(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("recovery error: {0}")]
    Recovery(#[from] RecoveryError),

    #[error("config error: {0}")]
    Config(String),
}

/// Convenience type alias.
pub type FlightVaultResult<T> = Result<T, FlightVaultError>;
