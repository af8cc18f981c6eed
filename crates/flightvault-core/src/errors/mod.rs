mod flightvault_error;
mod recovery_error;
mod store_error;

pub use flightvault_error::{FlightVaultError, FlightVaultResult};
pub use recovery_error::RecoveryError;
pub use store_error::StoreError;
