mod clock;
mod store;

pub use clock::{Clock, FixedClock, SystemClock};
pub use store::{StoreResult, TemporalStore, Transaction, UpsertOutcome};
