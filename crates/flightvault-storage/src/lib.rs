//! # flightvault-storage
//!
//! SQLite-backed implementation of the Temporal Store Adapter contract
//! (`flightvault_core::traits::TemporalStore`). A single physical table
//! per registered entity kind holds every version that ever existed,
//! each row carrying its own `row_start`/`row_end` validity interval —
//! the same shape the reference system's MariaDB `FOR SYSTEM_TIME`
//! tables expose, reproduced here because the real system-versioning
//! engine is out of scope (§1) but the adapter needs something real to
//! sit in front of for this repo's tests to exercise.

mod migrations;
mod rows;
mod sqlite_store;

pub mod testutil;

pub use sqlite_store::SqliteTemporalStore;

/// Sentinel `row_end` for an open (still-current) version. Chosen far
/// enough in the future that no real query range will ever cross it —
/// the same idea as the source's MariaDB `2038-01-19 03:14:07.999999`
/// sentinel, pushed out further since we aren't bound by a 32-bit epoch.
pub fn open_sentinel() -> chrono::DateTime<chrono::Utc> {
    use chrono::TimeZone;
    chrono::Utc.with_ymd_and_hms(9999, 12, 31, 23, 59, 59).unwrap()
}
