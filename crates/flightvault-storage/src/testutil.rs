//! Fixture helpers for seeding and retiring versions directly, bypassing
//! the `TemporalStore` contract. The contract has no delete operation —
//! record loss is assumed to happen upstream, outside this crate's scope
//! (§1) — so tests that need to simulate a disaster reach in here instead,
//! talking to the raw connection the way a test fixture would.

use chrono::{DateTime, Utc};
use flightvault_core::errors::StoreError;
use flightvault_core::models::Record;

use crate::migrations::versions_table_name;
use crate::open_sentinel;
use crate::rows::record_to_payload;
use crate::SqliteTemporalStore;

impl SqliteTemporalStore {
    /// Directly insert a version row with an explicit `[row_start, row_end)`
    /// interval, bypassing `upsert_batch`'s idempotence and open-transaction
    /// checks. For building fixtures, not production writes.
    pub fn seed_version(
        &self,
        kind: &str,
        pk: &str,
        record: &Record,
        row_start: DateTime<Utc>,
        row_end: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError> {
        let table = versions_table_name(kind);
        let payload = record_to_payload(record)?;
        let row_end = row_end.unwrap_or_else(open_sentinel);

        self.with_raw_connection(|conn| {
            conn.execute(
                &format!(
                    "INSERT INTO {table} (pk_value, payload, row_start, row_end) VALUES (?1, ?2, ?3, ?4)"
                ),
                rusqlite::params![pk, payload, row_start.to_rfc3339(), row_end.to_rfc3339()],
            )
            .map(|_| ())
            .map_err(|e| StoreError::Constraint { kind: kind.to_string(), message: e.to_string() })
        })
    }

    /// Simulate the row for `pk` vanishing at `at`: closes its currently
    /// open version without opening a replacement, the way the underlying
    /// system-versioned table would record a deletion.
    pub fn retire(&self, kind: &str, pk: &str, at: DateTime<Utc>) -> Result<(), StoreError> {
        let table = versions_table_name(kind);
        let sentinel = open_sentinel().to_rfc3339();

        self.with_raw_connection(|conn| {
            conn.execute(
                &format!("UPDATE {table} SET row_end = ?1 WHERE pk_value = ?2 AND row_end = ?3"),
                rusqlite::params![at.to_rfc3339(), pk, sentinel],
            )
            .map(|_| ())
            .map_err(|e| StoreError::Constraint { kind: kind.to_string(), message: e.to_string() })
        })
    }

    /// Wipe every version of `kind` with `row_start >= at`, simulating a
    /// catastrophic loss of everything written after `at`.
    pub fn wipe_after(&self, kind: &str, at: DateTime<Utc>) -> Result<usize, StoreError> {
        let table = versions_table_name(kind);
        self.with_raw_connection(|conn| {
            conn.execute(
                &format!("DELETE FROM {table} WHERE row_start >= ?1"),
                rusqlite::params![at.to_rfc3339()],
            )
            .map_err(|e| StoreError::Constraint { kind: kind.to_string(), message: e.to_string() })
        })
    }
}
