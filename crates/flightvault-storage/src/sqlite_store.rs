//! `SqliteTemporalStore`: a single SQLite connection behind a mutex.
//! §5 calls for a single-writer-per-operation core, so there is no pool
//! here — just one connection guarded by a lock.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use flightvault_core::errors::StoreError;
use flightvault_core::models::{Filter, Record, VersionedRecord};
use flightvault_core::registry::Registry;
use flightvault_core::traits::{Clock, StoreResult, SystemClock, TemporalStore, Transaction, UpsertOutcome};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{instrument, warn};

use crate::migrations::{run_migrations, versions_table_name};
use crate::open_sentinel;
use crate::rows::{build_versioned_record, parse_timestamp, payload_to_record, record_to_payload};

pub struct SqliteTemporalStore {
    conn: Mutex<Connection>,
    registry: Registry,
    clock: Box<dyn Clock>,
    open_tx: Mutex<Option<u64>>,
    next_tx_id: AtomicU64,
}

impl SqliteTemporalStore {
    pub fn open(path: impl AsRef<Path>, registry: Registry) -> StoreResult<Self> {
        Self::open_with_clock(path, registry, Box::new(SystemClock))
    }

    pub fn open_with_clock(
        path: impl AsRef<Path>,
        registry: Registry,
        clock: Box<dyn Clock>,
    ) -> StoreResult<Self> {
        let conn = Connection::open(path).map_err(|e| StoreError::Connectivity(e.to_string()))?;
        Self::from_connection(conn, registry, clock)
    }

    pub fn open_in_memory(registry: Registry) -> StoreResult<Self> {
        Self::open_in_memory_with_clock(registry, Box::new(SystemClock))
    }

    pub fn open_in_memory_with_clock(registry: Registry, clock: Box<dyn Clock>) -> StoreResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| StoreError::Connectivity(e.to_string()))?;
        Self::from_connection(conn, registry, clock)
    }

    fn from_connection(conn: Connection, registry: Registry, clock: Box<dyn Clock>) -> StoreResult<Self> {
        run_migrations(&conn, &registry)?;
        Ok(Self {
            conn: Mutex::new(conn),
            registry,
            clock,
            open_tx: Mutex::new(None),
            next_tx_id: AtomicU64::new(1),
        })
    }

    fn kind_or_err(&self, kind: &str) -> StoreResult<()> {
        if self.registry.get(kind).is_some() {
            Ok(())
        } else {
            Err(StoreError::UnknownKind(kind.to_string()))
        }
    }

    /// Escape hatch for `testutil`'s fixture helpers, which need to touch
    /// the table directly instead of going through `TemporalStore`.
    pub(crate) fn with_raw_connection<T>(
        &self,
        f: impl FnOnce(&Connection) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        f(&conn)
    }

    fn require_pk(&self, kind: &str, record: &Record) -> StoreResult<String> {
        let entity = self
            .registry
            .get(kind)
            .ok_or_else(|| StoreError::UnknownKind(kind.to_string()))?;
        record
            .get(&entity.primary_key)
            .map(|v| v.to_string())
            .ok_or_else(|| StoreError::Constraint {
                kind: kind.to_string(),
                message: format!("record missing primary key field {}", entity.primary_key),
            })
    }
}

impl TemporalStore for SqliteTemporalStore {
    #[instrument(skip(self, filters))]
    fn as_of(&self, kind: &str, t: DateTime<Utc>, filters: Option<&Filter>) -> StoreResult<Vec<Record>> {
        self.kind_or_err(kind)?;
        let table = versions_table_name(kind);
        let conn = self.conn.lock().expect("store mutex poisoned");

        let sql = format!(
            "SELECT payload FROM {table} WHERE row_start <= ?1 AND row_end > ?1 ORDER BY pk_value"
        );
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| StoreError::Query { kind: kind.to_string(), message: e.to_string() })?;
        let rows = stmt
            .query_map(params![t.to_rfc3339()], |row| row.get::<_, String>(0))
            .map_err(|e| StoreError::Query { kind: kind.to_string(), message: e.to_string() })?;

        let mut out = Vec::new();
        for payload in rows {
            let payload = payload.map_err(|e| StoreError::Query { kind: kind.to_string(), message: e.to_string() })?;
            let record = payload_to_record(&payload, kind)?;
            if filters.map(|f| f.matches(&record)).unwrap_or(true) {
                out.push(record);
            }
        }
        Ok(out)
    }

    fn current(&self, kind: &str, filters: Option<&Filter>) -> StoreResult<Vec<Record>> {
        self.as_of(kind, self.clock.now(), filters)
    }

    #[instrument(skip(self))]
    fn between(&self, kind: &str, t1: DateTime<Utc>, t2: DateTime<Utc>) -> StoreResult<Vec<VersionedRecord>> {
        self.kind_or_err(kind)?;
        let table = versions_table_name(kind);
        let conn = self.conn.lock().expect("store mutex poisoned");

        let sql = format!(
            "SELECT payload, row_start, row_end FROM {table}
             WHERE row_start <= ?2 AND row_end > ?1
             ORDER BY row_start ASC"
        );
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| StoreError::Query { kind: kind.to_string(), message: e.to_string() })?;
        let rows = stmt
            .query_map(params![t1.to_rfc3339(), t2.to_rfc3339()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .map_err(|e| StoreError::Query { kind: kind.to_string(), message: e.to_string() })?;

        let mut out = Vec::new();
        for row in rows {
            let (payload, row_start, row_end) =
                row.map_err(|e| StoreError::Query { kind: kind.to_string(), message: e.to_string() })?;
            out.push(build_versioned_record(kind, &payload, &row_start, &row_end)?);
        }
        Ok(out)
    }

    #[instrument(skip(self))]
    fn audit(&self, kind: &str, limit: usize) -> StoreResult<Vec<VersionedRecord>> {
        self.kind_or_err(kind)?;
        let table = versions_table_name(kind);
        let conn = self.conn.lock().expect("store mutex poisoned");

        let sql = format!(
            "SELECT payload, row_start, row_end FROM {table} ORDER BY row_start DESC LIMIT ?1"
        );
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| StoreError::Query { kind: kind.to_string(), message: e.to_string() })?;
        let rows = stmt
            .query_map(params![limit as i64], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .map_err(|e| StoreError::Query { kind: kind.to_string(), message: e.to_string() })?;

        let mut out = Vec::new();
        for row in rows {
            let (payload, row_start, row_end) =
                row.map_err(|e| StoreError::Query { kind: kind.to_string(), message: e.to_string() })?;
            out.push(build_versioned_record(kind, &payload, &row_start, &row_end)?);
        }
        Ok(out)
    }

    #[instrument(skip(self, records, tx))]
    fn upsert_batch(&self, kind: &str, records: &[Record], tx: &Transaction) -> StoreResult<UpsertOutcome> {
        self.kind_or_err(kind)?;
        {
            let open = self.open_tx.lock().expect("tx mutex poisoned");
            if *open != Some(tx.0) {
                return Err(StoreError::NoTransaction);
            }
        }

        let table = versions_table_name(kind);
        let conn = self.conn.lock().expect("store mutex poisoned");
        let now = self.clock.now().to_rfc3339();
        let sentinel = open_sentinel().to_rfc3339();

        let mut outcome = UpsertOutcome::default();

        for record in records {
            let pk = self.require_pk(kind, record)?;
            let new_payload = record_to_payload(record)?;

            let existing: Option<String> = conn
                .query_row(
                    &format!(
                        "SELECT payload FROM {table} WHERE pk_value = ?1 AND row_end = ?2"
                    ),
                    params![pk, sentinel],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|e| StoreError::Query { kind: kind.to_string(), message: e.to_string() })?;

            match existing {
                Some(ref current_payload) if current_payload == &new_payload => {
                    // Same value already current — idempotent no-op.
                    continue;
                }
                Some(_) => {
                    conn.execute(
                        &format!("UPDATE {table} SET row_end = ?1 WHERE pk_value = ?2 AND row_end = ?3"),
                        params![now, pk, sentinel],
                    )
                    .map_err(|e| StoreError::Constraint { kind: kind.to_string(), message: e.to_string() })?;
                    conn.execute(
                        &format!(
                            "INSERT INTO {table} (pk_value, payload, row_start, row_end) VALUES (?1, ?2, ?3, ?4)"
                        ),
                        params![pk, new_payload, now, sentinel],
                    )
                    .map_err(|e| StoreError::Constraint { kind: kind.to_string(), message: e.to_string() })?;
                    outcome.updated += 1;
                }
                None => {
                    conn.execute(
                        &format!(
                            "INSERT INTO {table} (pk_value, payload, row_start, row_end) VALUES (?1, ?2, ?3, ?4)"
                        ),
                        params![pk, new_payload, now, sentinel],
                    )
                    .map_err(|e| StoreError::Constraint { kind: kind.to_string(), message: e.to_string() })?;
                    outcome.inserted += 1;
                }
            }
        }

        Ok(outcome)
    }

    fn tx_begin(&self) -> StoreResult<Transaction> {
        let mut open = self.open_tx.lock().expect("tx mutex poisoned");
        if open.is_some() {
            return Err(StoreError::Constraint {
                kind: "<transaction>".into(),
                message: "a transaction is already open on this store".into(),
            });
        }
        let conn = self.conn.lock().expect("store mutex poisoned");
        conn.execute_batch("BEGIN")
            .map_err(|e| StoreError::Connectivity(e.to_string()))?;
        let id = self.next_tx_id.fetch_add(1, Ordering::SeqCst);
        *open = Some(id);
        Ok(Transaction(id))
    }

    fn tx_commit(&self, tx: Transaction) -> StoreResult<()> {
        let mut open = self.open_tx.lock().expect("tx mutex poisoned");
        if *open != Some(tx.0) {
            return Err(StoreError::NoTransaction);
        }
        let conn = self.conn.lock().expect("store mutex poisoned");
        conn.execute_batch("COMMIT")
            .map_err(|e| StoreError::Connectivity(e.to_string()))?;
        *open = None;
        Ok(())
    }

    fn tx_rollback(&self, tx: Transaction) -> StoreResult<()> {
        let mut open = self.open_tx.lock().expect("tx mutex poisoned");
        if *open != Some(tx.0) {
            return Err(StoreError::NoTransaction);
        }
        let conn = self.conn.lock().expect("store mutex poisoned");
        if let Err(e) = conn.execute_batch("ROLLBACK") {
            warn!(error = %e, "rollback failed");
        }
        *open = None;
        Ok(())
    }
}
