//! Schema creation for the versions table backing each registered kind.
//! Rather than a fixed, numbered migration list, the schema here is
//! generated from the `Registry` at open time — there is one kind of
//! table (`{kind}_versions`), stamped out per registered kind rather than
//! per feature.

use flightvault_core::errors::StoreError;
use flightvault_core::registry::Registry;
use rusqlite::Connection;
use tracing::debug;

pub fn run_migrations(conn: &Connection, registry: &Registry) -> Result<(), StoreError> {
    for kind in registry.kinds() {
        create_kind_table(conn, &kind.name)?;
    }
    Ok(())
}

fn create_kind_table(conn: &Connection, kind: &str) -> Result<(), StoreError> {
    let table = versions_table_name(kind);
    let idx = format!("idx_{table}_pk_range");

    let ddl = format!(
        "CREATE TABLE IF NOT EXISTS {table} (
            version_id INTEGER PRIMARY KEY AUTOINCREMENT,
            pk_value   TEXT NOT NULL,
            payload    TEXT NOT NULL,
            row_start  TEXT NOT NULL,
            row_end    TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS {idx} ON {table}(pk_value, row_start, row_end);"
    );

    debug!(kind, "creating versions table");
    conn.execute_batch(&ddl)
        .map_err(|e| StoreError::Migration(format!("{kind}: {e}")))
}

pub fn versions_table_name(kind: &str) -> String {
    format!("{kind}_versions")
}
