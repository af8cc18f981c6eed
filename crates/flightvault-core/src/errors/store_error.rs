/// Errors raised by a `TemporalStore` implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store connectivity failure: {0}")]
    Connectivity(String),

    #[error("query failed against kind {kind}: {message}")]
    Query { kind: String, message: String },

    #[error("constraint violation on write to {kind}: {message}")]
    Constraint { kind: String, message: String },

    #[error("unknown entity kind: {0}")]
    UnknownKind(String),

    #[error("no open transaction for this operation")]
    NoTransaction,

    #[error("migration failed: {0}")]
    Migration(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
