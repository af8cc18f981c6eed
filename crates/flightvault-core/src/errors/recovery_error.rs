/// Errors raised by the diff/health/finder/classifier/executor pipeline.
#[derive(Debug, thiserror::Error)]
pub enum RecoveryError {
    #[error("record of kind {kind} is missing its primary key field {pk_field}")]
    MissingPrimaryKey { kind: String, pk_field: String },

    #[error("dependency validation failed: {0} blocking issue(s)")]
    ValidationFailed(usize),

    #[error("integrity gate failed: {gate}")]
    IntegrityFailure { gate: String },

    #[error("recovery operation aborted")]
    Aborted,

    #[error("malformed timestamp: {0}")]
    MalformedTimestamp(String),
}
