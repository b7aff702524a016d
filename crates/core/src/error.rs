use thiserror::Error;

/// The error taxonomy the core recognizes (spec.md §7).
///
/// Every pipeline stage boundary converts internal failures into one of
/// these before returning; the Agent Loop never terminates on a single
/// message's failure. Only [`CoreError::Fatal`] during startup is allowed
/// to end the process.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Security or ethics denied the request. Never surfaces a stack trace
    /// to the sender — always paired with a fixed refusal string.
    #[error("policy reject: {0}")]
    PolicyReject(String),

    /// Generation raised or produced output that could not be parsed as the
    /// structured judgment the caller expected.
    #[error("model failure: {0}")]
    ModelFailure(String),

    /// A transport's `poll`/`send` returned an error.
    #[error("transport failure: {0}")]
    TransportFailure(String),

    /// A state file failed to write. The in-memory state remains valid;
    /// the write is retried at the next save cycle.
    #[error("persistence failure: {0}")]
    PersistenceFailure(String),

    /// Required configuration was missing or invalid at startup.
    #[error("config failure: {0}")]
    ConfigFailure(String),

    /// Unrecoverable subsystem initialization failure. The only error kind
    /// that ends the process.
    #[error("fatal: {0}")]
    Fatal(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
