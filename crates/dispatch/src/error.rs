use {donna_conversations::RunStatus, thiserror::Error};

/// Failures that abort a dispatch call.
///
/// Tool-level problems never appear here: they are folded into tool outputs
/// inside the router and the run continues.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The classification service call failed (ambiguous *output* never
    /// errors — it coerces to the general category).
    #[error("classification failed: {0}")]
    Classification(#[source] donna_conversations::Error),

    /// Session store lookup or thread creation failed.
    #[error("session lookup failed: {0}")]
    Session(#[from] donna_sessions::Error),

    /// The run reached a terminal error state.
    #[error("Unexpected run status: {status}")]
    Run { status: RunStatus },

    /// The run outlived its deadline while still queued or in progress.
    #[error("run did not complete within {seconds}s")]
    Timeout { seconds: u64 },

    /// The run completed but authored no message — a data contract
    /// violation on the conversation service's side.
    #[error("no handler response found for run {run_id}")]
    NoResponse { run_id: String },

    /// Any other conversation service failure.
    #[error(transparent)]
    Service(#[from] donna_conversations::Error),
}
