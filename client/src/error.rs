//! Unified error handling for the client.

/// Errors raised while syncing a report.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Remote store error: {0}")]
    Remote(String),

    #[error("Failed to decode {report} payload: {source}")]
    Decode {
        report: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode {report}: {source}")]
    Encode {
        report: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Engine error: {0}")]
    Engine(#[from] psorcast_engine::Error),

    #[error("Local store error: {0}")]
    Local(#[from] std::io::Error),
}

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, SyncError>;
