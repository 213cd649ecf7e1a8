// Error taxonomy for a polling run.
//
// Fatal conditions are `RunError` variants so `main` (and tests) can tell
// them apart. Recoverable problems (a malformed post, one failed email)
// never become a `RunError`. They are collected into the run summary.

use thiserror::Error;

/// Conditions that abort a run.
#[derive(Debug, Error)]
pub enum RunError {
    /// Missing or invalid configuration or credentials. Raised before any
    /// network call is made.
    #[error("configuration error: {0}")]
    Config(String),

    /// The post source could not be reached for any query. State files
    /// are left untouched.
    #[error("post source unavailable: {0}")]
    SourceFetch(String),

    /// A state file exists but could not be read or parsed.
    #[error("failed to load {what}: {source}")]
    StateLoad {
        what: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// Writing a state file failed. Alerts may already have been sent, so
    /// the next run can re-alert on them.
    #[error("failed to persist {what}: {source}")]
    Persistence {
        what: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl RunError {
    pub fn config(msg: impl Into<String>) -> Self {
        RunError::Config(msg.into())
    }
}
