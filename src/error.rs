use std::path::PathBuf;

use thiserror::Error;

/// Failures while pulling data from an external source.
///
/// None of these are fatal: the feeds map them onto a connection status and
/// try again on the next poll.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("transport error fetching {url}: {message}")]
    Transport { url: String, message: String },

    #[error("HTTP {code} from {url}")]
    Status { url: String, code: u16 },

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("refusing to read {path}: path escapes the log root")]
    OutsideRoot { path: PathBuf },

    #[error("malformed snapshot: {0}")]
    Parse(String),

    #[error("malformed metrics: {0}")]
    Metrics(String),

    #[error("background worker disconnected")]
    WorkerGone,
}

impl FeedError {
    /// Short tag used in the status line.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport { .. } | Self::Status { .. } => "transport",
            Self::Read { .. } | Self::OutsideRoot { .. } => "read",
            Self::Parse(_) | Self::Metrics(_) => "parse",
            Self::WorkerGone => "worker",
        }
    }
}
