use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("explorer request failed: {0}")]
    Explorer(#[from] ExplorerError),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid snapshot: {0}")]
    Snapshot(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failure of a single explorer call. Every variant carries the URL so the
/// warning logged at the call site and the error seen by callers agree.
#[derive(Debug, thiserror::Error)]
pub enum ExplorerError {
    #[error("GET {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("GET {url} -> {status}")]
    Status { url: String, status: StatusCode },

    #[error("GET {url}: invalid response: {message}")]
    InvalidResponse { url: String, message: String },
}

impl ExplorerError {
    pub fn url(&self) -> &str {
        match self {
            Self::Transport { url, .. }
            | Self::Status { url, .. }
            | Self::InvalidResponse { url, .. } => url,
        }
    }

    /// `true` when the explorer answered but reported the resource missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status, .. } if *status == StatusCode::NOT_FOUND)
    }
}
