use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("service error (status {status}): {message}")]
    Service { status: u16, message: String },

    #[error("invalid endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    /// The connection could not be established; the request never left.
    #[error("cannot reach Central: {0}")]
    Connect(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("connection is closed")]
    Closed,

    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl RemoteError {
    /// The remote service reported that the addressed object does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Failures worth another attempt from the transport's retry loop.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Unavailable(_) | Self::Transport(_) | Self::Connect(_)
        )
    }

    /// Central never saw the request, so sending it again cannot duplicate
    /// a side effect.
    pub fn is_unsent(&self) -> bool {
        matches!(self, Self::Connect(_))
    }
}

/// Walk the full error chain and join all causes into one string.
///
/// HTTP client errors often have terse `Display` impls (e.g. "error sending
/// request") but useful detail in the source chain.
pub fn format_err_chain(err: &dyn std::error::Error) -> String {
    let mut msg = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        msg.push_str(": ");
        msg.push_str(&cause.to_string());
        source = cause.source();
    }
    msg
}
