use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum CoreError {
    /// Missing or malformed configuration (credential, model name).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// No usable chat API surface is available.
    #[error("setup error: {0}")]
    Setup(String),

    #[error("upstream returned {status}: {detail}")]
    Http { status: u16, detail: String },

    #[error("network error: {0}")]
    Network(String),

    /// The endpoint refused the optional schema/format parameter.
    #[error("structured output rejected ({status}): {detail}")]
    SchemaRejected { status: u16, detail: String },

    /// A header or body value could not be represented on the transport.
    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("malformed upstream response: {0}")]
    MalformedResponse(String),

    #[error("all {attempts} call attempts failed; last error: {last}")]
    FallbackExhausted { attempts: usize, last: Box<CoreError> },

    #[error("local model not available: {0}")]
    LocalModelUnavailable(String),

    #[error("invalid input: {0}")]
    Invalid(String),
}

/// Failure categories the fallback chain knows how to route around.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    SchemaRejected,
    Encoding,
    Transport,
}

impl CoreError {
    /// Returns `None` for errors that must abort the fallback chain.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            CoreError::SchemaRejected { .. } => Some(FailureKind::SchemaRejected),
            CoreError::Encoding(_) => Some(FailureKind::Encoding),
            CoreError::Http { .. } | CoreError::Network(_) | CoreError::MalformedResponse(_) => {
                Some(FailureKind::Transport)
            }
            _ => None,
        }
    }
}
