use thiserror::Error;

/// Errors raised while decoding or delivering bridge traffic.
///
/// None of these ever reach callers of the public bridge operations; listeners
/// log them and drop the offending event.
#[derive(Debug, Error)]
pub enum HookError {
    #[error("unknown event type: {0}")]
    UnknownEvent(String),

    #[error("event {event} carries no detail")]
    MissingDetail { event: String },

    #[error("malformed detail for {event}: {message}")]
    MalformedDetail { event: String, message: String },

    #[error("unsupported protocol version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("resource unavailable: {0}")]
    ResourceUnavailable(String),

    #[error("font source conversion failed: {0}")]
    Conversion(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HookError {
    pub fn malformed(event: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedDetail { event: event.into(), message: message.into() }
    }
}
