use std::io;

use thiserror::Error;

/// Errors surfaced by the container parsers and the dispatcher.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// The bytes do not conform to the container an adapter handles, or
    /// conform to a profile this system does not implement. The dispatcher
    /// treats this as recoverable and falls back to the next adapter.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A read past the end of the buffered input with no more source chunks
    /// available. Escalated to [`ProbeError::UnsupportedFormat`] at the
    /// adapter boundary.
    #[error("insufficient data: needed {needed} bytes, had {available}")]
    InsufficientData {
        /// Bytes the parser needed to make progress.
        needed: usize,
        /// Bytes that were actually available.
        available: usize,
    },

    /// A recognized codec whose sub-parameters are outside the supported
    /// ranges. Dispatches like [`ProbeError::UnsupportedFormat`].
    #[error("codec parameter out of range: {0}")]
    CodecSpecific(String),

    /// The caller's sample callback returned an error. Surfaced as-is and
    /// never triggers adapter fallback.
    #[error("sink error: {0}")]
    Sink(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ProbeError {
    /// Shorthand for an [`ProbeError::UnsupportedFormat`] with a message.
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::UnsupportedFormat(message.into())
    }

    /// Shorthand for a [`ProbeError::CodecSpecific`] with a message.
    pub fn codec(message: impl Into<String>) -> Self {
        Self::CodecSpecific(message.into())
    }

    /// Whether the dispatcher may recover from this error by trying the
    /// next adapter.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedFormat(_) | Self::InsufficientData { .. } | Self::CodecSpecific(_)
        )
    }
}

/// The leaf header decoders report through `std::io`; this maps their error
/// kinds onto the taxonomy at the container-crate boundary.
impl From<io::Error> for ProbeError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof => Self::InsufficientData {
                needed: 0,
                available: 0,
            },
            io::ErrorKind::Unsupported => Self::CodecSpecific(err.to_string()),
            _ => Self::UnsupportedFormat(err.to_string()),
        }
    }
}

/// Result type for parsing operations.
pub type Result<T> = std::result::Result<T, ProbeError>;
