//! Error types for LLSD parsing.

/// Result alias for LLSD operations.
pub type LlsdResult<T> = Result<T, LlsdError>;

/// Errors that can occur while parsing binary LLSD.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LlsdError {
    /// The input ended before a value was complete.
    #[error("unexpected end of input at offset {offset} (needed {needed} more bytes)")]
    UnexpectedEof { offset: usize, needed: usize },

    /// A type marker byte was not recognized.
    #[error("unknown type marker {marker:#04x} at offset {offset}")]
    UnknownMarker { marker: u8, offset: usize },

    /// A map key was not introduced by a key marker.
    #[error("expected map key at offset {offset}, found marker {marker:#04x}")]
    ExpectedKey { marker: u8, offset: usize },

    /// An array or map was not closed by its terminator.
    #[error("missing terminator {expected:?} at offset {offset}")]
    MissingTerminator { expected: char, offset: usize },

    /// String data was not valid UTF-8.
    #[error("invalid UTF-8 in string at offset {offset}")]
    InvalidUtf8 { offset: usize },

    /// A length did not fit the format's 32-bit length prefix.
    #[error("length {0} does not fit a 32-bit length prefix")]
    TooLarge(usize),

    /// Nesting exceeded [`crate::MAX_DEPTH`].
    #[error("container nesting deeper than {0} levels")]
    TooDeep(usize),
}
