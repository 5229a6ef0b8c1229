//! Error types for DVI decoding.

use thiserror::Error;

/// The error type for every stage of the DVI decode pipeline.
///
/// Only [`DviError::BadPreamble`] (and I/O failures of the file-reading
/// convenience entry points) prevent a document from being produced. Every
/// other kind is caught at its stage boundary and recorded on the document.
#[derive(Debug, Error)]
pub enum DviError {
    /// An error originating from I/O operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file does not start with a usable preamble.
    #[error("Bad preamble: {0}")]
    BadPreamble(String),

    /// The trailer at the end of the file is not laid out as expected.
    #[error("Malformed trailer: {0}")]
    MalformedTrailer(String),

    /// The trailer pointer does not address a POST opcode.
    #[error("Postamble not found at offset {offset}: found byte {found:#04x} instead of POST")]
    PostambleNotFound { offset: u32, found: u8 },

    /// The postamble ended before the POST_POST marker.
    #[error("Truncated postamble: {0}")]
    TruncatedPostamble(String),

    /// The reverse-linked chain of BOP records is broken.
    #[error("Corrupt page chain at offset {offset}: {reason}")]
    CorruptPageChain { offset: u32, reason: String },

    /// A read needed more bytes than the buffer holds.
    #[error("Truncated input at offset {offset}: needed {needed} bytes, {remaining} remaining")]
    TruncatedInput {
        offset: usize,
        needed: usize,
        remaining: usize,
    },

    /// A seek target lies outside the buffer.
    #[error("Position {position} is out of bounds for a buffer of {len} bytes")]
    OutOfBounds { position: i64, len: usize },

    /// An opcode that is not allowed in the current context.
    #[error("Unexpected opcode {opcode} at offset {offset} in {context}")]
    UnexpectedOpcode {
        opcode: u8,
        offset: usize,
        context: &'static str,
    },

    /// The number of reachable pages differs from the postamble's count.
    #[error("Postamble declares {declared} pages but {found} were found in the page chain")]
    PageCountMismatch { declared: u16, found: usize },
}

impl DviError {
    /// Whether decoding can continue with a degraded document after this error.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, DviError::BadPreamble(_) | DviError::Io(_))
    }
}

/// A convenience `Result` type alias using the crate's `DviError` type.
pub type Result<T> = std::result::Result<T, DviError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_kinds() {
        assert!(!DviError::BadPreamble("x".into()).is_recoverable());
        assert!(DviError::MalformedTrailer("x".into()).is_recoverable());
        assert!(DviError::PostambleNotFound { offset: 4, found: 0 }.is_recoverable());
        assert!(DviError::OutOfBounds { position: -1, len: 3 }.is_recoverable());
        assert!(DviError::PageCountMismatch { declared: 3, found: 2 }.is_recoverable());
    }

    #[test]
    fn test_display() {
        let e = DviError::CorruptPageChain {
            offset: 120,
            reason: "cycle".into(),
        };
        let s = e.to_string();
        assert!(s.contains("120"));
        assert!(s.contains("cycle"));
    }
}
