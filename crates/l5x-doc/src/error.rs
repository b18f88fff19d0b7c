//! Error types for document parsing and persistence.

use std::path::PathBuf;

use thiserror::Error;

/// Errors returned while reading, parsing, or writing a [`Document`](crate::Document).
#[derive(Debug, Error)]
pub enum DocError {
    /// The file could not be read or written.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// The file being accessed.
        path: PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The XML parser rejected the input.
    #[error("malformed XML at byte {position}: {message}")]
    Xml {
        /// Byte offset reported by the parser.
        position: u64,
        /// Parser message.
        message: String,
    },

    /// An element was opened but never closed, or closed twice.
    #[error("unbalanced element `{name}`: {message}")]
    Unbalanced {
        /// The element whose nesting is broken.
        name: String,
        /// What went wrong.
        message: String,
    },

    /// The input contained no root element at all.
    #[error("document has no root element")]
    EmptyDocument,

    /// The root element is not the one the caller expected.
    #[error("expected root element `{expected}`, found `{found}`")]
    UnexpectedRoot {
        /// The required root element name.
        expected: String,
        /// The root element actually present.
        found: String,
    },

    /// Serialization failed.
    #[error("failed to serialize XML: {message}")]
    Write {
        /// Writer message.
        message: String,
    },
}
