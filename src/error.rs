//! Error type for export and import operations.
//!
//! Every variant here is fatal: the call that produced it stopped before
//! finishing. Conflicts between an incoming component and the destination
//! project are *not* errors; they are recorded in an
//! [`ImportResult`](crate::model::result::ImportResult) instead.

use std::path::PathBuf;

use l5x_doc::DocError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors returned by the export and import operations.
#[derive(Debug, Error)]
pub enum MergeError {
    /// A named program, routine, rung, tag, or definition does not exist.
    #[error("{what} '{name}' not found")]
    NotFound {
        /// What was being looked up (`"program"`, `"rung"`, ...).
        what: &'static str,
        /// The name (or qualified name) that was requested.
        name: String,
    },

    /// A document lacks structure it is required to have.
    #[error("malformed document: {message}")]
    Malformed {
        /// What is missing or wrong.
        message: String,
    },

    /// The export document's `TargetType` is not one this engine handles.
    #[error(
        "unsupported TargetType '{target_type}' (expected one of: Rung, Routine, Program, \
         DataType, AddOnInstructionDefinition)"
    )]
    Unsupported {
        /// The discriminator found on the document root.
        target_type: String,
    },

    /// A rung operation was aimed at a routine that is not ladder logic.
    #[error("routine '{routine}' is a {found} routine, not ladder (RLL)")]
    NotLadder {
        /// The routine name.
        routine: String,
        /// Its actual routine type.
        found: String,
    },

    /// Reading, parsing, or writing a document failed.
    #[error(transparent)]
    Document(#[from] DocError),

    /// `l5x.toml` could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Filesystem failure outside document I/O (creating output directories).
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MergeError {
    pub(crate) fn not_found(what: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            what,
            name: name.into(),
        }
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }
}
