//! Tool configuration (`l5x.toml`).
//!
//! Every field is optional. A missing file yields all defaults.
//!
//! ```toml
//! [export]
//! output_dir = "exports"
//! include_dependencies = true
//!
//! [export.metadata]
//! controller_name = "Line4"
//!
//! [import]
//! policy = "skip"
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::model::{ExportMetadata, Policy};
use crate::schema;

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "l5x.toml";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct L5xConfig {
    #[serde(default)]
    pub export: ExportConfig,

    #[serde(default)]
    pub import: ImportConfig,
}

// ---------------------------------------------------------------------------
// ExportConfig
// ---------------------------------------------------------------------------

/// Settings for building export documents.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExportConfig {
    /// Directory for generated file names (default: `"."`).
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Pull referenced tags, types, and definitions in as context
    /// (default: `true`).
    #[serde(default = "default_true")]
    pub include_dependencies: bool,

    /// `ExportOptions` attribute written on the export root.
    #[serde(default = "default_export_options")]
    pub export_options: String,

    /// Controller identity used when no source project supplies one.
    #[serde(default)]
    pub metadata: ExportMetadata,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            include_dependencies: true,
            export_options: default_export_options(),
            metadata: ExportMetadata::default(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

const fn default_true() -> bool {
    true
}

fn default_export_options() -> String {
    schema::DEFAULT_EXPORT_OPTIONS.to_owned()
}

// ---------------------------------------------------------------------------
// ImportConfig
// ---------------------------------------------------------------------------

/// Settings for imports.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImportConfig {
    /// Conflict policy when none is given on the command line
    /// (default: `report`).
    #[serde(default)]
    pub policy: Policy,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Error loading configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    /// The file being loaded, when known.
    pub path: Option<PathBuf>,
    /// Message with a line number when the parser supplies a span.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(p) = &self.path {
            write!(f, "{}: {}", p.display(), self.message)
        } else {
            write!(f, "config error: {}", self.message)
        }
    }
}

impl std::error::Error for ConfigError {}

impl L5xConfig {
    /// Load configuration from a TOML file; a missing file yields defaults.
    ///
    /// # Errors
    /// Returns `ConfigError` on I/O errors (other than not-found) or parse errors.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ConfigError {
                    path: Some(path.to_owned()),
                    message: format!("could not read file: {e}"),
                });
            }
        };
        Self::parse(&contents).map_err(|mut e| {
            e.path = Some(path.to_owned());
            e
        })
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `ConfigError` on invalid TOML or unknown fields.
    pub fn parse(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| {
            let mut message = e.message().to_owned();
            if let Some(span) = e.span() {
                let line = toml_str[..span.start]
                    .chars()
                    .filter(|&c| c == '\n')
                    .count()
                    + 1;
                message = format!("line {line}: {message}");
            }
            ConfigError {
                path: None,
                message,
            }
        })
    }
}
