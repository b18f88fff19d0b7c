//! L5X component export and conflict-aware import.
//!
//! The primary interface is the `l5x` binary. This library holds the engine:
//! dependency closure over a project's types, AOIs, tags, and alarm
//! definitions; self-contained export documents built from that closure; and
//! an import dispatcher that merges export documents back into a project
//! under a conflict policy.
//!
//! ```no_run
//! use std::path::Path;
//! use l5x_merge::{ExportOptions, ImportOptions, Policy, Project, export, merge};
//!
//! # fn main() -> Result<(), l5x_merge::MergeError> {
//! let source = Project::load(Path::new("Line4.L5X"))?;
//! let doc = export::export_data_type(&source, "Motor", &ExportOptions::default())?;
//!
//! let mut dest = Project::load(Path::new("Line5.L5X"))?;
//! let result = merge::import_component(&mut dest, &doc, Policy::Skip, &ImportOptions::default())?;
//! assert!(result.success);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod document;
pub mod error;
pub mod export;
pub mod logic;
pub mod merge;
pub mod model;
pub mod project;
pub mod schema;

pub use config::L5xConfig;
pub use document::ExportDocument;
pub use error::MergeError;
pub use export::ExportOptions;
pub use merge::ImportOptions;
pub use model::{ExportKind, ImportResult, Policy, Scope};
pub use project::Project;
