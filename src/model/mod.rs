//! Data model shared by the export and import sides.

pub mod result;
pub mod types;

pub use result::{Conflict, ConflictKind, ImportCounts, ImportResult};
pub use types::{ComponentKind, ExportKind, ExportMetadata, Policy, Scope, TargetType};
