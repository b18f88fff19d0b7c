//! Import outcomes.
//!
//! An [`ImportResult`] is built fresh for every import or analysis call and
//! handed back to the caller. It serializes to the JSON shape the CLI prints:
//!
//! ```json
//! {
//!   "success": false,
//!   "conflict_count": 1,
//!   "conflicts": [{
//!     "category": "udt",
//!     "name": "Motor",
//!     "conflict_type": "definition_mismatch",
//!     "description": "UDT 'Motor' exists in the project with a different definition.",
//!     "source_detail": "Import: Speed:REAL, Run:BOOL",
//!     "target_detail": "Project: Speed:REAL"
//!   }],
//!   "imported": { "rungs": 0, "tags": 0, "udts": 0, "aois": 0, "routines": 0, "programs": 0 },
//!   "skipped": []
//! }
//! ```

use serde::{Serialize, Serializer};

use super::types::ComponentKind;

// ---------------------------------------------------------------------------
// Conflict
// ---------------------------------------------------------------------------

/// Why an incoming component clashes with an existing one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    /// Same name, structurally different definition.
    DefinitionMismatch,
    /// Same name; the kind is compared by name only.
    NameExists,
}

/// One detected clash between an incoming and an existing component.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Conflict {
    pub category: ComponentKind,
    /// Component name; program tags are qualified as `Program.Tag`.
    pub name: String,
    #[serde(rename = "conflict_type")]
    pub kind: ConflictKind,
    pub description: String,
    /// Summary of what the import document carries.
    pub source_detail: String,
    /// Summary of what the project already has.
    pub target_detail: String,
}

// ---------------------------------------------------------------------------
// ImportCounts
// ---------------------------------------------------------------------------

/// Number of components inserted (or overwritten) per category.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ImportCounts {
    pub rungs: usize,
    pub tags: usize,
    pub udts: usize,
    pub aois: usize,
    pub routines: usize,
    pub programs: usize,
}

impl ImportCounts {
    /// Count one more component of `kind`.
    pub const fn bump(&mut self, kind: ComponentKind) {
        match kind {
            ComponentKind::DataType => self.udts += 1,
            ComponentKind::AddOnInstruction => self.aois += 1,
            ComponentKind::Tag => self.tags += 1,
            ComponentKind::Routine => self.routines += 1,
            ComponentKind::Program => self.programs += 1,
        }
    }

    /// The count for `kind`.
    #[must_use]
    pub const fn get(&self, kind: ComponentKind) -> usize {
        match kind {
            ComponentKind::DataType => self.udts,
            ComponentKind::AddOnInstruction => self.aois,
            ComponentKind::Tag => self.tags,
            ComponentKind::Routine => self.routines,
            ComponentKind::Program => self.programs,
        }
    }

    /// Everything inserted, rungs included.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.rungs + self.tags + self.udts + self.aois + self.routines + self.programs
    }
}

// ---------------------------------------------------------------------------
// ImportResult
// ---------------------------------------------------------------------------

/// Outcome of one import or analysis call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportResult {
    /// `false` once a `fail`-policy conflict aborted the import, or (for
    /// analysis) when any conflict was found.
    pub success: bool,
    /// Conflicts in the order they were encountered.
    pub conflicts: Vec<Conflict>,
    pub imported: ImportCounts,
    /// Labels of items left untouched (`UDT:Motor`, `Tag:Main.Count`, ...).
    pub skipped: Vec<String>,
}

impl Default for ImportResult {
    fn default() -> Self {
        Self {
            success: true,
            conflicts: Vec::new(),
            imported: ImportCounts::default(),
            skipped: Vec::new(),
        }
    }
}

impl ImportResult {
    #[must_use]
    pub fn conflict_count(&self) -> usize {
        self.conflicts.len()
    }

    /// `true` if no conflicts were recorded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty()
    }
}

impl Serialize for ImportResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Wire<'a> {
            success: bool,
            conflict_count: usize,
            conflicts: &'a [Conflict],
            imported: &'a ImportCounts,
            skipped: &'a [String],
        }

        Wire {
            success: self.success,
            conflict_count: self.conflicts.len(),
            conflicts: &self.conflicts,
            imported: &self.imported,
            skipped: &self.skipped,
        }
        .serialize(serializer)
    }
}
