//! Core vocabulary: component kinds, export kinds, the wire `TargetType`,
//! merge policies, and export metadata.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::schema;

// ---------------------------------------------------------------------------
// ComponentKind
// ---------------------------------------------------------------------------

/// A category of named component that the merge engine compares and inserts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ComponentKind {
    /// User-defined structure (`DataType`).
    #[serde(rename = "udt")]
    DataType,
    /// Add-On Instruction definition.
    #[serde(rename = "aoi")]
    AddOnInstruction,
    #[serde(rename = "tag")]
    Tag,
    #[serde(rename = "routine")]
    Routine,
    #[serde(rename = "program")]
    Program,
}

impl ComponentKind {
    /// Element name of one component of this kind.
    #[must_use]
    pub const fn element(self) -> &'static str {
        match self {
            Self::DataType => schema::DATA_TYPE,
            Self::AddOnInstruction => schema::AOI_DEFINITION,
            Self::Tag => schema::TAG,
            Self::Routine => schema::ROUTINE,
            Self::Program => schema::PROGRAM,
        }
    }

    /// Element name of the container holding components of this kind.
    #[must_use]
    pub const fn container(self) -> &'static str {
        match self {
            Self::DataType => schema::DATA_TYPES,
            Self::AddOnInstruction => schema::AOI_DEFINITIONS,
            Self::Tag => schema::TAGS,
            Self::Routine => schema::ROUTINES,
            Self::Program => schema::PROGRAMS,
        }
    }

    /// Prefix used in skipped-item labels and conflict descriptions.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::DataType => "UDT",
            Self::AddOnInstruction => "AOI",
            Self::Tag => "Tag",
            Self::Routine => "Routine",
            Self::Program => "Program",
        }
    }

    /// `true` for kinds whose conflicts are decided by name alone.
    #[must_use]
    pub const fn is_name_only(self) -> bool {
        matches!(self, Self::Routine | Self::Program)
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::DataType => "udt",
            Self::AddOnInstruction => "aoi",
            Self::Tag => "tag",
            Self::Routine => "routine",
            Self::Program => "program",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// TargetType
// ---------------------------------------------------------------------------

/// The `TargetType` discriminator on an export document's root.
///
/// Tag exports travel as `Rung` documents with `TargetCount="0"`, so tags
/// have no variant of their own here; see [`ExportKind`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TargetType {
    Rung,
    Routine,
    Program,
    DataType,
    AddOnInstructionDefinition,
}

impl TargetType {
    /// The attribute value as written in L5X.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rung => "Rung",
            Self::Routine => "Routine",
            Self::Program => "Program",
            Self::DataType => "DataType",
            Self::AddOnInstructionDefinition => "AddOnInstructionDefinition",
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Rung" => Ok(Self::Rung),
            "Routine" => Ok(Self::Routine),
            "Program" => Ok(Self::Program),
            "DataType" => Ok(Self::DataType),
            "AddOnInstructionDefinition" => Ok(Self::AddOnInstructionDefinition),
            other => Err(ParseError::new("TargetType", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// ExportKind
// ---------------------------------------------------------------------------

/// What an export document carries, as seen by a user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExportKind {
    Rung,
    Routine,
    Program,
    Tag,
    DataType,
    AddOnInstruction,
}

impl ExportKind {
    /// The wire discriminator for this kind.
    #[must_use]
    pub const fn target_type(self) -> TargetType {
        match self {
            Self::Rung | Self::Tag => TargetType::Rung,
            Self::Routine => TargetType::Routine,
            Self::Program => TargetType::Program,
            Self::DataType => TargetType::DataType,
            Self::AddOnInstruction => TargetType::AddOnInstructionDefinition,
        }
    }

    /// Suffix used in generated file names (`Motor_DataType.L5X`).
    #[must_use]
    pub const fn file_suffix(self) -> &'static str {
        match self {
            Self::Rung => "Rung",
            Self::Routine => "Routine",
            Self::Program => "Program",
            Self::Tag => "Tag",
            Self::DataType => "DataType",
            Self::AddOnInstruction => "AddOnInstruction",
        }
    }
}

impl fmt::Display for ExportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_suffix())
    }
}

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// How an import treats an incoming component that differs from an
/// existing one of the same name.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Policy {
    /// Record the conflict and change nothing. Imports under this policy
    /// are dry runs.
    #[default]
    Report,
    /// Leave the existing component in place and note the name as skipped.
    Skip,
    /// Replace the existing component in its current position.
    Overwrite,
    /// Record the conflict and stop the whole import immediately.
    Fail,
}

impl Policy {
    pub const ALL: [Self; 4] = [Self::Report, Self::Skip, Self::Overwrite, Self::Fail];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Report => "report",
            Self::Skip => "skip",
            Self::Overwrite => "overwrite",
            Self::Fail => "fail",
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Policy {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseError::new("policy", s))
    }
}

// ---------------------------------------------------------------------------
// Scope
// ---------------------------------------------------------------------------

/// Where a tag or routine lives: directly under the controller, or inside
/// a program.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Scope {
    Controller,
    /// Program scope, in the named program.
    Program(String),
}

impl Scope {
    /// The program name for program scope.
    #[must_use]
    pub fn program(&self) -> Option<&str> {
        match self {
            Self::Controller => None,
            Self::Program(p) => Some(p),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Controller => f.write_str("controller"),
            Self::Program(p) => write!(f, "program '{p}'"),
        }
    }
}

// ---------------------------------------------------------------------------
// ExportMetadata
// ---------------------------------------------------------------------------

/// Controller identity written into every export shell.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExportMetadata {
    #[serde(default = "default_controller_name")]
    pub controller_name: String,
    #[serde(default = "default_processor_type")]
    pub processor_type: String,
    #[serde(default = "default_major_rev")]
    pub major_rev: String,
    #[serde(default = "default_minor_rev")]
    pub minor_rev: String,
    #[serde(default = "default_software_revision")]
    pub software_revision: String,
}

impl Default for ExportMetadata {
    fn default() -> Self {
        Self {
            controller_name: default_controller_name(),
            processor_type: default_processor_type(),
            major_rev: default_major_rev(),
            minor_rev: default_minor_rev(),
            software_revision: default_software_revision(),
        }
    }
}

fn default_controller_name() -> String {
    "Exported".to_owned()
}

fn default_processor_type() -> String {
    "1769-L33ER".to_owned()
}

fn default_major_rev() -> String {
    "37".to_owned()
}

fn default_minor_rev() -> String {
    "11".to_owned()
}

fn default_software_revision() -> String {
    "37.01".to_owned()
}

// ---------------------------------------------------------------------------
// ParseError
// ---------------------------------------------------------------------------

/// A string did not name a known variant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseError {
    /// What was being parsed.
    pub what: &'static str,
    /// The rejected input.
    pub value: String,
}

impl ParseError {
    fn new(what: &'static str, value: &str) -> Self {
        Self {
            what,
            value: value.to_owned(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: {:?}", self.what, self.value)
    }
}

impl std::error::Error for ParseError {}
