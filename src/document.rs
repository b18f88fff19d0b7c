//! Export documents.
//!
//! An export is an ordinary L5X document whose root carries a `TargetType`
//! discriminator and whose components are each marked `Use="Target"` or
//! `Use="Context"`. [`ExportDocument`] is a [`Project`] whose discriminator
//! has been checked against the closed set of [`TargetType`]s, so the import
//! dispatcher can match on it exhaustively.

use std::path::Path;

use l5x_doc::{Document, Element};

use crate::error::MergeError;
use crate::model::{ComponentKind, ExportKind, Scope, TargetType};
use crate::project::Project;
use crate::schema;

/// A parsed export document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportDocument {
    project: Project,
    target_type: TargetType,
}

impl ExportDocument {
    pub(crate) const fn new(project: Project, target_type: TargetType) -> Self {
        Self {
            project,
            target_type,
        }
    }

    /// Validate the discriminator of an already-split project.
    ///
    /// # Errors
    /// [`MergeError::Unsupported`] if `TargetType` is missing or unknown.
    pub fn from_project(project: Project) -> Result<Self, MergeError> {
        let raw = project.root_attr(schema::TARGET_TYPE_ATTR).unwrap_or("");
        let target_type = raw
            .parse::<TargetType>()
            .map_err(|_| MergeError::Unsupported {
                target_type: raw.to_owned(),
            })?;
        Ok(Self::new(project, target_type))
    }

    /// # Errors
    /// As [`Project::from_document`] and [`ExportDocument::from_project`].
    pub fn from_document(doc: Document) -> Result<Self, MergeError> {
        Self::from_project(Project::from_document(doc)?)
    }

    /// Load an export file.
    ///
    /// # Errors
    /// Document errors, a missing controller, or an unsupported `TargetType`.
    pub fn load(path: &Path) -> Result<Self, MergeError> {
        let doc = Self::from_project(Project::load(path)?)?;
        tracing::debug!(
            path = %path.display(),
            target_type = %doc.target_type,
            "loaded export document"
        );
        Ok(doc)
    }

    /// # Errors
    /// As [`ExportDocument::load`].
    pub fn parse(xml: &str) -> Result<Self, MergeError> {
        Self::from_project(Project::parse(xml)?)
    }

    /// The document viewed as a project.
    #[must_use]
    pub const fn source(&self) -> &Project {
        &self.project
    }

    #[must_use]
    pub fn into_project(self) -> Project {
        self.project
    }

    #[must_use]
    pub const fn target_type(&self) -> TargetType {
        self.target_type
    }

    /// The root's `TargetName`, if any.
    #[must_use]
    pub fn target_name(&self) -> Option<&str> {
        self.project
            .root_attr(schema::TARGET_NAME_ATTR)
            .filter(|n| !n.is_empty())
    }

    /// What the document carries. A `Rung` document with `TargetCount="0"`
    /// and a target tag is a tag export.
    #[must_use]
    pub fn kind(&self) -> ExportKind {
        match self.target_type {
            TargetType::Rung => {
                let no_rungs = self.project.root_attr("TargetCount") == Some("0");
                if no_rungs && self.target_tag().is_some() {
                    ExportKind::Tag
                } else {
                    ExportKind::Rung
                }
            }
            TargetType::Routine => ExportKind::Routine,
            TargetType::Program => ExportKind::Program,
            TargetType::DataType => ExportKind::DataType,
            TargetType::AddOnInstructionDefinition => ExportKind::AddOnInstruction,
        }
    }

    /// Name used to derive an output file name.
    ///
    /// Rung exports use `<Routine>Rungs`; tag exports use the tag name;
    /// everything else uses `TargetName`.
    #[must_use]
    pub fn base_name(&self) -> String {
        match self.kind() {
            ExportKind::Rung => {
                let routine = self.wrapper_routine().map_or("", Element::component_name);
                format!("{routine}Rungs")
            }
            ExportKind::Tag => self
                .target_tag()
                .map(|(_, tag)| tag.component_name().to_owned())
                .unwrap_or_default(),
            _ => self.target_name().unwrap_or_default().to_owned(),
        }
    }

    /// The wrapper program of a `Rung` or `Routine` export, or the target
    /// program of a `Program` export: the first program in the document.
    #[must_use]
    pub fn wrapper_program(&self) -> Option<&Element> {
        self.project
            .components(ComponentKind::Program, &Scope::Controller)
            .next()
    }

    /// The first routine of the wrapper program.
    #[must_use]
    pub fn wrapper_routine(&self) -> Option<&Element> {
        self.wrapper_program()?
            .child(schema::ROUTINES)?
            .children_named(schema::ROUTINE)
            .next()
    }

    /// The tag marked `Use="Target"`, looked up at controller scope and then
    /// in the wrapper program, with its scope.
    #[must_use]
    pub fn target_tag(&self) -> Option<(Scope, &Element)> {
        let marked = |tag: &&Element| is_target(tag);
        if let Some(tag) = self
            .project
            .components(ComponentKind::Tag, &Scope::Controller)
            .find(marked)
        {
            return Some((Scope::Controller, tag));
        }
        let program = self.wrapper_program()?;
        let scope = Scope::Program(program.component_name().to_owned());
        program
            .child(schema::TAGS)?
            .children_named(schema::TAG)
            .find(marked)
            .map(|tag| (scope, tag))
    }

    /// The primary target of `kind` at controller scope: the one marked
    /// `Use="Target"`, else the first of its kind.
    #[must_use]
    pub fn target(&self, kind: ComponentKind) -> Option<&Element> {
        let mut all = self.project.components(kind, &Scope::Controller).peekable();
        let first = all.peek().copied();
        all.find(|e| is_target(e)).or(first)
    }

    /// Reassemble the document.
    #[must_use]
    pub fn to_document(&self) -> Document {
        self.project.to_document()
    }

    /// Write the document (BOM, CRLF).
    ///
    /// # Errors
    /// [`MergeError::Document`] on serialization or I/O failure.
    pub fn save(&self, path: &Path) -> Result<(), MergeError> {
        self.to_document().save(path)?;
        Ok(())
    }
}

/// `true` if `element` carries `Use="Target"`.
#[must_use]
pub fn is_target(element: &Element) -> bool {
    element.attr(schema::USE_ATTR) == Some(schema::USE_TARGET)
}
