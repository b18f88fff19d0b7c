//! Typed access to a loaded L5X project.
//!
//! A [`Project`] is an `RSLogix5000Content` document split at its
//! `Controller` element so the controller can be borrowed without a lookup
//! that might fail. Export documents share the same shape, so the import
//! side reads them through this type too.

use std::path::Path;

use l5x_doc::{Document, Element};

use crate::error::MergeError;
use crate::model::{ComponentKind, ExportMetadata, Scope};
use crate::schema;

// ---------------------------------------------------------------------------
// Project
// ---------------------------------------------------------------------------

/// A loaded project (or export document).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Project {
    /// The root element with the controller removed.
    root: Element,
    controller: Element,
    /// Where the controller sits among the root's children.
    controller_index: usize,
}

impl Project {
    /// Split a parsed document into root and controller.
    ///
    /// # Errors
    /// [`MergeError::Document`] if the root is not `RSLogix5000Content`,
    /// [`MergeError::Malformed`] if there is no `Controller`.
    pub fn from_document(doc: Document) -> Result<Self, MergeError> {
        doc.expect_root(schema::ROOT)?;
        let mut root = doc.into_root();
        let controller_index = root
            .children()
            .iter()
            .position(|c| c.name() == schema::CONTROLLER)
            .ok_or_else(|| MergeError::malformed("document has no <Controller> element"))?;
        let controller = root
            .remove_child(controller_index)
            .ok_or_else(|| MergeError::malformed("document has no <Controller> element"))?;
        Ok(Self {
            root,
            controller,
            controller_index,
        })
    }

    /// Assemble from a root (without controller) and a controller, which is
    /// appended after the root's existing children.
    pub(crate) fn from_parts(root: Element, controller: Element) -> Self {
        let controller_index = root.child_count();
        Self {
            root,
            controller,
            controller_index,
        }
    }

    /// Load and validate an `.L5X` file.
    pub fn load(path: &Path) -> Result<Self, MergeError> {
        let project = Self::from_document(Document::load(path)?)?;
        tracing::info!(
            path = %path.display(),
            controller = project.controller_name(),
            "loaded project"
        );
        Ok(project)
    }

    /// Parse L5X text.
    pub fn parse(xml: &str) -> Result<Self, MergeError> {
        Self::from_document(Document::parse(xml)?)
    }

    /// Reassemble the full document.
    #[must_use]
    pub fn to_document(&self) -> Document {
        self.clone().into_document()
    }

    /// Reassemble the full document, consuming the project.
    #[must_use]
    pub fn into_document(self) -> Document {
        let mut root = self.root;
        root.insert_child(self.controller_index, self.controller);
        Document::new(root)
    }

    /// Write the project back to disk (BOM, CRLF, CDATA preserved).
    pub fn save(&self, path: &Path) -> Result<(), MergeError> {
        self.to_document().save(path)?;
        tracing::info!(path = %path.display(), "saved project");
        Ok(())
    }

    // -- root and controller ------------------------------------------------

    /// Attribute of the `RSLogix5000Content` root.
    #[must_use]
    pub fn root_attr(&self, key: &str) -> Option<&str> {
        self.root.attr(key)
    }

    #[must_use]
    pub const fn controller(&self) -> &Element {
        &self.controller
    }

    pub const fn controller_mut(&mut self) -> &mut Element {
        &mut self.controller
    }

    /// The controller's `Name`.
    #[must_use]
    pub fn controller_name(&self) -> &str {
        self.controller.component_name()
    }

    /// Controller identity, with the built-in defaults for anything absent.
    #[must_use]
    pub fn metadata(&self) -> ExportMetadata {
        self.metadata_or(&ExportMetadata::default())
    }

    /// Controller identity, falling back to `defaults` per field.
    #[must_use]
    pub fn metadata_or(&self, defaults: &ExportMetadata) -> ExportMetadata {
        fn pick(value: Option<&str>, fallback: &str) -> String {
            value
                .filter(|v| !v.is_empty())
                .unwrap_or(fallback)
                .to_owned()
        }

        let c = &self.controller;
        ExportMetadata {
            controller_name: pick(c.attr("Name"), &defaults.controller_name),
            processor_type: pick(c.attr("ProcessorType"), &defaults.processor_type),
            major_rev: pick(c.attr("MajorRev"), &defaults.major_rev),
            minor_rev: pick(c.attr("MinorRev"), &defaults.minor_rev),
            software_revision: pick(
                self.root.attr("SoftwareRevision"),
                &defaults.software_revision,
            ),
        }
    }

    // -- generic component access -------------------------------------------

    /// The container for `kind` in `scope`, if present.
    ///
    /// Data types, AOIs, and programs only exist at controller scope;
    /// routines only in a program. Asking for any other pairing returns the
    /// container of that name anyway, which normally does not exist.
    #[must_use]
    pub fn container(&self, kind: ComponentKind, scope: &Scope) -> Option<&Element> {
        match scope {
            Scope::Controller => self.controller.child(kind.container()),
            Scope::Program(p) => self.find_program(p)?.child(kind.container()),
        }
    }

    /// The container for `kind` in `scope`, created at its canonical
    /// position if missing.
    ///
    /// # Errors
    /// [`MergeError::NotFound`] if `scope` names a program that does not exist.
    pub fn container_mut(
        &mut self,
        kind: ComponentKind,
        scope: &Scope,
    ) -> Result<&mut Element, MergeError> {
        match scope {
            Scope::Controller => Ok(self
                .controller
                .find_or_create_in_order(kind.container(), schema::CONTROLLER_CHILD_ORDER)),
            Scope::Program(p) => Ok(self
                .program_mut(p)?
                .find_or_create_in_order(kind.container(), schema::PROGRAM_CHILD_ORDER)),
        }
    }

    /// Every component of `kind` in `scope`, in document order.
    pub fn components(&self, kind: ComponentKind, scope: &Scope) -> impl Iterator<Item = &Element> {
        self.container(kind, scope)
            .into_iter()
            .flat_map(move |c| c.children_named(kind.element()))
    }

    /// Case-insensitive lookup of one component.
    #[must_use]
    pub fn find(&self, kind: ComponentKind, scope: &Scope, name: &str) -> Option<&Element> {
        self.container(kind, scope)?
            .find_named(kind.element(), name)
    }

    // -- typed lookups ------------------------------------------------------

    #[must_use]
    pub fn find_data_type(&self, name: &str) -> Option<&Element> {
        self.find(ComponentKind::DataType, &Scope::Controller, name)
    }

    /// # Errors
    /// [`MergeError::NotFound`] if there is no such data type.
    pub fn data_type(&self, name: &str) -> Result<&Element, MergeError> {
        self.find_data_type(name)
            .ok_or_else(|| MergeError::not_found("data type", name))
    }

    #[must_use]
    pub fn find_aoi(&self, name: &str) -> Option<&Element> {
        self.find(ComponentKind::AddOnInstruction, &Scope::Controller, name)
    }

    /// # Errors
    /// [`MergeError::NotFound`] if there is no such definition.
    pub fn aoi(&self, name: &str) -> Result<&Element, MergeError> {
        self.find_aoi(name)
            .ok_or_else(|| MergeError::not_found("add-on instruction", name))
    }

    #[must_use]
    pub fn find_program(&self, name: &str) -> Option<&Element> {
        self.controller
            .child(schema::PROGRAMS)?
            .find_named(schema::PROGRAM, name)
    }

    /// # Errors
    /// [`MergeError::NotFound`] if there is no such program.
    pub fn program(&self, name: &str) -> Result<&Element, MergeError> {
        self.find_program(name)
            .ok_or_else(|| MergeError::not_found("program", name))
    }

    /// # Errors
    /// [`MergeError::NotFound`] if there is no such program.
    pub fn program_mut(&mut self, name: &str) -> Result<&mut Element, MergeError> {
        self.controller
            .child_mut(schema::PROGRAMS)
            .and_then(|p| p.find_named_mut(schema::PROGRAM, name))
            .ok_or_else(|| MergeError::not_found("program", name))
    }

    /// A routine inside a program.
    ///
    /// # Errors
    /// [`MergeError::NotFound`] naming whichever of the two is missing.
    pub fn routine(&self, program: &str, routine: &str) -> Result<&Element, MergeError> {
        self.program(program)?
            .child(schema::ROUTINES)
            .and_then(|r| r.find_named(schema::ROUTINE, routine))
            .ok_or_else(|| MergeError::not_found("routine", format!("{program}/{routine}")))
    }

    /// Mutable form of [`Project::routine`].
    ///
    /// # Errors
    /// [`MergeError::NotFound`] naming whichever of the two is missing.
    pub fn routine_mut(&mut self, program: &str, routine: &str) -> Result<&mut Element, MergeError> {
        self.program_mut(program)?
            .child_mut(schema::ROUTINES)
            .and_then(|r| r.find_named_mut(schema::ROUTINE, routine))
            .ok_or_else(|| MergeError::not_found("routine", format!("{program}/{routine}")))
    }

    /// A tag at controller or program scope.
    ///
    /// # Errors
    /// [`MergeError::NotFound`] if the program (for program scope) or the
    /// tag is missing.
    pub fn tag(&self, name: &str, scope: &Scope) -> Result<&Element, MergeError> {
        if let Scope::Program(p) = scope {
            self.program(p)?;
        }
        self.find(ComponentKind::Tag, scope, name).ok_or_else(|| {
            let qualified = match scope {
                Scope::Controller => name.to_owned(),
                Scope::Program(p) => format!("{p}.{name}"),
            };
            MergeError::not_found("tag", qualified)
        })
    }

    /// Alarm definitions (`DatatypeAlarmDefinition`), in document order.
    pub fn alarm_definitions(&self) -> impl Iterator<Item = &Element> {
        self.controller
            .child(schema::ALARM_DEFINITIONS)
            .into_iter()
            .flat_map(|c| c.children_named(schema::ALARM_DEFINITION))
    }
}

// ---------------------------------------------------------------------------
// Routine helpers
// ---------------------------------------------------------------------------

const CONTENT_TYPES: &[(&str, &str)] = &[
    ("RLLContent", "RLL"),
    ("STContent", "ST"),
    ("FBDContent", "FBD"),
    ("SFCContent", "SFC"),
];

/// A routine's language: its `Type` attribute, else inferred from its
/// content element, else `"RLL"`.
#[must_use]
pub fn routine_type(routine: &Element) -> &str {
    if let Some(explicit) = routine.attr("Type").filter(|t| !t.is_empty()) {
        return explicit;
    }
    CONTENT_TYPES
        .iter()
        .find(|(content, _)| routine.child(content).is_some())
        .map_or("RLL", |&(_, ty)| ty)
}

/// Content element name for a routine language (`ST` → `STContent`).
/// Unknown languages get ladder content.
#[must_use]
pub fn content_element(routine_type: &str) -> &'static str {
    CONTENT_TYPES
        .iter()
        .find(|(_, ty)| ty.eq_ignore_ascii_case(routine_type))
        .map_or(schema::RLL_CONTENT, |&(content, _)| content)
}

// ---------------------------------------------------------------------------
// Timestamps
// ---------------------------------------------------------------------------

/// Current UTC time in the AOI `EditedDate` format.
#[must_use]
pub fn edited_timestamp() -> String {
    chrono::Utc::now()
        .format(schema::EDITED_DATE_FORMAT)
        .to_string()
}

/// Set an AOI definition's `EditedDate` to now.
pub fn touch_edited_date(aoi: &mut Element) {
    aoi.set_attr("EditedDate", edited_timestamp());
}
