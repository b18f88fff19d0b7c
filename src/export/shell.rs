//! Export shell assembly.
//!
//! Every export document has the same skeleton:
//!
//! ```text
//! RSLogix5000Content  TargetType=… ContainsContext="true" …
//! └── Controller Use="Context"
//!     ├── DataTypes Use="Context"
//!     ├── AddOnInstructionDefinitions Use="Context"
//!     ├── AlarmDefinitions Use="Context"      (only when needed)
//!     ├── Tags Use="Context"
//!     └── Programs Use="Context"
//! ```
//!
//! Context components are copied from the source project in source order.
//! The target is either placed directly in its container (`DataType`, AOI,
//! `Program`, controller `Tag`) or inside a synthesized wrapper program and
//! routine (rungs, routines, program tags).

use std::collections::BTreeSet;

use l5x_doc::Element;

use super::ExportOptions;
use crate::document::ExportDocument;
use crate::merge::Closure;
use crate::model::{ComponentKind, ExportMetadata, Scope, TargetType};
use crate::project::{self, Project};
use crate::schema;

/// What an export carries as its target.
#[derive(Clone, Debug)]
pub enum ExportTarget {
    /// Selected rungs of a ladder routine, already renumbered.
    Rungs {
        program: String,
        routine: String,
        rungs: Vec<Element>,
    },
    Routine {
        program: String,
        routine: Element,
    },
    Program(Element),
    Tag {
        scope: Scope,
        tag: Element,
    },
    DataType(Element),
    AddOnInstruction(Element),
}

impl ExportTarget {
    const fn target_type(&self) -> TargetType {
        match self {
            Self::Rungs { .. } | Self::Tag { .. } => TargetType::Rung,
            Self::Routine { .. } => TargetType::Routine,
            Self::Program(_) => TargetType::Program,
            Self::DataType(_) => TargetType::DataType,
            Self::AddOnInstruction(_) => TargetType::AddOnInstructionDefinition,
        }
    }
}

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

/// Root attributes that vary per target.
#[derive(Debug, Default)]
pub(crate) struct Header {
    pub target_name: Option<String>,
    pub sub_type: Option<String>,
    pub class: Option<String>,
    pub count: Option<usize>,
    /// AOI exports only: `TargetRevision` and `TargetLastEdited`.
    pub revision: Option<(String, String)>,
}

/// The `RSLogix5000Content` root and an empty context controller.
pub(crate) fn skeleton(
    target_type: TargetType,
    header: Header,
    metadata: &ExportMetadata,
    export_options: &str,
) -> (Element, Element) {
    let mut root = Element::new(schema::ROOT)
        .with_attr("SchemaRevision", "1.0")
        .with_attr("SoftwareRevision", metadata.software_revision.as_str())
        .with_attr(schema::TARGET_TYPE_ATTR, target_type.as_str());
    if let Some(name) = header.target_name {
        root.set_attr(schema::TARGET_NAME_ATTR, name);
    }
    if let Some(sub_type) = header.sub_type {
        root.set_attr("TargetSubType", sub_type);
    }
    if let Some(class) = header.class {
        root.set_attr("TargetClass", class);
    }
    if let Some(count) = header.count {
        root.set_attr("TargetCount", count.to_string());
    }
    if let Some((revision, edited)) = header.revision {
        root.set_attr("TargetRevision", revision);
        root.set_attr("TargetLastEdited", edited);
    }
    root.set_attr("ContainsContext", "true");
    root.set_attr(
        "ExportDate",
        chrono::Local::now()
            .format(schema::EXPORT_DATE_FORMAT)
            .to_string(),
    );
    root.set_attr("ExportOptions", export_options);

    let mut controller = context(schema::CONTROLLER)
        .with_attr("Name", metadata.controller_name.as_str())
        .with_attr("ProcessorType", metadata.processor_type.as_str())
        .with_attr("MajorRev", metadata.major_rev.as_str())
        .with_attr("MinorRev", metadata.minor_rev.as_str());
    for container in [
        schema::DATA_TYPES,
        schema::AOI_DEFINITIONS,
        schema::TAGS,
        schema::PROGRAMS,
    ] {
        controller.push_child(context(container));
    }
    (root, controller)
}

/// An element marked `Use="Context"`.
pub(crate) fn context(name: &str) -> Element {
    Element::new(name).with_attr(schema::USE_ATTR, schema::USE_CONTEXT)
}

fn mark_target(element: &mut Element) {
    element.set_attr(schema::USE_ATTR, schema::USE_TARGET);
}

// ---------------------------------------------------------------------------
// build_export
// ---------------------------------------------------------------------------

/// Assemble an export of `target` with `closure` as context.
#[must_use]
pub fn build_export(
    source: &Project,
    target: ExportTarget,
    closure: &Closure,
    options: &ExportOptions,
) -> ExportDocument {
    let metadata = source.metadata_or(&options.metadata);
    let target_type = target.target_type();
    let edited = project::edited_timestamp();
    let header = header_for(&target, &edited);
    let (root, mut controller) = skeleton(target_type, header, &metadata, &options.export_options);

    copy_context(
        source,
        &mut controller,
        ComponentKind::DataType,
        &closure.data_types,
    );
    copy_context(
        source,
        &mut controller,
        ComponentKind::AddOnInstruction,
        &closure.aois,
    );
    copy_alarm_definitions(source, &mut controller, &closure.alarm_definitions);
    copy_context(
        source,
        &mut controller,
        ComponentKind::Tag,
        &closure.controller_tags,
    );

    place_target(source, &mut controller, target, closure);

    if target_type == TargetType::AddOnInstructionDefinition {
        let aois = controller
            .child_mut(schema::AOI_DEFINITIONS)
            .into_iter()
            .flat_map(|c| c.children_named_mut(schema::AOI_DEFINITION));
        for aoi in aois {
            aoi.set_attr("EditedDate", edited.as_str());
        }
    }

    tracing::debug!(
        %target_type,
        data_types = closure.data_types.len(),
        aois = closure.aois.len(),
        alarm_definitions = closure.alarm_definitions.len(),
        controller_tags = closure.controller_tags.len(),
        program_tags = closure.program_tags.len(),
        "built export shell"
    );
    ExportDocument::new(Project::from_parts(root, controller), target_type)
}

fn header_for(target: &ExportTarget, edited: &str) -> Header {
    match target {
        ExportTarget::Rungs { rungs, .. } => Header {
            count: Some(rungs.len()),
            ..Header::default()
        },
        ExportTarget::Tag { .. } => Header {
            count: Some(0),
            ..Header::default()
        },
        ExportTarget::Routine { routine, .. } => Header {
            target_name: Some(routine.component_name().to_owned()),
            sub_type: Some(project::routine_type(routine).to_owned()),
            class: Some("Standard".to_owned()),
            ..Header::default()
        },
        ExportTarget::Program(program) => Header {
            target_name: Some(program.component_name().to_owned()),
            class: Some(program.attr_or("Class", "Standard").to_owned()),
            ..Header::default()
        },
        ExportTarget::DataType(udt) => Header {
            target_name: Some(udt.component_name().to_owned()),
            ..Header::default()
        },
        ExportTarget::AddOnInstruction(aoi) => Header {
            target_name: Some(aoi.component_name().to_owned()),
            class: Some(aoi.attr_or("Class", "Standard").to_owned()),
            revision: Some((aoi.attr_or("Revision", "1.0").to_owned(), edited.to_owned())),
            ..Header::default()
        },
    }
}

/// Clone every controller-scope component of `kind` whose exact name is in
/// `names` into the shell's container, in source order.
fn copy_context(
    source: &Project,
    controller: &mut Element,
    kind: ComponentKind,
    names: &BTreeSet<String>,
) {
    if names.is_empty() {
        return;
    }
    let container = controller.find_or_create(kind.container());
    for component in source
        .components(kind, &Scope::Controller)
        .filter(|c| names.contains(c.component_name()))
    {
        container.push_child(component.clone());
    }
}

fn copy_alarm_definitions(source: &Project, controller: &mut Element, names: &BTreeSet<String>) {
    if names.is_empty() {
        return;
    }
    let container = controller.find_or_create_in_order(
        schema::ALARM_DEFINITIONS,
        schema::CONTROLLER_CHILD_ORDER,
    );
    container.set_attr(schema::USE_ATTR, schema::USE_CONTEXT);
    for def in source
        .alarm_definitions()
        .filter(|d| names.contains(d.component_name()))
    {
        container.push_child(def.clone());
    }
}

/// A `Program Use="Context"` wrapper named `program`, carrying the
/// program-scope tags of the closure when there are any.
fn wrapper_program(source: &Project, program: &str, program_tags: &BTreeSet<String>) -> Element {
    let mut wrapper = context(schema::PROGRAM).with_attr("Name", program);
    if !program_tags.is_empty() {
        let mut tags = context(schema::TAGS);
        let scope = Scope::Program(program.to_owned());
        for tag in source
            .components(ComponentKind::Tag, &scope)
            .filter(|t| program_tags.contains(t.component_name()))
        {
            tags.push_child(tag.clone());
        }
        wrapper.push_child(tags);
    }
    wrapper
}

fn push_into(controller: &mut Element, container: &str, child: Element) {
    controller.find_or_create(container).push_child(child);
}

fn place_target(
    source: &Project,
    controller: &mut Element,
    target: ExportTarget,
    closure: &Closure,
) {
    match target {
        ExportTarget::Rungs {
            program,
            routine,
            rungs,
        } => {
            let mut content = Element::new(schema::RLL_CONTENT);
            for mut rung in rungs {
                mark_target(&mut rung);
                content.push_child(rung);
            }
            let routine = context(schema::ROUTINE)
                .with_attr("Name", routine)
                .with_attr("Type", "RLL")
                .with_child(content);
            let wrapper = wrapper_program(source, &program, &closure.program_tags)
                .with_child(context(schema::ROUTINES).with_child(routine));
            push_into(controller, schema::PROGRAMS, wrapper);
        }
        ExportTarget::Routine {
            program,
            mut routine,
        } => {
            mark_target(&mut routine);
            let wrapper = wrapper_program(source, &program, &closure.program_tags)
                .with_child(context(schema::ROUTINES).with_child(routine));
            push_into(controller, schema::PROGRAMS, wrapper);
        }
        ExportTarget::Program(mut program) => {
            mark_target(&mut program);
            push_into(controller, schema::PROGRAMS, program);
        }
        ExportTarget::Tag { scope, mut tag } => {
            mark_target(&mut tag);
            match scope {
                Scope::Controller => push_into(controller, schema::TAGS, tag),
                Scope::Program(program) => {
                    let wrapper = context(schema::PROGRAM)
                        .with_attr("Name", program)
                        .with_child(context(schema::TAGS).with_child(tag));
                    push_into(controller, schema::PROGRAMS, wrapper);
                }
            }
        }
        ExportTarget::DataType(mut udt) => {
            mark_target(&mut udt);
            push_into(controller, schema::DATA_TYPES, udt);
        }
        ExportTarget::AddOnInstruction(mut aoi) => {
            mark_target(&mut aoi);
            push_into(controller, schema::AOI_DEFINITIONS, aoi);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skeleton_has_context_containers_in_order() {
        let (root, controller) = skeleton(
            TargetType::DataType,
            Header {
                target_name: Some("Motor".to_owned()),
                ..Header::default()
            },
            &ExportMetadata::default(),
            schema::DEFAULT_EXPORT_OPTIONS,
        );
        assert_eq!(root.attr("TargetType"), Some("DataType"));
        assert_eq!(root.attr("TargetName"), Some("Motor"));
        assert_eq!(root.attr("ContainsContext"), Some("true"));
        assert_eq!(root.attr("SoftwareRevision"), Some("37.01"));
        assert!(root.attr("TargetCount").is_none());
        assert_eq!(controller.attr("Use"), Some("Context"));
        assert_eq!(controller.attr("ProcessorType"), Some("1769-L33ER"));
        let names: Vec<_> = controller.children().iter().map(Element::name).collect();
        assert_eq!(
            names,
            vec!["DataTypes", "AddOnInstructionDefinitions", "Tags", "Programs"]
        );
        assert!(controller
            .children()
            .iter()
            .all(|c| c.attr("Use") == Some("Context")));
    }

    #[test]
    fn export_date_uses_ctime_layout() {
        let (root, _) = skeleton(
            TargetType::Rung,
            Header::default(),
            &ExportMetadata::default(),
            "",
        );
        let date = root.attr("ExportDate").unwrap();
        // "Mon Jan 06 14:03:12 2025"
        assert_eq!(date.len(), 24);
        assert_eq!(date.split(' ').count(), 5);
    }

    #[test]
    fn alarm_definitions_sit_between_aois_and_tags() {
        let source = Project::parse(
            r#"<RSLogix5000Content>
  <Controller Name="P">
    <AlarmDefinitions>
      <DatatypeAlarmDefinition Name="MotorAlarms"/>
      <DatatypeAlarmDefinition Name="Other"/>
    </AlarmDefinitions>
  </Controller>
</RSLogix5000Content>"#,
        )
        .unwrap();
        let closure = Closure {
            alarm_definitions: ["MotorAlarms".to_owned()].into(),
            ..Closure::default()
        };
        let doc = build_export(
            &source,
            ExportTarget::DataType(Element::new("DataType").with_attr("Name", "Motor")),
            &closure,
            &ExportOptions::default(),
        );
        let controller = doc.source().controller();
        let names: Vec<_> = controller.children().iter().map(Element::name).collect();
        assert_eq!(
            names,
            vec![
                "DataTypes",
                "AddOnInstructionDefinitions",
                "AlarmDefinitions",
                "Tags",
                "Programs"
            ]
        );
        let alarms = controller.child("AlarmDefinitions").unwrap();
        assert_eq!(alarms.child_count(), 1);
        assert_eq!(doc.source().controller_name(), "P");
    }
}
