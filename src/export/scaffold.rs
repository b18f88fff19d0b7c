//! Empty export documents built from scratch.
//!
//! A scaffold has the same shell as a real export but an empty target, so
//! it can be filled in and imported later. Header metadata comes from a
//! source project when one is given, else from [`ExportOptions`].

use l5x_doc::Element;

use super::ExportOptions;
use super::shell::{Header, context, skeleton};
use crate::document::ExportDocument;
use crate::model::{ExportMetadata, TargetType};
use crate::project::{self, Project};
use crate::schema;

fn metadata(source: Option<&Project>, options: &ExportOptions) -> ExportMetadata {
    source.map_or_else(
        || options.metadata.clone(),
        |p| p.metadata_or(&options.metadata),
    )
}

fn finish(root: Element, controller: Element, target_type: TargetType) -> ExportDocument {
    ExportDocument::new(Project::from_parts(root, controller), target_type)
}

fn routine(name: &str, routine_type: &str) -> Element {
    Element::new(schema::ROUTINE)
        .with_attr("Name", name)
        .with_attr("Type", routine_type)
        .with_child(Element::new(project::content_element(routine_type)))
}

/// An empty `Rung` export: a context program and ladder routine with no
/// rungs.
#[must_use]
pub fn new_rung_export(
    source: Option<&Project>,
    program: &str,
    routine_name: &str,
    options: &ExportOptions,
) -> ExportDocument {
    let header = Header {
        count: Some(0),
        ..Header::default()
    };
    let (root, mut controller) = skeleton(
        TargetType::Rung,
        header,
        &metadata(source, options),
        &options.export_options,
    );
    let wrapper = context(schema::PROGRAM)
        .with_attr("Name", program)
        .with_child(context(schema::ROUTINES).with_child(routine(routine_name, "RLL")));
    controller.find_or_create(schema::PROGRAMS).push_child(wrapper);
    finish(root, controller, TargetType::Rung)
}

/// An empty `Routine` export of the given language (`RLL`, `ST`, `FBD`,
/// `SFC`).
#[must_use]
pub fn new_routine_export(
    source: Option<&Project>,
    program: &str,
    routine_name: &str,
    routine_type: &str,
    options: &ExportOptions,
) -> ExportDocument {
    let header = Header {
        target_name: Some(routine_name.to_owned()),
        sub_type: Some(routine_type.to_owned()),
        class: Some("Standard".to_owned()),
        ..Header::default()
    };
    let (root, mut controller) = skeleton(
        TargetType::Routine,
        header,
        &metadata(source, options),
        &options.export_options,
    );
    let target = routine(routine_name, routine_type)
        .with_attr(schema::USE_ATTR, schema::USE_TARGET);
    let wrapper = context(schema::PROGRAM)
        .with_attr("Name", program)
        .with_child(context(schema::TAGS))
        .with_child(context(schema::ROUTINES).with_child(target));
    controller.find_or_create(schema::PROGRAMS).push_child(wrapper);
    finish(root, controller, TargetType::Routine)
}

/// An empty `Program` export with a ladder `MainRoutine`.
#[must_use]
pub fn new_program_export(
    source: Option<&Project>,
    program: &str,
    options: &ExportOptions,
) -> ExportDocument {
    let header = Header {
        target_name: Some(program.to_owned()),
        class: Some("Standard".to_owned()),
        ..Header::default()
    };
    let (root, mut controller) = skeleton(
        TargetType::Program,
        header,
        &metadata(source, options),
        &options.export_options,
    );
    let target = Element::new(schema::PROGRAM)
        .with_attr(schema::USE_ATTR, schema::USE_TARGET)
        .with_attr("Name", program)
        .with_attr("TestEdits", "false")
        .with_attr("MainRoutineName", "MainRoutine")
        .with_attr("Disabled", "false")
        .with_child(Element::new(schema::TAGS))
        .with_child(Element::new(schema::ROUTINES).with_child(routine("MainRoutine", "RLL")));
    controller.find_or_create(schema::PROGRAMS).push_child(target);
    finish(root, controller, TargetType::Program)
}

/// An empty `DataType` export (no members).
#[must_use]
pub fn new_data_type_export(
    source: Option<&Project>,
    name: &str,
    options: &ExportOptions,
) -> ExportDocument {
    let header = Header {
        target_name: Some(name.to_owned()),
        ..Header::default()
    };
    let (root, mut controller) = skeleton(
        TargetType::DataType,
        header,
        &metadata(source, options),
        &options.export_options,
    );
    let target = Element::new(schema::DATA_TYPE)
        .with_attr(schema::USE_ATTR, schema::USE_TARGET)
        .with_attr("Name", name)
        .with_attr("Family", "NoFamily")
        .with_attr("Class", "User")
        .with_child(Element::new("Members"));
    controller.find_or_create(schema::DATA_TYPES).push_child(target);
    finish(root, controller, TargetType::DataType)
}

/// An AOI export with `EnableIn`/`EnableOut` and a `Logic` routine holding
/// a single `NOP();` rung.
#[must_use]
pub fn new_aoi_export(
    source: Option<&Project>,
    name: &str,
    revision: &str,
    options: &ExportOptions,
) -> ExportDocument {
    let meta = metadata(source, options);
    let now = project::edited_timestamp();
    let header = Header {
        target_name: Some(name.to_owned()),
        class: Some("Standard".to_owned()),
        revision: Some((revision.to_owned(), now.clone())),
        ..Header::default()
    };
    let (root, mut controller) = skeleton(
        TargetType::AddOnInstructionDefinition,
        header,
        &meta,
        &options.export_options,
    );

    let enable = |param: &str, usage: &str| {
        Element::new("Parameter")
            .with_attr("Name", param)
            .with_attr("DataType", "BOOL")
            .with_attr("Usage", usage)
            .with_attr("Required", "false")
            .with_attr("Visible", "false")
    };
    let rung = Element::new(schema::RUNG)
        .with_attr("Number", "0")
        .with_attr("Type", "N")
        .with_child(Element::new("Text").with_cdata("NOP();"));
    let logic = Element::new(schema::ROUTINE)
        .with_attr("Name", "Logic")
        .with_attr("Type", "RLL")
        .with_child(Element::new(schema::RLL_CONTENT).with_child(rung));

    let target = Element::new(schema::AOI_DEFINITION)
        .with_attr(schema::USE_ATTR, schema::USE_TARGET)
        .with_attr("Name", name)
        .with_attr("Revision", revision)
        .with_attr("ExecutePrescan", "false")
        .with_attr("ExecutePostscan", "false")
        .with_attr("ExecuteEnableInFalse", "false")
        .with_attr("CreatedDate", now.as_str())
        .with_attr("EditedDate", now.as_str())
        .with_attr("SoftwareRevision", format!("v{}", meta.software_revision))
        .with_child(
            Element::new("Parameters")
                .with_child(enable("EnableIn", "Input"))
                .with_child(enable("EnableOut", "Output")),
        )
        .with_child(Element::new("LocalTags"))
        .with_child(Element::new(schema::ROUTINES).with_child(logic));
    controller
        .find_or_create(schema::AOI_DEFINITIONS)
        .push_child(target);
    finish(root, controller, TargetType::AddOnInstructionDefinition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ComponentKind, ExportKind};

    #[test]
    fn rung_scaffold_has_empty_ladder_routine() {
        let doc = new_rung_export(None, "Main", "Fill", &ExportOptions::default());
        assert_eq!(doc.kind(), ExportKind::Rung);
        assert_eq!(doc.source().root_attr("TargetCount"), Some("0"));
        let routine = doc.wrapper_routine().unwrap();
        assert_eq!(routine.component_name(), "Fill");
        assert_eq!(routine.child("RLLContent").unwrap().child_count(), 0);
        assert_eq!(doc.base_name(), "FillRungs");
    }

    #[test]
    fn routine_scaffold_uses_language_content() {
        let doc = new_routine_export(None, "Main", "Calc", "ST", &ExportOptions::default());
        assert_eq!(doc.source().root_attr("TargetSubType"), Some("ST"));
        let routine = doc.wrapper_routine().unwrap();
        assert_eq!(routine.attr("Use"), Some("Target"));
        assert!(routine.child("STContent").is_some());
    }

    #[test]
    fn scaffolds_inherit_project_metadata() {
        let source = Project::parse(
            r#"<RSLogix5000Content SoftwareRevision="33.01">
  <Controller Name="Line4" ProcessorType="1756-L83E"/>
</RSLogix5000Content>"#,
        )
        .unwrap();
        let doc = new_program_export(Some(&source), "Filler", &ExportOptions::default());
        let controller = doc.source().controller();
        assert_eq!(controller.attr("Name"), Some("Line4"));
        assert_eq!(controller.attr("ProcessorType"), Some("1756-L83E"));
        assert_eq!(doc.source().root_attr("SoftwareRevision"), Some("33.01"));
        let program = doc.target(ComponentKind::Program).unwrap();
        assert_eq!(program.attr("MainRoutineName"), Some("MainRoutine"));
    }

    #[test]
    fn aoi_scaffold_has_enable_parameters_and_nop() {
        let doc = new_aoi_export(None, "Valve", "1.0", &ExportOptions::default());
        let aoi = doc.target(ComponentKind::AddOnInstruction).unwrap();
        assert_eq!(aoi.attr("SoftwareRevision"), Some("v37.01"));
        assert_eq!(aoi.attr("CreatedDate"), aoi.attr("EditedDate"));
        let params: Vec<_> = aoi
            .child("Parameters")
            .unwrap()
            .children()
            .iter()
            .map(Element::component_name)
            .collect();
        assert_eq!(params, vec!["EnableIn", "EnableOut"]);
        let texts = crate::logic::logic_texts(aoi);
        assert_eq!(texts, vec!["NOP();"]);
        assert_eq!(doc.source().root_attr("TargetRevision"), Some("1.0"));
    }

    #[test]
    fn data_type_scaffold_is_empty_user_type() {
        let doc = new_data_type_export(None, "Recipe", &ExportOptions::default());
        let udt = doc.target(ComponentKind::DataType).unwrap();
        assert_eq!(udt.attr("Class"), Some("User"));
        assert_eq!(udt.child("Members").unwrap().child_count(), 0);
    }
}
