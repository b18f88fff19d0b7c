//! Conflict detection and the four resolution policies.

mod common;

use common::{destination, names, options, redefine_data_type, source};
use l5x_merge::model::{ComponentKind, ConflictKind};
use l5x_merge::{ExportDocument, ImportOptions, MergeError, Policy, Project, Scope, export, merge};

/// A destination that already holds a different `Alpha`.
fn destination_with_other_alpha() -> Project {
    let mut dest = destination();
    let doc = export::export_data_type(&source(), "Alpha", &options()).unwrap();
    merge::import_component(&mut dest, &doc, Policy::Skip, &ImportOptions::default()).unwrap();
    redefine_data_type(&mut dest, "Alpha");
    dest
}

fn alpha_export() -> ExportDocument {
    export::export_data_type(&source(), "Alpha", &options()).unwrap()
}

#[test]
fn analyze_reports_definition_mismatch_without_mutating() {
    let dest = destination_with_other_alpha();
    let before = dest.clone();

    let result = merge::analyze_import(&dest, &alpha_export()).unwrap();

    assert!(!result.success);
    assert_eq!(result.conflict_count(), 1);
    let c = &result.conflicts[0];
    assert_eq!(c.category, ComponentKind::DataType);
    assert_eq!(c.name, "Alpha");
    assert_eq!(c.kind, ConflictKind::DefinitionMismatch);
    assert_eq!(
        c.description,
        "UDT 'Alpha' exists in the project with a different definition."
    );
    assert_eq!(c.source_detail, "Import: Count:DINT, Inner:Beta");
    assert_eq!(c.target_detail, "Project: Only:DINT");
    assert_eq!(result.imported.total(), 0, "analysis never counts inserts");
    assert_eq!(dest, before);
}

#[test]
fn report_policy_import_is_a_dry_run() {
    let mut dest = destination_with_other_alpha();
    let before = dest.clone();

    let result = merge::import_component(
        &mut dest,
        &alpha_export(),
        Policy::Report,
        &ImportOptions::default(),
    )
    .unwrap();

    assert!(!result.success);
    assert_eq!(result.conflict_count(), 1);
    assert_eq!(dest, before);
}

#[test]
fn skip_keeps_existing_definition() {
    let mut dest = destination_with_other_alpha();

    let result = merge::import_component(
        &mut dest,
        &alpha_export(),
        Policy::Skip,
        &ImportOptions::default(),
    )
    .unwrap();

    assert!(result.success);
    assert!(result.conflicts.is_empty());
    assert_eq!(result.skipped, vec!["UDT:Alpha".to_owned()]);
    let members = dest.data_type("Alpha").unwrap().child("Members").unwrap();
    assert_eq!(members.child_count(), 1);
}

#[test]
fn overwrite_replaces_in_place() {
    let mut dest = destination_with_other_alpha();
    let order_before = names(&dest, ComponentKind::DataType, &Scope::Controller);

    let result = merge::import_component(
        &mut dest,
        &alpha_export(),
        Policy::Overwrite,
        &ImportOptions::default(),
    )
    .unwrap();

    assert!(result.success);
    assert!(result.conflicts.is_empty());
    assert_eq!(result.imported.udts, 1);
    assert_eq!(
        names(&dest, ComponentKind::DataType, &Scope::Controller),
        order_before,
        "overwrite keeps the existing position"
    );
    let members = dest.data_type("Alpha").unwrap().child("Members").unwrap();
    assert!(members.find_named("Member", "Inner").is_some());

    let again = merge::analyze_import(&dest, &alpha_export()).unwrap();
    assert!(again.success, "{:?}", again.conflicts);
}

#[test]
fn fail_stops_at_first_conflicting_category() {
    // An export carrying a conflicting Alpha followed by a fresh AOI.
    let mut src = source();
    let aoi_doc = export::export_aoi(&src, "Debounce", &options()).unwrap();
    redefine_data_type(&mut src, "Alpha");
    let mut doc_project = aoi_doc.into_project();
    let alpha = src.data_type("Alpha").unwrap().clone();
    doc_project
        .container_mut(ComponentKind::DataType, &Scope::Controller)
        .unwrap()
        .push_child(alpha);
    let doc = ExportDocument::from_project(doc_project).unwrap();

    let mut dest = destination();
    merge::import_component(
        &mut dest,
        &alpha_export(),
        Policy::Skip,
        &ImportOptions::default(),
    )
    .unwrap();

    let result =
        merge::import_component(&mut dest, &doc, Policy::Fail, &ImportOptions::default())
            .unwrap();

    assert!(!result.success);
    assert_eq!(result.conflict_count(), 1);
    assert_eq!(result.conflicts[0].name, "Alpha");
    assert!(dest.find_aoi("Debounce").is_none(), "stopped before AOIs");
}

#[test]
fn fail_keeps_components_inserted_before_the_conflict() {
    // Valve_Ctl needs Beta and Debounce; the destination has another Debounce.
    let doc = export::export_aoi(&source(), "Valve_Ctl", &options()).unwrap();
    let mut dest = destination();
    dest.container_mut(ComponentKind::AddOnInstruction, &Scope::Controller)
        .unwrap()
        .push_child(
            l5x_doc::Element::new("AddOnInstructionDefinition")
                .with_attr("Name", "Debounce")
                .with_child(
                    l5x_doc::Element::new("Parameters").with_child(
                        l5x_doc::Element::new("Parameter")
                            .with_attr("Name", "EnableIn")
                            .with_attr("DataType", "BOOL")
                            .with_attr("Usage", "Input"),
                    ),
                ),
        );

    let result =
        merge::import_component(&mut dest, &doc, Policy::Fail, &ImportOptions::default())
            .unwrap();

    assert!(!result.success);
    assert_eq!(result.conflict_count(), 1);
    assert_eq!(result.conflicts[0].name, "Debounce");
    assert_eq!(result.imported.udts, 1);
    assert_eq!(result.imported.aois, 0);
    assert!(dest.find_data_type("Beta").is_some(), "no rollback");
    assert!(dest.find_aoi("Valve_Ctl").is_none());
}

#[test]
fn fail_without_conflicts_succeeds() {
    let mut dest = destination();
    let result = merge::import_component(
        &mut dest,
        &alpha_export(),
        Policy::Fail,
        &ImportOptions::default(),
    )
    .unwrap();
    assert!(result.success);
    assert_eq!(result.imported.udts, 2);
}

#[test]
fn existing_routine_is_a_name_conflict() {
    let doc = export::export_routine(&source(), "Main", "Calc", &options()).unwrap();
    let dest = destination();

    let result = merge::analyze_import(&dest, &doc).unwrap();

    let routine: Vec<_> = result
        .conflicts
        .iter()
        .filter(|c| c.category == ComponentKind::Routine)
        .collect();
    assert_eq!(routine.len(), 1);
    assert_eq!(routine[0].kind, ConflictKind::NameExists);
    assert_eq!(
        routine[0].description,
        "Routine 'Calc' already exists in program 'Main'."
    );
}

#[test]
fn routine_into_other_program_is_inserted() {
    let doc = export::export_routine(&source(), "Main", "Calc", &options()).unwrap();
    let mut dest = destination();
    dest.container_mut(ComponentKind::Program, &Scope::Controller)
        .unwrap()
        .push_child(l5x_doc::Element::new("Program").with_attr("Name", "Aux"));

    let result = merge::import_component(
        &mut dest,
        &doc,
        Policy::Skip,
        &ImportOptions {
            program: Some("Aux".to_owned()),
            ..ImportOptions::default()
        },
    )
    .unwrap();

    assert!(result.success);
    assert_eq!(result.imported.routines, 1);
    assert!(dest.routine("Aux", "Calc").is_ok());
    assert_eq!(result.imported.tags, 2, "Limit at controller scope, Step in Aux");
    assert!(dest.tag("Step", &Scope::Program("Aux".to_owned())).is_ok());
}

#[test]
fn existing_program_is_a_name_conflict() {
    let doc = export::export_program(&source(), "Main", &options()).unwrap();
    let result = merge::analyze_import(&destination(), &doc).unwrap();
    let program = result
        .conflicts
        .iter()
        .find(|c| c.category == ComponentKind::Program)
        .unwrap();
    assert_eq!(program.kind, ConflictKind::NameExists);
    assert_eq!(
        program.description,
        "Program 'Main' already exists in the project."
    );
}

#[test]
fn analyzing_existing_program_compares_its_tags() {
    let doc = export::export_program(&source(), "Main", &options()).unwrap();
    let mut dest = destination();
    dest.container_mut(ComponentKind::Tag, &Scope::Program("Main".to_owned()))
        .unwrap()
        .push_child(
            l5x_doc::Element::new("Tag")
                .with_attr("Name", "Step")
                .with_attr("DataType", "REAL"),
        );

    let report = merge::analyze_import(&dest, &doc).unwrap();
    let found: Vec<_> = report
        .conflicts
        .iter()
        .map(|c| (c.category, c.name.as_str()))
        .collect();
    assert_eq!(
        found,
        vec![
            (ComponentKind::Tag, "Main.Step"),
            (ComponentKind::Program, "Main")
        ]
    );
    assert_eq!(report.imported.total(), 0);

    let skipped =
        merge::import_component(&mut dest, &doc, Policy::Skip, &ImportOptions::default())
            .unwrap();
    assert!(skipped.success);
    assert_eq!(skipped.skipped, vec!["Program:Main".to_owned()]);
    let step = dest.tag("Step", &Scope::Program("Main".to_owned())).unwrap();
    assert_eq!(step.attr("DataType"), Some("REAL"));
}

#[test]
fn tag_with_different_type_conflicts_and_skip_labels_qualify() {
    let doc = export::export_tag(
        &source(),
        "Step",
        &Scope::Program("Main".to_owned()),
        &options(),
    )
    .unwrap();
    let mut dest = destination();
    dest.container_mut(ComponentKind::Tag, &Scope::Program("Main".to_owned()))
        .unwrap()
        .push_child(
            l5x_doc::Element::new("Tag")
                .with_attr("Name", "Step")
                .with_attr("DataType", "REAL"),
        );

    let report = merge::analyze_import(&dest, &doc).unwrap();
    assert_eq!(report.conflict_count(), 1);
    let c = &report.conflicts[0];
    assert_eq!(c.name, "Main.Step");
    assert_eq!(
        c.description,
        "Program tag 'Step' in 'Main' exists with a different data type."
    );
    assert_eq!(c.source_detail, "Import: DINT[0]");
    assert_eq!(c.target_detail, "Project: REAL[0]");

    let skipped =
        merge::import_component(&mut dest, &doc, Policy::Skip, &ImportOptions::default())
            .unwrap();
    assert_eq!(skipped.skipped, vec!["Tag:Main.Step".to_owned()]);
}

#[test]
fn unknown_target_type_is_unsupported() {
    let xml = r#"<RSLogix5000Content TargetType="Module"><Controller Name="X"/></RSLogix5000Content>"#;
    let err = ExportDocument::parse(xml).unwrap_err();
    assert!(
        matches!(err, MergeError::Unsupported { ref target_type } if target_type == "Module"),
        "{err}"
    );
}

#[test]
fn missing_target_is_malformed() {
    let xml = r#"<RSLogix5000Content TargetType="DataType"><Controller Name="X"/></RSLogix5000Content>"#;
    let doc = ExportDocument::parse(xml).unwrap();
    let err = merge::analyze_import(&destination(), &doc).unwrap_err();
    assert!(matches!(err, MergeError::Malformed { .. }), "{err}");
}

#[test]
fn missing_export_sources_are_not_found() {
    let src = source();
    let err = export::export_data_type(&src, "Nope", &options()).unwrap_err();
    assert!(matches!(err, MergeError::NotFound { what: "data type", .. }));

    let err = export::export_routine(&src, "Main", "Nope", &options()).unwrap_err();
    assert_eq!(err.to_string(), "routine 'Main/Nope' not found");

    let err = export::export_rungs(&src, "Main", "MainRoutine", &[7], &options()).unwrap_err();
    assert_eq!(err.to_string(), "rung 'Main/MainRoutine/7' not found");
}

#[test]
fn rungs_from_structured_text_are_rejected() {
    let err = export::export_rungs(&source(), "Main", "Calc", &[0], &options()).unwrap_err();
    assert!(matches!(err, MergeError::NotLadder { ref found, .. } if found == "ST"));
}
