//! Rung export and import: selection, renumbering, and insert position.

mod common;

use common::{destination, names, options, rungs, source};
use l5x_merge::model::{ComponentKind, ExportKind};
use l5x_merge::{ImportOptions, MergeError, Policy, Scope, export, merge};

fn texts(rungs: &[(String, String)]) -> Vec<&str> {
    rungs.iter().map(|(_, t)| t.as_str()).collect()
}

fn numbers(rungs: &[(String, String)]) -> Vec<&str> {
    rungs.iter().map(|(n, _)| n.as_str()).collect()
}

#[test]
fn selected_rungs_are_renumbered_from_zero() {
    let doc =
        export::export_rungs(&source(), "Main", "MainRoutine", &[2, 1], &options()).unwrap();
    assert_eq!(doc.kind(), ExportKind::Rung);
    assert_eq!(doc.base_name(), "MainRoutineRungs");
    assert_eq!(doc.source().root_attr("TargetCount"), Some("2"));

    let exported = rungs(doc.source(), "Main", "MainRoutine");
    assert_eq!(numbers(&exported), vec!["0", "1"]);
    assert_eq!(
        texts(&exported),
        vec!["MOV(Limit,Step);", "Valve_Ctl(V1,Pump1.Inner);"]
    );
}

#[test]
fn rung_export_collects_tags_types_and_aois() {
    let doc = export::export_rungs(&source(), "Main", "MainRoutine", &[1], &options()).unwrap();
    let src = doc.source();
    assert_eq!(
        names(src, ComponentKind::Tag, &Scope::Controller),
        vec!["Pump1"]
    );
    assert_eq!(
        names(src, ComponentKind::Tag, &Scope::Program("Main".to_owned())),
        vec!["V1"]
    );
    assert_eq!(
        names(src, ComponentKind::AddOnInstruction, &Scope::Controller),
        vec!["Valve_Ctl", "Debounce"]
    );
    assert_eq!(
        names(src, ComponentKind::DataType, &Scope::Controller),
        vec!["Alpha", "Beta"]
    );
}

#[test]
fn rungs_insert_at_position_and_renumber() {
    let doc =
        export::export_rungs(&source(), "Main", "MainRoutine", &[0, 2], &options()).unwrap();
    let mut dest = destination();

    let result = merge::import_component(
        &mut dest,
        &doc,
        Policy::Skip,
        &ImportOptions {
            rung_position: Some(1),
            ..ImportOptions::default()
        },
    )
    .unwrap();

    assert!(result.success);
    assert_eq!(result.imported.rungs, 2);
    let after = rungs(&dest, "Main", "MainRoutine");
    assert_eq!(numbers(&after), vec!["0", "1", "2", "3", "4"]);
    assert_eq!(
        texts(&after),
        vec![
            "NOP();",
            "XIC(Pump1.Inner.Flag)OTE(Step);",
            "MOV(Limit,Step);",
            "NOP();",
            "NOP();",
        ]
    );
    assert!(
        dest.routine("Main", "MainRoutine")
            .unwrap()
            .descendants_named("Rung")
            .all(|r| r.attr("Use").is_none())
    );
}

#[test]
fn rungs_append_when_position_is_out_of_range() {
    let doc = export::export_rungs(&source(), "Main", "MainRoutine", &[2], &options()).unwrap();
    let mut dest = destination();

    merge::import_component(
        &mut dest,
        &doc,
        Policy::Skip,
        &ImportOptions {
            rung_position: Some(99),
            ..ImportOptions::default()
        },
    )
    .unwrap();

    let after = rungs(&dest, "Main", "MainRoutine");
    assert_eq!(numbers(&after), vec!["0", "1", "2", "3"]);
    assert_eq!(texts(&after)[3], "MOV(Limit,Step);");
}

#[test]
fn rung_import_brings_program_tags_and_context() {
    let doc = export::export_rungs(&source(), "Main", "MainRoutine", &[0], &options()).unwrap();
    let mut dest = destination();

    let result =
        merge::import_component(&mut dest, &doc, Policy::Skip, &ImportOptions::default())
            .unwrap();

    assert!(result.success);
    assert_eq!(result.imported.udts, 2);
    assert_eq!(result.imported.tags, 2, "Pump1 and Main.Step");
    assert!(dest.tag("Step", &Scope::Program("Main".to_owned())).is_ok());
    assert!(dest.tag("Pump1", &Scope::Controller).is_ok());
}

#[test]
fn analyze_rungs_does_not_insert() {
    let doc = export::export_rungs(&source(), "Main", "MainRoutine", &[0], &options()).unwrap();
    let dest = destination();
    let result = merge::analyze_import(&dest, &doc).unwrap();
    assert!(result.success);
    assert_eq!(result.imported.rungs, 0);
    assert_eq!(rungs(&dest, "Main", "MainRoutine").len(), 3);
}

#[test]
fn rungs_into_missing_routine_fail_before_any_change() {
    let doc = export::export_rungs(&source(), "Main", "MainRoutine", &[0], &options()).unwrap();
    let mut dest = destination();
    let before = dest.clone();

    let err = merge::import_component(
        &mut dest,
        &doc,
        Policy::Skip,
        &ImportOptions {
            routine: Some("Missing".to_owned()),
            ..ImportOptions::default()
        },
    )
    .unwrap_err();

    assert!(matches!(err, MergeError::NotFound { what: "routine", .. }), "{err}");
    assert_eq!(dest, before);
}

#[test]
fn rungs_into_structured_text_are_rejected() {
    let doc = export::export_rungs(&source(), "Main", "MainRoutine", &[0], &options()).unwrap();
    let mut dest = destination();

    let err = merge::import_component(
        &mut dest,
        &doc,
        Policy::Overwrite,
        &ImportOptions {
            routine: Some("Calc".to_owned()),
            ..ImportOptions::default()
        },
    )
    .unwrap_err();

    assert!(matches!(err, MergeError::NotLadder { ref routine, .. } if routine == "Calc"));
}

#[test]
fn scaffolded_rung_export_imports_nothing() {
    let doc = export::new_rung_export(None, "Main", "MainRoutine", &options());
    let mut dest = destination();
    let result =
        merge::import_component(&mut dest, &doc, Policy::Skip, &ImportOptions::default())
            .unwrap();
    assert!(result.success);
    assert_eq!(result.imported.total(), 0);
    assert_eq!(rungs(&dest, "Main", "MainRoutine").len(), 3);
}
