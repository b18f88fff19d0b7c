//! Import dispatcher.
//!
//! Feeds the components of an [`ExportDocument`] into a destination
//! [`Project`] in a fixed order:
//!
//! 1. data types (context, and the target of a `DataType` export)
//! 2. AOI definitions (context, and the target of an AOI export)
//! 3. controller tags
//! 4. program tags of the wrapper program (`Rung`, `Routine`, and tag
//!    exports)
//! 5. the target rungs, routine, or program
//!
//! Analysis of a `Program` export also compares the program's own tags when
//! the destination already has a program of that name.
//!
//! Every named component goes through [`equivalence::compare`] and
//! [`resolve::decide`]. A `fail` conflict stops the run at once; whatever
//! was already applied stays applied.
//!
//! Destination checks (program and routine resolution, ladder-only rungs)
//! run before the first mutation, so a `NotFound` never leaves a half
//! merged project behind.

use l5x_doc::Element;

use super::equivalence::{self, Comparison};
use super::resolve::{self, Decision, Existing, Outcome};
use crate::document::{self, ExportDocument};
use crate::error::MergeError;
use crate::model::{
    ComponentKind, Conflict, ConflictKind, ExportKind, ImportResult, Policy, Scope, TargetType,
};
use crate::project::{self, Project};
use crate::schema;

/// Routine that receives rungs when neither the caller nor the document
/// names one.
pub const DEFAULT_ROUTINE: &str = "MainRoutine";

/// Destination overrides for an import.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImportOptions {
    /// Program that receives rungs, a routine, or program tags.
    pub program: Option<String>,
    /// Routine that receives rungs.
    pub routine: Option<String>,
    /// Rung index to insert at; `None` or out of range appends.
    pub rung_position: Option<usize>,
}

/// Merge `doc` into `project` under `policy`.
///
/// `report` never mutates and is the same as [`analyze_import`] with the
/// given overrides.
///
/// # Errors
/// [`MergeError::Malformed`] if the document lacks its target,
/// [`MergeError::NotFound`] if the destination program or routine does not
/// exist, [`MergeError::NotLadder`] for rungs aimed at a non-ladder routine.
/// Conflicts are never errors.
pub fn import_component(
    project: &mut Project,
    doc: &ExportDocument,
    policy: Policy,
    options: &ImportOptions,
) -> Result<ImportResult, MergeError> {
    let dest = if policy == Policy::Report {
        Destination::ReadOnly(project)
    } else {
        Destination::Writable(project)
    };
    run(dest, doc, policy, options)
}

/// Report every conflict `doc` would raise against `project`, changing
/// nothing.
///
/// # Errors
/// [`MergeError::Malformed`] if the document lacks its target.
pub fn analyze_import(project: &Project, doc: &ExportDocument) -> Result<ImportResult, MergeError> {
    run(
        Destination::ReadOnly(project),
        doc,
        Policy::Report,
        &ImportOptions::default(),
    )
}

fn run(
    dest: Destination<'_>,
    doc: &ExportDocument,
    policy: Policy,
    options: &ImportOptions,
) -> Result<ImportResult, MergeError> {
    let read_only = dest.is_read_only();
    let mut importer = Importer {
        plan: Plan::resolve(dest.project(), doc, options, read_only)?,
        dest,
        doc,
        policy,
        outcome: Outcome::new(),
    };
    tracing::info!(
        target_type = %doc.target_type(),
        target = doc.target_name().unwrap_or(""),
        %policy,
        read_only,
        "importing"
    );

    importer.merge_all()?;

    let result = importer.outcome.finish(read_only);
    tracing::info!(
        success = result.success,
        conflicts = result.conflict_count(),
        inserted = result.imported.total(),
        skipped = result.skipped.len(),
        "import finished"
    );
    Ok(result)
}

// ---------------------------------------------------------------------------
// Destination
// ---------------------------------------------------------------------------

enum Destination<'p> {
    ReadOnly(&'p Project),
    Writable(&'p mut Project),
}

impl Destination<'_> {
    fn project(&self) -> &Project {
        match self {
            Self::ReadOnly(p) => p,
            Self::Writable(p) => p,
        }
    }

    const fn is_read_only(&self) -> bool {
        matches!(self, Self::ReadOnly(_))
    }
}

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

/// Everything resolved before the first mutation.
#[derive(Debug)]
struct Plan {
    /// Target name of a `DataType` or AOI export.
    definition_target: Option<String>,
    /// Program that receives wrapper program tags and the target routine
    /// or rungs.
    program: Option<String>,
    /// Routine that receives rungs.
    routine: Option<String>,
    rung_position: Option<usize>,
}

impl Plan {
    fn resolve(
        project: &Project,
        doc: &ExportDocument,
        options: &ImportOptions,
        read_only: bool,
    ) -> Result<Self, MergeError> {
        let wrapper_program = doc.wrapper_program().map(Element::component_name);
        let mut plan = Self {
            definition_target: None,
            program: options
                .program
                .clone()
                .or_else(|| wrapper_program.map(str::to_owned)),
            routine: None,
            rung_position: options.rung_position,
        };

        match doc.target_type() {
            TargetType::DataType => {
                let target = doc
                    .target(ComponentKind::DataType)
                    .ok_or_else(|| MergeError::malformed("export document has no DataType"))?;
                plan.definition_target = Some(target.component_name().to_owned());
            }
            TargetType::AddOnInstructionDefinition => {
                let target = doc.target(ComponentKind::AddOnInstruction).ok_or_else(|| {
                    MergeError::malformed("export document has no AddOnInstructionDefinition")
                })?;
                plan.definition_target = Some(target.component_name().to_owned());
            }
            TargetType::Program => {
                doc.target(ComponentKind::Program)
                    .ok_or_else(|| MergeError::malformed("export document has no Program"))?;
            }
            TargetType::Routine => {
                target_routine(doc)
                    .ok_or_else(|| MergeError::malformed("export document has no Routine"))?;
                let program = plan.require_program()?;
                if !read_only {
                    project.program(program)?;
                }
            }
            TargetType::Rung => {
                if doc.kind() == ExportKind::Tag {
                    if !read_only && has_wrapper_tags(doc) {
                        project.program(plan.require_program()?)?;
                    }
                } else {
                    let routine = options
                        .routine
                        .clone()
                        .or_else(|| {
                            doc.wrapper_routine()
                                .map(|r| r.component_name().to_owned())
                        })
                        .unwrap_or_else(|| DEFAULT_ROUTINE.to_owned());
                    let program = plan.require_program()?;
                    if !read_only {
                        let existing = project.routine(program, &routine)?;
                        ensure_ladder(existing)?;
                    }
                    plan.routine = Some(routine);
                }
            }
        }

        Ok(plan)
    }

    fn require_program(&self) -> Result<&str, MergeError> {
        self.program
            .as_deref()
            .ok_or_else(|| MergeError::malformed("export document has no wrapper Program"))
    }
}

fn has_wrapper_tags(doc: &ExportDocument) -> bool {
    doc.wrapper_program()
        .and_then(|p| p.child(schema::TAGS))
        .is_some_and(|t| t.children_named(schema::TAG).next().is_some())
}

/// The target routine of a `Routine` export: the wrapper routine marked
/// `Use="Target"`, else the first.
fn target_routine(doc: &ExportDocument) -> Option<&Element> {
    let routines = doc.wrapper_program()?.child(schema::ROUTINES)?;
    routines
        .children_named(schema::ROUTINE)
        .find(|r| document::is_target(r))
        .or_else(|| routines.children_named(schema::ROUTINE).next())
}

fn ensure_ladder(routine: &Element) -> Result<(), MergeError> {
    let ty = project::routine_type(routine);
    if ty.eq_ignore_ascii_case("RLL") {
        Ok(())
    } else {
        Err(MergeError::NotLadder {
            routine: routine.component_name().to_owned(),
            found: ty.to_owned(),
        })
    }
}

// ---------------------------------------------------------------------------
// Importer
// ---------------------------------------------------------------------------

struct Importer<'a> {
    dest: Destination<'a>,
    doc: &'a ExportDocument,
    policy: Policy,
    plan: Plan,
    outcome: Outcome,
}

impl Importer<'_> {
    fn merge_all(&mut self) -> Result<(), MergeError> {
        let target_type = self.doc.target_type();
        let (udt_target, aoi_target) = match target_type {
            TargetType::DataType => (self.plan.definition_target.clone(), None),
            TargetType::AddOnInstructionDefinition => (None, self.plan.definition_target.clone()),
            _ => (None, None),
        };

        self.merge_definitions(ComponentKind::DataType, udt_target.as_deref())?;
        if self.outcome.is_aborted() {
            return Ok(());
        }
        self.merge_definitions(ComponentKind::AddOnInstruction, aoi_target.as_deref())?;
        if self.outcome.is_aborted() {
            return Ok(());
        }
        self.merge_controller_tags()?;
        if self.outcome.is_aborted() {
            return Ok(());
        }
        if matches!(target_type, TargetType::Rung | TargetType::Routine) {
            self.merge_program_tags()?;
            if self.outcome.is_aborted() {
                return Ok(());
            }
        }

        match target_type {
            TargetType::DataType | TargetType::AddOnInstructionDefinition => Ok(()),
            TargetType::Rung if self.doc.kind() == ExportKind::Tag => Ok(()),
            TargetType::Rung => self.merge_rungs(),
            TargetType::Routine => self.merge_routine(),
            TargetType::Program => self.merge_program(),
        }
    }

    // -- categories ---------------------------------------------------------

    /// All definitions of `kind`. When `target` is the definition being
    /// imported, an identical copy is noted as skipped, and a reported
    /// conflict on it ends the category.
    fn merge_definitions(
        &mut self,
        kind: ComponentKind,
        target: Option<&str>,
    ) -> Result<(), MergeError> {
        let doc = self.doc;
        for item in doc.source().components(kind, &Scope::Controller) {
            let name = item.component_name();
            let decision = self.merge_component(kind, &Scope::Controller, item)?;
            if self.outcome.is_aborted() {
                return Ok(());
            }
            if target.is_some_and(|t| t.eq_ignore_ascii_case(name)) {
                match decision {
                    Decision::SkipIdentical => {
                        self.outcome
                            .note_skipped(format!("{}:{name} (identical)", kind.label()));
                    }
                    Decision::Report => break,
                    _ => {}
                }
            }
        }
        Ok(())
    }

    fn merge_controller_tags(&mut self) -> Result<(), MergeError> {
        let doc = self.doc;
        for tag in doc.source().components(ComponentKind::Tag, &Scope::Controller) {
            self.merge_component(ComponentKind::Tag, &Scope::Controller, tag)?;
            if self.outcome.is_aborted() {
                break;
            }
        }
        Ok(())
    }

    /// Tags of the wrapper program, merged into the destination program.
    fn merge_program_tags(&mut self) -> Result<(), MergeError> {
        let doc = self.doc;
        let Some(tags) = doc.wrapper_program().and_then(|p| p.child(schema::TAGS)) else {
            return Ok(());
        };
        let Some(program) = self.plan.program.clone() else {
            return Ok(());
        };
        let scope = Scope::Program(program);
        for tag in tags.children_named(schema::TAG) {
            self.merge_component(ComponentKind::Tag, &scope, tag)?;
            if self.outcome.is_aborted() {
                break;
            }
        }
        Ok(())
    }

    fn merge_routine(&mut self) -> Result<(), MergeError> {
        let doc = self.doc;
        let routine = target_routine(doc)
            .ok_or_else(|| MergeError::malformed("export document has no Routine"))?;
        let program = self.plan.require_program()?.to_owned();
        self.merge_component(ComponentKind::Routine, &Scope::Program(program), routine)?;
        Ok(())
    }

    fn merge_program(&mut self) -> Result<(), MergeError> {
        let doc = self.doc;
        let program = doc
            .target(ComponentKind::Program)
            .ok_or_else(|| MergeError::malformed("export document has no Program"))?;
        if self.dest.is_read_only() {
            self.report_program_tags(program)?;
        }
        self.merge_component(ComponentKind::Program, &Scope::Controller, program)?;
        Ok(())
    }

    /// Analysis only: compare the target program's tags with those of an
    /// existing program of the same name. A real import replaces or skips
    /// the program whole, so these never mutate.
    fn report_program_tags(&mut self, program: &Element) -> Result<(), MergeError> {
        let name = program.component_name();
        if self.dest.project().find_program(name).is_none() {
            return Ok(());
        }
        let scope = Scope::Program(name.to_owned());
        for tag in program
            .child(schema::TAGS)
            .into_iter()
            .flat_map(|t| t.children_named(schema::TAG))
        {
            self.merge_component(ComponentKind::Tag, &scope, tag)?;
        }
        Ok(())
    }

    /// Insert the document's rungs at the requested position and renumber
    /// the destination routine.
    fn merge_rungs(&mut self) -> Result<(), MergeError> {
        let doc = self.doc;
        let incoming: Vec<Element> = doc
            .wrapper_routine()
            .and_then(|r| r.child(schema::RLL_CONTENT))
            .into_iter()
            .flat_map(|c| c.children_named(schema::RUNG))
            .map(|rung| {
                let mut rung = rung.clone();
                rung.remove_attr(schema::USE_ATTR);
                rung
            })
            .collect();

        let Destination::Writable(project) = &mut self.dest else {
            return Ok(());
        };
        let (Some(program), Some(routine)) =
            (self.plan.program.as_deref(), self.plan.routine.as_deref())
        else {
            return Err(MergeError::malformed("no destination routine for rungs"));
        };

        let count = incoming.len();
        let content = project
            .routine_mut(program, routine)?
            .find_or_create(schema::RLL_CONTENT);
        insert_rungs(content, incoming, self.plan.rung_position);
        self.outcome.add_rungs(count);
        tracing::debug!(program, routine, count, "inserted rungs");
        Ok(())
    }

    // -- one component ------------------------------------------------------

    /// Compare, decide, book, and apply for one incoming component.
    fn merge_component(
        &mut self,
        kind: ComponentKind,
        scope: &Scope,
        incoming: &Element,
    ) -> Result<Decision, MergeError> {
        let name = incoming.component_name();
        let existing = self.dest.project().find(kind, scope, name);
        let comparison = existing.and_then(|e| equivalence::compare(kind, e, incoming));
        let state = Existing::classify(existing.is_some(), comparison.as_ref());
        let decision = resolve::decide(state, self.policy);
        tracing::debug!(%kind, name, %scope, ?decision, "merge decision");

        if decision.mutates() {
            let Destination::Writable(project) = &mut self.dest else {
                return Ok(decision);
            };
            apply(project, kind, scope, decision, incoming)?;
        }

        self.outcome.record(
            decision,
            kind,
            || conflict(kind, scope, name, comparison.as_ref()),
            || skip_label(kind, scope, name),
        );
        if decision == Decision::Abort {
            tracing::warn!(%kind, name, "conflict under fail policy, stopping import");
        }
        Ok(decision)
    }
}

/// Insert or overwrite one component in the destination.
fn apply(
    project: &mut Project,
    kind: ComponentKind,
    scope: &Scope,
    decision: Decision,
    incoming: &Element,
) -> Result<(), MergeError> {
    let mut element = incoming.clone();
    element.remove_attr(schema::USE_ATTR);
    if kind == ComponentKind::AddOnInstruction {
        project::touch_edited_date(&mut element);
    }

    let container = project.container_mut(kind, scope)?;
    let existing = container.position_named(kind.element(), element.component_name());
    match (decision, existing) {
        (Decision::Overwrite, Some(idx)) => {
            container.replace_child(idx, element);
        }
        _ => container.push_child(element),
    }
    Ok(())
}

/// Insert `rungs` before the rung at `position` (append when `None` or out
/// of range), then number every rung from zero.
fn insert_rungs(content: &mut Element, rungs: Vec<Element>, position: Option<usize>) {
    let rung_slots: Vec<usize> = content
        .children()
        .iter()
        .enumerate()
        .filter(|(_, c)| c.name() == schema::RUNG)
        .map(|(i, _)| i)
        .collect();
    let mut at = position
        .and_then(|p| rung_slots.get(p).copied())
        .unwrap_or(content.child_count());
    for rung in rungs {
        content.insert_child(at, rung);
        at += 1;
    }
    for (number, rung) in content.children_named_mut(schema::RUNG).enumerate() {
        rung.set_attr("Number", number.to_string());
    }
}

// ---------------------------------------------------------------------------
// Reporting
// ---------------------------------------------------------------------------

fn qualified(scope: &Scope, name: &str) -> String {
    match scope {
        Scope::Controller => name.to_owned(),
        Scope::Program(p) => format!("{p}.{name}"),
    }
}

fn skip_label(kind: ComponentKind, scope: &Scope, name: &str) -> String {
    match kind {
        ComponentKind::Tag => format!("Tag:{}", qualified(scope, name)),
        _ => format!("{}:{name}", kind.label()),
    }
}

fn conflict(
    kind: ComponentKind,
    scope: &Scope,
    name: &str,
    comparison: Option<&Comparison>,
) -> Conflict {
    let program = scope.program().unwrap_or("");
    let (description, source_detail, target_detail) = match (kind, comparison) {
        (ComponentKind::Routine, _) => (
            format!("Routine '{name}' already exists in program '{program}'."),
            "Routine from import file".to_owned(),
            format!("Existing routine in '{program}'"),
        ),
        (ComponentKind::Program, _) => (
            format!("Program '{name}' already exists in the project."),
            "Program from import file".to_owned(),
            "Existing program in project".to_owned(),
        ),
        (_, cmp) => {
            let description = match (kind, scope) {
                (ComponentKind::Tag, Scope::Controller) => {
                    format!("Controller tag '{name}' exists with a different data type.")
                }
                (ComponentKind::Tag, Scope::Program(p)) => {
                    format!("Program tag '{name}' in '{p}' exists with a different data type.")
                }
                _ => format!(
                    "{} '{name}' exists in the project with a different definition.",
                    kind.label()
                ),
            };
            let (incoming, existing) =
                cmp.map_or(("", ""), |c| (c.incoming.as_str(), c.existing.as_str()));
            (
                description,
                format!("Import: {incoming}"),
                format!("Project: {existing}"),
            )
        }
    };

    Conflict {
        category: kind,
        name: match kind {
            ComponentKind::Tag => qualified(scope, name),
            _ => name.to_owned(),
        },
        kind: if kind.is_name_only() {
            ConflictKind::NameExists
        } else {
            ConflictKind::DefinitionMismatch
        },
        description,
        source_detail,
        target_detail,
    }
}
