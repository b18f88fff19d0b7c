//! Export operations.
//!
//! Each `export_*` function looks up its target in a source project,
//! computes the dependency closure (unless dependencies are switched off),
//! and hands both to [`shell::build_export`]. The result is an in-memory
//! [`ExportDocument`]; [`save_export`] writes it.
//!
//! Generated file names follow `PascalCase(base)_Suffix.L5X`. Two different
//! components can map to the same name (`motor_a` and `MotorA`); the later
//! export then overwrites the earlier file.

pub mod scaffold;
pub mod shell;

use std::path::{Path, PathBuf};

use l5x_doc::Element;

use crate::config::ExportConfig;
use crate::document::ExportDocument;
use crate::error::MergeError;
use crate::logic;
use crate::merge::{Closure, Collector};
use crate::model::{ExportKind, ExportMetadata, Scope};
use crate::project::{self, Project};
use crate::schema;

pub use scaffold::{
    new_aoi_export, new_data_type_export, new_program_export, new_routine_export,
    new_rung_export,
};
pub use shell::{ExportTarget, build_export};

// ---------------------------------------------------------------------------
// ExportOptions
// ---------------------------------------------------------------------------

/// Knobs shared by every export.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportOptions {
    /// Copy referenced tags, types, AOIs, and alarm definitions as context.
    pub include_dependencies: bool,
    /// `ExportOptions` root attribute.
    pub export_options: String,
    /// Header fields used where the source project has none.
    pub metadata: ExportMetadata,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self::from(&ExportConfig::default())
    }
}

impl From<&ExportConfig> for ExportOptions {
    fn from(config: &ExportConfig) -> Self {
        Self {
            include_dependencies: config.include_dependencies,
            export_options: config.export_options.clone(),
            metadata: config.metadata.clone(),
        }
    }
}

impl ExportOptions {
    fn closure(&self, build: impl FnOnce() -> Closure) -> Closure {
        if self.include_dependencies {
            build()
        } else {
            Closure::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Exports
// ---------------------------------------------------------------------------

/// Export selected rungs of a ladder routine.
///
/// Rungs are picked by their `Number` attribute, in the order given, and
/// renumbered from zero in the export.
///
/// # Errors
/// [`MergeError::NotFound`] for a missing program, routine, or rung number;
/// [`MergeError::NotLadder`] if the routine is not RLL.
pub fn export_rungs(
    project: &Project,
    program: &str,
    routine: &str,
    numbers: &[usize],
    options: &ExportOptions,
) -> Result<ExportDocument, MergeError> {
    let source_routine = project.routine(program, routine)?;
    let routine_type = project::routine_type(source_routine);
    if !routine_type.eq_ignore_ascii_case("RLL") {
        return Err(MergeError::NotLadder {
            routine: routine.to_owned(),
            found: routine_type.to_owned(),
        });
    }
    let content = source_routine.child(schema::RLL_CONTENT);

    let mut rungs = Vec::with_capacity(numbers.len());
    for &number in numbers {
        let wanted = number.to_string();
        let rung = content
            .and_then(|c| {
                c.children_named(schema::RUNG)
                    .find(|r| r.attr("Number") == Some(wanted.as_str()))
            })
            .ok_or_else(|| MergeError::not_found("rung", format!("{program}/{routine}/{number}")))?;
        let mut rung = rung.clone();
        rung.set_attr("Number", rungs.len().to_string());
        rungs.push(rung);
    }

    let closure = options.closure(|| {
        let mut collector = Collector::new(project);
        for rung in &rungs {
            if let Some(text) = rung.child("Text").and_then(Element::text) {
                collector.add_logic(Some(program), text.trim());
            }
        }
        collector.finish()
    });

    let doc = build_export(
        project,
        ExportTarget::Rungs {
            program: source_name(project.program(program)?, program),
            routine: source_name(source_routine, routine),
            rungs,
        },
        &closure,
        options,
    );
    tracing::info!(program, routine, count = numbers.len(), "exported rungs");
    Ok(doc)
}

/// Export a whole routine inside a context wrapper program.
///
/// # Errors
/// [`MergeError::NotFound`] if the program or routine is missing.
pub fn export_routine(
    project: &Project,
    program: &str,
    routine: &str,
    options: &ExportOptions,
) -> Result<ExportDocument, MergeError> {
    let source_routine = project.routine(program, routine)?;
    let closure = options.closure(|| {
        let mut collector = Collector::new(project);
        for text in logic::logic_texts(source_routine) {
            collector.add_logic(Some(program), &text);
        }
        collector.finish()
    });

    let doc = build_export(
        project,
        ExportTarget::Routine {
            program: source_name(project.program(program)?, program),
            routine: source_routine.clone(),
        },
        &closure,
        options,
    );
    tracing::info!(program, routine, "exported routine");
    Ok(doc)
}

/// Export a whole program with everything its logic and tags need.
///
/// # Errors
/// [`MergeError::NotFound`] if the program is missing.
pub fn export_program(
    project: &Project,
    program: &str,
    options: &ExportOptions,
) -> Result<ExportDocument, MergeError> {
    let source_program = project.program(program)?;
    let closure = options.closure(|| {
        let mut collector = Collector::new(project);
        let name = source_program.component_name();
        for text in logic::logic_texts(source_program) {
            collector.add_logic(Some(name), &text);
        }
        for tag in source_program
            .child(schema::TAGS)
            .into_iter()
            .flat_map(|t| t.children_named(schema::TAG))
        {
            collector.add_tag(tag);
        }
        let mut closure = collector.finish();
        // The program carries its own tags.
        closure.program_tags.clear();
        closure
    });

    let doc = build_export(
        project,
        ExportTarget::Program(source_program.clone()),
        &closure,
        options,
    );
    tracing::info!(program, "exported program");
    Ok(doc)
}

/// Export one tag with its type and alarm-definition dependencies.
///
/// # Errors
/// [`MergeError::NotFound`] if the tag (or its program) is missing.
pub fn export_tag(
    project: &Project,
    name: &str,
    scope: &Scope,
    options: &ExportOptions,
) -> Result<ExportDocument, MergeError> {
    let tag = project.tag(name, scope)?;
    let closure = options.closure(|| {
        let mut collector = Collector::new(project);
        collector.add_tag(tag);
        collector.finish()
    });

    let scope = match scope {
        Scope::Controller => Scope::Controller,
        Scope::Program(p) => Scope::Program(source_name(project.program(p)?, p)),
    };
    let doc = build_export(
        project,
        ExportTarget::Tag {
            scope,
            tag: tag.clone(),
        },
        &closure,
        options,
    );
    tracing::info!(tag = name, "exported tag");
    Ok(doc)
}

/// Export a data type with every structure type it nests.
///
/// # Errors
/// [`MergeError::NotFound`] if the data type is missing.
pub fn export_data_type(
    project: &Project,
    name: &str,
    options: &ExportOptions,
) -> Result<ExportDocument, MergeError> {
    let udt = project.data_type(name)?;
    let closure = options.closure(|| {
        let mut collector = Collector::new(project);
        collector.add_type(udt.component_name());
        let mut closure = collector.finish();
        closure.remove_definition(udt.component_name());
        closure
    });

    let doc = build_export(
        project,
        ExportTarget::DataType(udt.clone()),
        &closure,
        options,
    );
    tracing::info!(data_type = name, "exported data type");
    Ok(doc)
}

/// Export an AOI definition with the types and AOIs it uses or calls.
///
/// # Errors
/// [`MergeError::NotFound`] if the definition is missing.
pub fn export_aoi(
    project: &Project,
    name: &str,
    options: &ExportOptions,
) -> Result<ExportDocument, MergeError> {
    let aoi = project.aoi(name)?;
    let closure = options.closure(|| {
        let mut collector = Collector::new(project);
        collector.add_type(aoi.component_name());
        let mut closure = collector.finish();
        closure.remove_definition(aoi.component_name());
        closure
    });

    let doc = build_export(
        project,
        ExportTarget::AddOnInstruction(aoi.clone()),
        &closure,
        options,
    );
    tracing::info!(aoi = name, "exported add-on instruction");
    Ok(doc)
}

/// The component's own spelling of its name, falling back to `requested`.
fn source_name(element: &Element, requested: &str) -> String {
    let name = element.component_name();
    if name.is_empty() { requested } else { name }.to_owned()
}

// ---------------------------------------------------------------------------
// Saving
// ---------------------------------------------------------------------------

/// Write `doc` to `destination`, or to a generated name under `output_dir`.
///
/// Returns the path written.
///
/// # Errors
/// [`MergeError::Io`] if `output_dir` cannot be created,
/// [`MergeError::Document`] if writing fails.
pub fn save_export(
    doc: &ExportDocument,
    destination: Option<&Path>,
    output_dir: &Path,
) -> Result<PathBuf, MergeError> {
    let path = match destination {
        Some(p) => p.to_owned(),
        None => {
            std::fs::create_dir_all(output_dir).map_err(|source| MergeError::Io {
                path: output_dir.to_owned(),
                source,
            })?;
            output_dir.join(export_file_name(&doc.base_name(), doc.kind()))
        }
    };
    doc.save(&path)?;
    tracing::info!(path = %path.display(), kind = %doc.kind(), "wrote export");
    Ok(path)
}

/// `PascalCase(base)_Suffix.L5X`.
#[must_use]
pub fn export_file_name(base: &str, kind: ExportKind) -> String {
    format!("{}_{}.L5X", pascal_case(base), kind.file_suffix())
}

/// Join the alphanumeric runs of `name`, each with its first letter
/// upper-cased. The rest of each run keeps its case, so `MainRoutineRungs`
/// stays as is instead of becoming `Mainroutinerungs`. Names without any
/// alphanumerics become `Export`.
#[must_use]
pub fn pascal_case(name: &str) -> String {
    let out: String = name
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_ascii_uppercase().to_string() + chars.as_str()
            })
        })
        .collect();
    if out.is_empty() {
        "Export".to_owned()
    } else {
        out
    }
}
