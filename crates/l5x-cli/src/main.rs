use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use l5x_merge::config::CONFIG_FILE;
use l5x_merge::export::{self, ExportOptions};
use l5x_merge::{ExportDocument, ImportOptions, L5xConfig, Policy, Project, Scope, merge};

mod format;
mod telemetry;

use format::OutputFormat;

/// Export and merge L5X project components
///
/// Exports are self-contained: every data type, add-on instruction, tag,
/// and alarm definition the exported component needs travels with it as
/// context. Imports compare each incoming component with the destination
/// project and resolve clashes under a policy.
///
/// POLICIES:
///   report     record conflicts, change nothing (default)
///   skip       keep existing components, list them as skipped
///   overwrite  replace existing components in place
///   fail       stop at the first conflict (earlier changes are kept)
///
/// EXAMPLES:
///
///   l5x export data-type Line4.L5X Motor
///   l5x export rung Line4.L5X Main Fill 3,4,5 -o FillRungs.L5X
///   l5x analyze Line5.L5X Motor_DataType.L5X
///   l5x import Line5.L5X FillRungs.L5X --policy skip --position 2
#[derive(Parser)]
#[command(name = "l5x")]
#[command(version, about)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, env = "L5X_CONFIG", default_value = CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export a component with its dependencies
    #[command(subcommand)]
    Export(ExportCommands),

    /// Merge an export document into a project
    ///
    /// The project file is rewritten in place unless --output is given.
    /// With the report policy nothing is written.
    ///
    /// Exit status is 2 when the result is unsuccessful (a fail-policy
    /// abort, or conflicts under report).
    Import {
        /// Destination project (.L5X)
        project: PathBuf,

        /// Export document to import
        file: PathBuf,

        /// Conflict policy [default: from config, else report]
        #[arg(short, long)]
        policy: Option<Policy>,

        /// Destination program for rungs, routines, and program tags
        #[arg(long)]
        program: Option<String>,

        /// Destination routine for rungs
        #[arg(long)]
        routine: Option<String>,

        /// Rung index to insert at (appends when omitted or out of range)
        #[arg(long)]
        position: Option<usize>,

        /// Write the merged project here instead of over the input
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },

    /// Report the conflicts an import would raise, without changing anything
    ///
    /// Exit status is 2 when conflicts were found.
    Analyze {
        /// Destination project (.L5X)
        project: PathBuf,

        /// Export document to check
        file: PathBuf,

        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },

    /// Create an empty export document to fill in by hand
    #[command(subcommand)]
    New(NewCommands),
}

/// Options shared by every export.
#[derive(Args)]
struct ExportArgs {
    /// Source project (.L5X)
    project: PathBuf,

    /// Output file [default: generated name in the configured output dir]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Export the component alone, without context dependencies
    #[arg(long)]
    no_dependencies: bool,
}

#[derive(Subcommand)]
enum ExportCommands {
    /// Selected rungs of a ladder routine
    Rung {
        #[command(flatten)]
        common: ExportArgs,
        program: String,
        routine: String,
        /// Rung numbers, comma separated
        #[arg(value_delimiter = ',', required = true)]
        numbers: Vec<usize>,
    },
    /// A whole routine
    Routine {
        #[command(flatten)]
        common: ExportArgs,
        program: String,
        routine: String,
    },
    /// A whole program
    Program {
        #[command(flatten)]
        common: ExportArgs,
        program: String,
    },
    /// A controller or program tag
    Tag {
        #[command(flatten)]
        common: ExportArgs,
        name: String,
        /// Program scope (controller scope when omitted)
        #[arg(long)]
        program: Option<String>,
    },
    /// A user-defined data type
    DataType {
        #[command(flatten)]
        common: ExportArgs,
        name: String,
    },
    /// An add-on instruction definition
    Aoi {
        #[command(flatten)]
        common: ExportArgs,
        name: String,
    },
}

/// Options shared by every scaffold.
#[derive(Args)]
struct NewArgs {
    /// Output file [default: generated name in the configured output dir]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Take controller metadata from this project
    #[arg(long)]
    from: Option<PathBuf>,
}

#[derive(Subcommand)]
enum NewCommands {
    /// Empty rung export
    Rung {
        #[command(flatten)]
        common: NewArgs,
        #[arg(default_value = "ExportedProgram")]
        program: String,
        #[arg(default_value = "MainRoutine")]
        routine: String,
    },
    /// Empty routine export
    Routine {
        #[command(flatten)]
        common: NewArgs,
        program: String,
        routine: String,
        /// Routine language: RLL, ST, FBD, or SFC
        #[arg(long = "type", default_value = "RLL")]
        routine_type: String,
    },
    /// Empty program export with a MainRoutine
    Program {
        #[command(flatten)]
        common: NewArgs,
        name: String,
    },
    /// Empty data type export
    DataType {
        #[command(flatten)]
        common: NewArgs,
        name: String,
    },
    /// Add-on instruction export with EnableIn/EnableOut and a NOP rung
    Aoi {
        #[command(flatten)]
        common: NewArgs,
        name: String,
        #[arg(long, default_value = "1.0")]
        revision: String,
    },
}

fn main() -> ExitCode {
    telemetry::init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = L5xConfig::load(&cli.config)?;
    match cli.command {
        Commands::Export(cmd) => run_export(cmd, &config).map(|()| ExitCode::SUCCESS),
        Commands::Import {
            project,
            file,
            policy,
            program,
            routine,
            position,
            output,
            format,
        } => {
            let policy = policy.unwrap_or(config.import.policy);
            let options = ImportOptions {
                program,
                routine,
                rung_position: position,
            };
            run_import(&project, &file, policy, &options, output.as_deref(), format)
        }
        Commands::Analyze {
            project,
            file,
            format,
        } => run_analyze(&project, &file, format),
        Commands::New(cmd) => run_new(cmd, &config).map(|()| ExitCode::SUCCESS),
    }
}

// ---------------------------------------------------------------------------
// export
// ---------------------------------------------------------------------------

fn load_project(path: &Path) -> Result<Project> {
    Project::load(path).with_context(|| format!("failed to load project {}", path.display()))
}

fn load_export(path: &Path) -> Result<ExportDocument> {
    ExportDocument::load(path)
        .with_context(|| format!("failed to load export document {}", path.display()))
}

fn run_export(cmd: ExportCommands, config: &L5xConfig) -> Result<()> {
    let common = match &cmd {
        ExportCommands::Rung { common, .. }
        | ExportCommands::Routine { common, .. }
        | ExportCommands::Program { common, .. }
        | ExportCommands::Tag { common, .. }
        | ExportCommands::DataType { common, .. }
        | ExportCommands::Aoi { common, .. } => common,
    };
    let mut options = ExportOptions::from(&config.export);
    if common.no_dependencies {
        options.include_dependencies = false;
    }
    let project = load_project(&common.project)?;

    let doc = match &cmd {
        ExportCommands::Rung {
            program,
            routine,
            numbers,
            ..
        } => export::export_rungs(&project, program, routine, numbers, &options)?,
        ExportCommands::Routine {
            program, routine, ..
        } => export::export_routine(&project, program, routine, &options)?,
        ExportCommands::Program { program, .. } => {
            export::export_program(&project, program, &options)?
        }
        ExportCommands::Tag { name, program, .. } => {
            let scope = program.clone().map_or(Scope::Controller, Scope::Program);
            export::export_tag(&project, name, &scope, &options)?
        }
        ExportCommands::DataType { name, .. } => {
            export::export_data_type(&project, name, &options)?
        }
        ExportCommands::Aoi { name, .. } => export::export_aoi(&project, name, &options)?,
    };

    let path = export::save_export(&doc, common.output.as_deref(), &config.export.output_dir)?;
    println!("{}", path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// import / analyze
// ---------------------------------------------------------------------------

fn exit_for(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    }
}

fn run_import(
    project_path: &Path,
    file: &Path,
    policy: Policy,
    options: &ImportOptions,
    output: Option<&Path>,
    format: OutputFormat,
) -> Result<ExitCode> {
    let mut project = load_project(project_path)?;
    let doc = load_export(file)?;
    let result = merge::import_component(&mut project, &doc, policy, options)?;

    if policy != Policy::Report {
        let dest = output.unwrap_or(project_path);
        project
            .save(dest)
            .with_context(|| format!("failed to write {}", dest.display()))?;
    }

    println!("{}", format.render(&result)?);
    Ok(exit_for(result.success))
}

fn run_analyze(project_path: &Path, file: &Path, format: OutputFormat) -> Result<ExitCode> {
    let project = load_project(project_path)?;
    let doc = load_export(file)?;
    let result = merge::analyze_import(&project, &doc)?;
    println!("{}", format.render(&result)?);
    Ok(exit_for(result.success))
}

// ---------------------------------------------------------------------------
// new
// ---------------------------------------------------------------------------

fn run_new(cmd: NewCommands, config: &L5xConfig) -> Result<()> {
    let options = ExportOptions::from(&config.export);
    let common = match &cmd {
        NewCommands::Rung { common, .. }
        | NewCommands::Routine { common, .. }
        | NewCommands::Program { common, .. }
        | NewCommands::DataType { common, .. }
        | NewCommands::Aoi { common, .. } => common,
    };
    let source = common.from.as_deref().map(load_project).transpose()?;
    let source = source.as_ref();

    let doc = match &cmd {
        NewCommands::Rung {
            program, routine, ..
        } => export::new_rung_export(source, program, routine, &options),
        NewCommands::Routine {
            program,
            routine,
            routine_type,
            ..
        } => export::new_routine_export(source, program, routine, routine_type, &options),
        NewCommands::Program { name, .. } => export::new_program_export(source, name, &options),
        NewCommands::DataType { name, .. } => {
            export::new_data_type_export(source, name, &options)
        }
        NewCommands::Aoi { name, revision, .. } => {
            export::new_aoi_export(source, name, revision, &options)
        }
    };

    let path = export::save_export(&doc, common.output.as_deref(), &config.export.output_dir)?;
    println!("{}", path.display());
    Ok(())
}
