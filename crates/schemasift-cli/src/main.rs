mod commands;
mod registry;
mod settings;

use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use commands::{CommandError, CommandRegistry};
use registry::{RunContext, init_run_logging, start_run, write_output, write_report};
use schemasift_core::{Catalog, DatabaseSchema, Error as CoreError, TablesReducer};
use settings::{ReductionOverrides, SiftSettings};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
enum CliError {
    #[error("registry error: {0}")]
    Registry(#[from] registry::RegistryError),
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    #[error("command error: {0}")]
    Command(#[from] CommandError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("settings error: {0}")]
    Settings(#[from] toml::de::Error),
}

#[derive(Parser, Debug)]
#[command(
    name = "schemasift",
    version,
    about = "Reduce a captured schema to the tables you care about"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Filter a schema snapshot and render what remains.
    Reduce(ReduceArgs),
    /// List the available output commands.
    Commands,
}

#[derive(Args, Debug)]
struct ReduceArgs {
    /// Schema snapshot (JSON) to reduce.
    #[arg(value_name = "SNAPSHOT")]
    input: PathBuf,
    /// TOML settings file.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Output command (see `schemasift commands`).
    #[arg(long)]
    command: Option<String>,
    /// Regular expression a table full name must match.
    #[arg(long, value_name = "REGEX")]
    tables: Option<String>,
    /// Regular expression for table full names to leave out.
    #[arg(long, value_name = "REGEX")]
    exclude_tables: Option<String>,
    /// Keep tables whose full name matches.
    #[arg(long, value_name = "REGEX")]
    grep_tables: Option<String>,
    /// Keep tables with a column whose full name matches.
    #[arg(long, value_name = "REGEX")]
    grep_columns: Option<String>,
    /// Keep tables whose remarks, or whose columns' remarks, match.
    #[arg(long, value_name = "REGEX")]
    grep_def: Option<String>,
    /// Invert the grep match (`--invert-match=false` turns it off).
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    invert_match: Option<bool>,
    /// Drop foreign keys to tables outside the result instead of naming them
    /// (`--only-matching=false` turns it off).
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    only_matching: Option<bool>,
    /// Foreign-key hops to follow towards referencing tables.
    #[arg(long, value_name = "DEPTH", allow_negative_numbers = true)]
    children: Option<i64>,
    /// Foreign-key hops to follow towards referenced tables.
    #[arg(long, value_name = "DEPTH", allow_negative_numbers = true)]
    parents: Option<i64>,
    /// Output directory for runs.
    #[arg(long, default_value = "runs")]
    run_dir: PathBuf,
    /// Also write the rendered output here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    let registry = CommandRegistry::new();

    match cli.command {
        Command::Reduce(args) => run_reduce(args, &registry),
        Command::Commands => {
            let mut stdout = std::io::stdout().lock();
            for command in registry.available_commands() {
                let description = registry.description(&command).unwrap_or_default();
                writeln!(stdout, "{command:<10} {description}")?;
            }
            Ok(())
        }
    }
}

fn run_reduce(args: ReduceArgs, registry: &CommandRegistry) -> Result<(), CliError> {
    let ReduceArgs {
        input,
        config,
        command,
        tables,
        exclude_tables,
        grep_tables,
        grep_columns,
        grep_def,
        invert_match,
        only_matching,
        children,
        parents,
        run_dir,
        out,
    } = args;

    let file_settings = match &config {
        Some(path) => SiftSettings::load(path)?,
        None => SiftSettings::default(),
    };
    let settings = ReductionOverrides {
        command,
        table_inclusion: tables,
        table_exclusion: exclude_tables,
        grep_tables,
        grep_columns,
        grep_definitions: grep_def,
        grep_invert_match: invert_match,
        grep_only_matching: only_matching,
        child_table_filter_depth: children,
        parent_table_filter_depth: parents,
    }
    .apply(file_settings);

    // Reject bad configuration before any artifacts are written.
    let options = settings.reduction.validate()?;
    let renderer = registry.new_renderer(settings.command())?;

    let run_id = Uuid::new_v4().to_string();
    let run_ctx = RunContext {
        run_id: run_id.clone(),
        started_at: chrono::Utc::now(),
        command: settings.command().to_string(),
        input: input.clone(),
        run_dir,
        reduction: settings.reduction.clone(),
    };

    let run_paths = start_run(&run_ctx)?;
    init_run_logging(&run_paths.logs_path)?;

    tracing::info!(event = "run_started", run_id = %run_id, command = %run_ctx.command);
    let timer = Instant::now();

    let snapshot = std::fs::read_to_string(&input)?;
    let schema: DatabaseSchema = serde_json::from_str(&snapshot)?;
    let mut catalog = Catalog::from_schema(&schema)?;
    tracing::info!(
        event = "snapshot_loaded",
        path = %input.display(),
        tables = catalog.tables().len(),
        foreign_keys = catalog.foreign_key_count()
    );

    let report = TablesReducer::new(options).reduce(&mut catalog)?;
    write_report(&run_paths, &report)?;
    tracing::info!(event = "report_written", path = %run_paths.report_path.display());

    let mut rendered = Vec::new();
    renderer.render(&catalog, &mut rendered)?;
    let output_path = write_output(&run_paths, renderer.extension(), &rendered, out.as_deref())?;
    tracing::info!(event = "output_written", path = %output_path.display());

    if out.is_none() {
        std::io::stdout().lock().write_all(&rendered)?;
    }

    let duration_ms = timer.elapsed().as_millis();
    tracing::info!(event = "run_finished", status = "success", duration_ms = duration_ms);

    Ok(())
}
