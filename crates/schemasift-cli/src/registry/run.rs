use std::fs::{OpenOptions, create_dir_all};
use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::{DateTime, Utc};
use serde::Serialize;

use schemasift_core::{ReductionConfig, ReductionReport};

use super::{RegistryError, RegistryResult};

/// Metadata captured at run start.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub command: String,
    pub input: PathBuf,
    pub run_dir: PathBuf,
    pub reduction: ReductionConfig,
}

/// JSON config written to each run directory.
#[derive(Debug, Serialize)]
pub struct RunConfig {
    pub run_id: String,
    pub started_at: String,
    pub command: String,
    pub input: String,
    pub reduction: ReductionConfig,
    pub git: GitInfo,
}

/// Git metadata for reproducibility.
#[derive(Debug, Serialize)]
pub struct GitInfo {
    pub commit: Option<String>,
    pub dirty: Option<bool>,
}

/// Paths for run artifacts.
#[derive(Debug, Clone)]
pub struct RunPaths {
    pub root: PathBuf,
    pub logs_path: PathBuf,
    pub report_path: PathBuf,
}

impl RunPaths {
    /// Location of the rendered output for a given extension.
    pub fn output_path(&self, extension: &str) -> PathBuf {
        self.root.join(format!("output.{extension}"))
    }
}

pub fn start_run(ctx: &RunContext) -> RegistryResult<RunPaths> {
    let timestamp = ctx.started_at.format("%Y-%m-%dT%H-%M-%SZ").to_string();
    let root = ctx.run_dir.join(format!("{timestamp}__run_{}", ctx.run_id));

    create_dir_all(&root)?;

    let config_path = root.join("config.json");
    let logs_path = root.join("logs.ndjson");
    let report_path = root.join("report.json");

    let config = RunConfig {
        run_id: ctx.run_id.clone(),
        started_at: ctx.started_at.to_rfc3339(),
        command: ctx.command.clone(),
        input: ctx.input.display().to_string(),
        reduction: ctx.reduction.clone(),
        git: collect_git_info(),
    };

    write_json(&config_path, &config)?;

    OpenOptions::new().create(true).append(true).open(&logs_path)?;

    Ok(RunPaths {
        root,
        logs_path,
        report_path,
    })
}

pub fn write_report(paths: &RunPaths, report: &ReductionReport) -> RegistryResult<()> {
    write_json(&paths.report_path, report)
}

/// Store rendered output in the run directory and, when given, at `out_path`.
pub fn write_output(
    paths: &RunPaths,
    extension: &str,
    rendered: &[u8],
    out_path: Option<&Path>,
) -> RegistryResult<PathBuf> {
    let output_path = paths.output_path(extension);
    std::fs::write(&output_path, rendered)?;

    if let Some(out_path) = out_path {
        if let Some(parent) = out_path.parent() {
            if !parent.as_os_str().is_empty() {
                create_dir_all(parent)?;
            }
        }
        std::fs::write(out_path, rendered)?;
    }

    Ok(output_path)
}

pub fn collect_git_info() -> GitInfo {
    let commit = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .and_then(|output| {
            if output.status.success() {
                Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
            } else {
                None
            }
        })
        .filter(|value| !value.is_empty());

    let dirty = Command::new("git")
        .args(["status", "--porcelain"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| !output.stdout.is_empty());

    GitInfo { commit, dirty }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> RegistryResult<()> {
    let file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(path)?;
    serde_json::to_writer_pretty(file, value).map_err(RegistryError::from)
}
