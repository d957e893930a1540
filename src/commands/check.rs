//! Validate deliverable documents.
//!
//! The command builds one run-wide context, validates every requested file
//! in parallel with isolated child contexts, then merges the findings back
//! in file order so output is deterministic regardless of scheduling.

use crate::core::context::{DiagnosticKind, RunConfig, ValidationContext, INDEPENDENT_SERIES};
use crate::core::error::{ConfigError, ExitCode, GateError, GateResult};
use crate::deliverable::Deliverable;
use crate::rules::run_rules;
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Arguments for the check command.
pub struct CheckArgs {
  /// Deliverable files to validate; empty means every file in the current
  /// series directory.
  pub files: Vec<PathBuf>,
  pub deliverables_root: PathBuf,
  /// Series currently accepting changes; inferred from the newest series
  /// directory when not given.
  pub current_series: Option<String>,
  pub remote_base: String,
  pub team_data: Option<PathBuf>,
  pub series_status: Option<PathBuf>,
  pub no_cleanup: bool,
  pub json: bool,
  pub jobs: Option<usize>,
}

#[derive(Serialize)]
struct Report<'a> {
  files: usize,
  errors: usize,
  warnings: usize,
  diagnostics: &'a [crate::core::context::Diagnostic],
}

/// Series directories sort chronologically by name, so the newest one is
/// the current series unless the caller says otherwise.
fn infer_current_series(root: &Path) -> GateResult<String> {
  let mut names: Vec<String> = fs::read_dir(root)
    .map_err(|_| GateError::Config(ConfigError::RootNotFound { path: root.to_path_buf() }))?
    .flatten()
    .filter(|entry| entry.path().is_dir())
    .filter_map(|entry| entry.file_name().into_string().ok())
    .filter(|name| name != INDEPENDENT_SERIES)
    .collect();
  names.sort();
  names
    .pop()
    .ok_or_else(|| GateError::message(format!("no series directories under {}", root.display())))
}

fn discover_files(series_dir: &Path) -> GateResult<Vec<PathBuf>> {
  let mut files: Vec<PathBuf> = fs::read_dir(series_dir)
    .map_err(|_| {
      GateError::Config(ConfigError::RootNotFound {
        path: series_dir.to_path_buf(),
      })
    })?
    .flatten()
    .map(|entry| entry.path())
    .filter(|path| path.extension().is_some_and(|ext| ext == "yaml"))
    .collect();
  files.sort();
  Ok(files)
}

fn validate_file(parent: &ValidationContext, file: &Path) -> ValidationContext {
  let mut ctx = parent.child(file);
  match Deliverable::load(file) {
    Ok((deliv, unknown)) => {
      for message in unknown {
        ctx.warning(message);
      }
      run_rules(&deliv, &mut ctx);
    }
    Err(err) => ctx.error(DiagnosticKind::Format, err.to_string()),
  }
  ctx
}

pub fn run_check(args: CheckArgs) -> GateResult<()> {
  let current_series = match args.current_series {
    Some(series) => series,
    None => infer_current_series(&args.deliverables_root)?,
  };

  let mut config = RunConfig::new(current_series.clone());
  config.deliverables_root = args.deliverables_root.clone();
  config.remote_base = args.remote_base;
  config.team_data_path = args.team_data;
  config.series_table_path = args.series_status;
  config.cleanup = !args.no_cleanup;

  let files = if args.files.is_empty() {
    discover_files(&args.deliverables_root.join(&current_series))?
  } else {
    for file in &args.files {
      if !file.exists() {
        return Err(GateError::Config(ConfigError::FileNotFound { path: file.clone() }));
      }
    }
    args.files
  };

  let mut ctx = ValidationContext::new(config)?;
  // Table load failures are recorded here, on the run, so their place in
  // the merged report does not depend on scheduling.
  ctx.warm_tables();

  let pool = rayon::ThreadPoolBuilder::new()
    .num_threads(args.jobs.unwrap_or(0))
    .build()
    .map_err(|err| GateError::message(format!("cannot build worker pool: {}", err)))?;
  let children: Vec<ValidationContext> = pool.install(|| {
    let parent = &ctx;
    files.par_iter().map(|file| validate_file(parent, file)).collect()
  });
  for child in children {
    ctx.absorb(child);
  }

  let errors = ctx.error_count();
  let warnings = ctx.warning_count();

  if args.json {
    let report = Report {
      files: files.len(),
      errors,
      warnings,
      diagnostics: ctx.diagnostics(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
  } else {
    println!("🔎 Validating {} deliverable file(s) for series {}...\n", files.len(), current_series);

    for diagnostic in ctx.diagnostics() {
      let icon = if diagnostic.kind.is_warning() { "⚠️ " } else { "❌" };
      println!("{} {}", icon, diagnostic);
    }
    if !ctx.diagnostics().is_empty() {
      println!();
    }

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Summary: {} file(s), {} error(s), {} warning(s)", files.len(), errors, warnings);

    if args.no_cleanup
      && let Some(workdir) = ctx.workdir_path()
    {
      println!("Clone cache kept at {}", workdir.display());
    }

    if errors > 0 {
      println!("\n⚠️  Validation failed.");
    } else if warnings > 0 {
      println!("\n✨ No errors; review the warnings above.");
    } else {
      println!("\n✨ All deliverable files look good.");
    }
  }

  if errors > 0 {
    std::process::exit(ExitCode::Validation.as_i32());
  }
  Ok(())
}
