//! Run-scoped validation state
//!
//! One `ValidationContext` exists per validation run. It accumulates
//! diagnostics, owns the on-disk clone cache, and lazily loads the team
//! governance and series tables at most once per run. Rules receive the
//! context mutably and record findings instead of returning errors; only
//! transport-level failures abort a rule early, and even those are recorded
//! before the rule returns.

use crate::core::error::GateResult;
use crate::core::repo_cache::RepoCache;
use crate::core::series::SeriesTable;
use crate::core::team::TeamData;
use crate::version::FirstReleasePolicy;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tempfile::TempDir;

/// Sentinel series name for deliverables released outside any cycle.
pub const INDEPENDENT_SERIES: &str = "independent";

/// Classification of a single finding.
///
/// Everything except `Policy` fails the run; `Policy` findings are
/// advisory warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
  /// Malformed input; no lookup was attempted.
  Format,
  /// A well-formed reference that does not resolve.
  NotFound,
  /// A resolvable reference failing a required ancestry relationship.
  Ancestry,
  /// Two independently supplied facts disagree.
  Consistency,
  /// The transport or an external service could not be reached.
  Transport,
  /// Discouraged but not invalid.
  Policy,
}

impl DiagnosticKind {
  pub fn is_warning(self) -> bool {
    self == DiagnosticKind::Policy
  }
}

/// One recorded finding.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
  pub kind: DiagnosticKind,
  pub source: PathBuf,
  pub message: String,
}

impl fmt::Display for Diagnostic {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}: {}", self.source.display(), self.message)
  }
}

/// Outcome of an external tracker lookup that did not succeed.
#[derive(Debug, Clone)]
pub enum TrackerError {
  /// The service did not answer in time; existence is unknown.
  Timeout,
  /// The service could not be reached at all.
  Unreachable(String),
}

/// Existence checks against an external bug tracker.
///
/// Implemented outside the core; a definite "does not exist" answer is
/// `Ok(false)`.
pub trait TrackerLookup: Send + Sync {
  fn project_exists(&self, kind: &str, id: &str) -> Result<bool, TrackerError>;
}

/// Configuration for one validation run.
#[derive(Debug, Clone)]
pub struct RunConfig {
  /// Name of the release series currently accepting changes.
  pub current_series: String,
  /// Base URL (or local path) that repository identifiers are joined to.
  pub remote_base: String,
  /// Directory containing one subdirectory of deliverable files per series.
  pub deliverables_root: PathBuf,
  /// Team governance table location; `None` disables governance checks.
  pub team_data_path: Option<PathBuf>,
  /// Series status table location; `None` means no series are known.
  pub series_table_path: Option<PathBuf>,
  /// Remove the clone cache at the end of the run.
  pub cleanup: bool,
  /// Upper bound for a single clone operation.
  pub clone_timeout: Duration,
  /// Accepted version forms for a series' first release.
  pub first_release_policy: FirstReleasePolicy,
  /// Independent deliverables allowed to carry stable branches.
  pub independent_stable_exceptions: Vec<String>,
}

impl RunConfig {
  pub fn new(current_series: impl Into<String>) -> Self {
    Self {
      current_series: current_series.into(),
      remote_base: "https://git.example.org".to_string(),
      deliverables_root: PathBuf::from("deliverables"),
      team_data_path: None,
      series_table_path: None,
      cleanup: true,
      clone_timeout: Duration::from_secs(300),
      first_release_policy: FirstReleasePolicy::default(),
      independent_stable_exceptions: Vec::new(),
    }
  }
}

enum WorkDir {
  /// Removed when the context is dropped, unwinding included.
  Ephemeral(TempDir),
  /// Kept on disk for inspection (`--no-cleanup`).
  Kept(PathBuf),
}

impl WorkDir {
  fn path(&self) -> &Path {
    match self {
      WorkDir::Ephemeral(dir) => dir.path(),
      WorkDir::Kept(path) => path,
    }
  }
}

/// Mutable state shared by every rule over one validation run.
pub struct ValidationContext {
  config: Arc<RunConfig>,
  cache: Arc<RepoCache>,
  team_data: Arc<OnceLock<Option<TeamData>>>,
  series_table: Arc<OnceLock<SeriesTable>>,
  tracker: Option<Arc<dyn TrackerLookup>>,
  workdir: Option<Arc<WorkDir>>,
  filename: PathBuf,
  diagnostics: Vec<Diagnostic>,
}

impl ValidationContext {
  /// Create the context for a run, materializing the scratch directory the
  /// clone cache lives in.
  pub fn new(config: RunConfig) -> GateResult<Self> {
    let workdir = if config.cleanup {
      WorkDir::Ephemeral(TempDir::with_prefix("relgate-")?)
    } else {
      let dir = TempDir::with_prefix("relgate-")?;
      WorkDir::Kept(dir.keep())
    };

    let cache = RepoCache::new(workdir.path(), config.remote_base.clone(), config.clone_timeout);

    Ok(Self {
      config: Arc::new(config),
      cache: Arc::new(cache),
      team_data: Arc::new(OnceLock::new()),
      series_table: Arc::new(OnceLock::new()),
      tracker: None,
      workdir: Some(Arc::new(workdir)),
      filename: PathBuf::new(),
      diagnostics: Vec::new(),
    })
  }

  /// Context for tests and embedders that manage their own cache.
  pub fn with_cache(config: RunConfig, cache: RepoCache) -> Self {
    Self {
      config: Arc::new(config),
      cache: Arc::new(cache),
      team_data: Arc::new(OnceLock::new()),
      series_table: Arc::new(OnceLock::new()),
      tracker: None,
      workdir: None,
      filename: PathBuf::new(),
      diagnostics: Vec::new(),
    }
  }

  pub fn set_tracker(&mut self, tracker: Arc<dyn TrackerLookup>) {
    self.tracker = Some(tracker);
  }

  pub fn tracker(&self) -> Option<Arc<dyn TrackerLookup>> {
    self.tracker.clone()
  }

  pub fn config(&self) -> &RunConfig {
    &self.config
  }

  pub fn cache(&self) -> &RepoCache {
    &self.cache
  }

  /// Path of the deliverable document currently being checked.
  pub fn filename(&self) -> &Path {
    &self.filename
  }

  pub fn set_filename(&mut self, path: impl Into<PathBuf>) {
    self.filename = path.into();
  }

  /// Record an error-severity finding.
  pub fn error(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
    debug_assert!(!kind.is_warning());
    self.diagnostics.push(Diagnostic {
      kind,
      source: self.filename.clone(),
      message: message.into(),
    });
  }

  /// Record an advisory finding.
  pub fn warning(&mut self, message: impl Into<String>) {
    self.diagnostics.push(Diagnostic {
      kind: DiagnosticKind::Policy,
      source: self.filename.clone(),
      message: message.into(),
    });
  }

  pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
    self.diagnostics.iter().filter(|d| !d.kind.is_warning())
  }

  pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
    self.diagnostics.iter().filter(|d| d.kind.is_warning())
  }

  pub fn error_count(&self) -> usize {
    self.errors().count()
  }

  pub fn warning_count(&self) -> usize {
    self.warnings().count()
  }

  pub fn diagnostics(&self) -> &[Diagnostic] {
    &self.diagnostics
  }

  /// Scratch directory the clone cache lives in, when the context owns one.
  pub fn workdir_path(&self) -> Option<&Path> {
    self.workdir.as_deref().map(WorkDir::path)
  }

  /// Team governance table, loaded at most once per run. `None` when the
  /// table is unavailable; the load failure itself degrades to a warning.
  pub fn team_data(&mut self) -> Option<&TeamData> {
    let mut load_failure = None;
    {
      let table = Arc::clone(&self.team_data);
      let config = Arc::clone(&self.config);
      table.get_or_init(|| {
        let path = config.team_data_path.clone()?;
        match TeamData::load(&path) {
          Ok(data) => Some(data),
          Err(err) => {
            load_failure = Some(format!("could not load team data from {}: {}", path.display(), err));
            None
          }
        }
      });
    }
    if let Some(message) = load_failure {
      self.warning(message);
    }
    self.team_data.get().and_then(|data| data.as_ref())
  }

  /// Series status table, loaded at most once per run. Missing table means
  /// no series are known.
  pub fn series_table(&mut self) -> &SeriesTable {
    let mut load_failure = None;
    {
      let table = Arc::clone(&self.series_table);
      let config = Arc::clone(&self.config);
      table.get_or_init(|| {
        let Some(path) = config.series_table_path.clone() else {
          return SeriesTable::default();
        };
        match SeriesTable::load(&path) {
          Ok(table) => table,
          Err(err) => {
            load_failure = Some(format!("could not load series table from {}: {}", path.display(), err));
            SeriesTable::default()
          }
        }
      });
    }
    if let Some(message) = load_failure {
      self.warning(message);
    }
    self.series_table.get().expect("series table initialized above")
  }

  /// Load both shared tables up front. A load failure is then reported
  /// exactly once, attributed to the table file on the run itself, instead
  /// of landing on whichever document happens to query first.
  pub fn warm_tables(&mut self) {
    if let Some(path) = self.config.team_data_path.clone() {
      self.set_filename(path);
      let _ = self.team_data();
    }
    if let Some(path) = self.config.series_table_path.clone() {
      self.set_filename(path);
      let _ = self.series_table();
    }
    self.filename = PathBuf::new();
  }

  /// Sub-context for one deliverable document: isolated diagnostics,
  /// shared caches and configuration.
  pub fn child(&self, filename: impl Into<PathBuf>) -> ValidationContext {
    ValidationContext {
      config: Arc::clone(&self.config),
      cache: Arc::clone(&self.cache),
      team_data: Arc::clone(&self.team_data),
      series_table: Arc::clone(&self.series_table),
      tracker: self.tracker.clone(),
      workdir: self.workdir.as_ref().map(Arc::clone),
      filename: filename.into(),
      diagnostics: Vec::new(),
    }
  }

  /// Merge a child's findings, preserving their recorded order.
  pub fn absorb(&mut self, child: ValidationContext) {
    self.diagnostics.extend(child.diagnostics);
  }
}
