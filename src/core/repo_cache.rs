//! Lazy clone cache for remote repositories
//!
//! One local clone per repository identifier per run. The first caller for
//! a repository performs the clone under a per-repository lock; concurrent
//! callers for the same repository block until it completes, then proceed
//! read-only. Failures are cached alongside successes so a broken remote is
//! reported once instead of retried for every rule.

use crate::core::error::{GateError, GateResult, GitError};
use crate::core::vcs::{SystemGit, Vcs};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

type CloneCell = Arc<OnceLock<Result<PathBuf, String>>>;

/// Mapping from repository identifier (`owner/name`) to a local clone.
pub struct RepoCache {
  root: PathBuf,
  remote_base: String,
  clone_timeout: Duration,
  vcs: Box<dyn Vcs>,
  repos: Mutex<HashMap<String, CloneCell>>,
}

impl RepoCache {
  pub fn new(root: impl Into<PathBuf>, remote_base: impl Into<String>, clone_timeout: Duration) -> Self {
    Self::with_vcs(root, remote_base, clone_timeout, Box::new(SystemGit))
  }

  /// Build a cache over a specific transport backend.
  pub fn with_vcs(
    root: impl Into<PathBuf>,
    remote_base: impl Into<String>,
    clone_timeout: Duration,
    vcs: Box<dyn Vcs>,
  ) -> Self {
    Self {
      root: root.into(),
      remote_base: remote_base.into(),
      clone_timeout,
      vcs,
      repos: Mutex::new(HashMap::new()),
    }
  }

  fn clone_url(&self, repo: &str) -> String {
    format!("{}/{}", self.remote_base.trim_end_matches('/'), repo)
  }

  fn clone_dest(&self, repo: &str) -> PathBuf {
    self.root.join(repo)
  }

  /// Materialize the local clone for `repo`, fetching full history on first
  /// use. Safe to call repeatedly; later calls are cheap lookups.
  pub fn ensure_cloned(&self, repo: &str) -> GateResult<PathBuf> {
    let cell: CloneCell = {
      let mut repos = self.repos.lock().expect("repo cache lock poisoned");
      Arc::clone(repos.entry(repo.to_string()).or_default())
    };

    let outcome = cell.get_or_init(|| {
      let dest = self.clone_dest(repo);
      if dest.join(".git").exists() {
        return Ok(dest);
      }
      if let Some(parent) = dest.parent()
        && let Err(err) = fs::create_dir_all(parent)
      {
        return Err(err.to_string());
      }
      self
        .vcs
        .clone_repo(&self.clone_url(repo), &dest, self.clone_timeout)
        .map(|_| dest)
        .map_err(|err| err.to_string())
    });

    match outcome {
      Ok(path) => Ok(path.clone()),
      Err(reason) => Err(GateError::Git(GitError::CloneFailed {
        repo: repo.to_string(),
        reason: reason.clone(),
      })),
    }
  }

  fn clone_path(&self, repo: &str) -> GateResult<PathBuf> {
    self.ensure_cloned(repo)
  }

  /// Whether `reference` (hash or tag) resolves to a commit in `repo`.
  pub fn commit_exists(&self, repo: &str, reference: &str) -> GateResult<bool> {
    let path = self.clone_path(repo)?;
    self.vcs.commit_exists(&path, reference)
  }

  /// Whether a tag named `tag` exists in `repo`.
  pub fn tag_exists(&self, repo: &str, tag: &str) -> GateResult<bool> {
    let path = self.clone_path(repo)?;
    Ok(self.vcs.resolve_tag(&path, tag)?.is_some())
  }

  /// Commit a tag points at. `None` when the tag does not exist.
  pub fn resolve_tag(&self, repo: &str, tag: &str) -> GateResult<Option<String>> {
    let path = self.clone_path(repo)?;
    self.vcs.resolve_tag(&path, tag)
  }

  /// Commit a hash, tag, or branch resolves to. `None` when unresolvable.
  pub fn resolve_ref(&self, repo: &str, reference: &str) -> GateResult<Option<String>> {
    let path = self.clone_path(repo)?;
    self.vcs.resolve_ref(&path, reference)
  }

  /// Whether `ancestor` is reachable from `descendant` in `repo`.
  pub fn is_ancestor(&self, repo: &str, ancestor: &str, descendant: &str) -> GateResult<bool> {
    let path = self.clone_path(repo)?;
    self.vcs.is_ancestor(&path, ancestor, descendant)
  }

  /// Tip of an upstream branch, `None` when it does not exist.
  pub fn branch_tip(&self, repo: &str, branch: &str) -> GateResult<Option<String>> {
    let path = self.clone_path(repo)?;
    self.vcs.branch_tip(&path, branch)
  }

  /// Commit where an upstream branch diverged from the default branch.
  pub fn branch_base(&self, repo: &str, branch: &str) -> GateResult<Option<String>> {
    let path = self.clone_path(repo)?;
    self.vcs.branch_base(&path, branch)
  }
}
