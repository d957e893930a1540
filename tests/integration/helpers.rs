//! Test helpers for integration tests
//!
//! A fixture holds real git repositories playing the upstream remotes plus
//! a deliverables tree, all under one temporary directory. The gate clones
//! from the remotes over the file transport, so the tests exercise the same
//! code path as an HTTPS remote without touching the network.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// A directory of upstream repositories and a deliverables tree.
pub struct GateFixture {
  _root: TempDir,
  pub remotes: PathBuf,
  pub deliverables: PathBuf,
}

impl GateFixture {
  pub fn new() -> Result<Self> {
    let root = TempDir::new()?;
    let remotes = root.path().join("remotes");
    let deliverables = root.path().join("deliverables");
    std::fs::create_dir_all(&remotes)?;
    std::fs::create_dir_all(&deliverables)?;
    Ok(Self {
      _root: root,
      remotes,
      deliverables,
    })
  }

  /// Create an upstream repository for `repo` (e.g. `example/widget`) with
  /// one initial commit.
  pub fn add_remote(&self, repo: &str) -> Result<RemoteRepo> {
    let path = self.remotes.join(repo);
    std::fs::create_dir_all(&path)?;
    git(&path, &["init", "--initial-branch=main"])?;
    git(&path, &["config", "user.name", "Test User"])?;
    git(&path, &["config", "user.email", "test@example.com"])?;
    let remote = RemoteRepo { path };
    remote.commit("initial commit")?;
    Ok(remote)
  }

  /// Write `<deliverables>/<series>/<name>.yaml` and return its path.
  pub fn write_deliverable(&self, series: &str, name: &str, content: &str) -> Result<PathBuf> {
    let dir = self.deliverables.join(series);
    std::fs::create_dir_all(&dir)?;
    let path = dir.join(format!("{}.yaml", name));
    std::fs::write(&path, content)?;
    Ok(path)
  }

  /// Run `relgate check` for one deliverable file against the fixture's
  /// remotes. Does not fail on a non-zero exit; callers assert on it.
  pub fn check(&self, series: &str, file: &Path, extra: &[&str]) -> Result<Output> {
    let remote_base = self.remotes.display().to_string();
    let root = self.deliverables.display().to_string();
    let file = file.display().to_string();
    let mut args = vec![
      "check",
      "--deliverables-root",
      &root,
      "--current-series",
      series,
      "--remote-base",
      &remote_base,
      &file,
    ];
    args.extend_from_slice(extra);
    run_relgate(&args)
  }
}

/// One upstream repository.
pub struct RemoteRepo {
  pub path: PathBuf,
}

impl RemoteRepo {
  /// Add a commit on the current branch, returning its hash.
  pub fn commit(&self, message: &str) -> Result<String> {
    let marker = self.path.join("CHANGES");
    let mut content = std::fs::read_to_string(&marker).unwrap_or_default();
    content.push_str(message);
    content.push('\n');
    std::fs::write(&marker, content)?;
    git(&self.path, &["add", "."])?;
    git(&self.path, &["commit", "-m", message])?;
    self.head()
  }

  /// Add a commit with no shared history, returning its hash.
  pub fn orphan_commit(&self, branch: &str, message: &str) -> Result<String> {
    git(&self.path, &["checkout", "--orphan", branch])?;
    std::fs::write(self.path.join("ORPHAN"), message)?;
    git(&self.path, &["add", "."])?;
    git(&self.path, &["commit", "-m", message])?;
    let hash = self.head()?;
    git(&self.path, &["checkout", "main"])?;
    Ok(hash)
  }

  pub fn tag(&self, name: &str) -> Result<()> {
    git(&self.path, &["tag", name])?;
    Ok(())
  }

  /// Create (or move) a branch pointing at `commit`.
  pub fn branch_at(&self, name: &str, commit: &str) -> Result<()> {
    git(&self.path, &["branch", "-f", name, commit])?;
    Ok(())
  }

  pub fn head(&self) -> Result<String> {
    let output = git(&self.path, &["rev-parse", "HEAD"])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }
}

/// Run git command in a directory
pub fn git(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = Command::new("git")
    .current_dir(cwd)
    .args(args)
    .output()
    .context("Failed to run git command")?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!("Git command failed: git {}\n{}", args.join(" "), stderr);
  }

  Ok(output)
}

/// Run the relgate CLI; non-zero exits are returned, not errors.
pub fn run_relgate(args: &[&str]) -> Result<Output> {
  let bin = env!("CARGO_BIN_EXE_relgate");
  Command::new(bin).args(args).output().context("Failed to run relgate")
}

pub fn stdout_of(output: &Output) -> String {
  String::from_utf8_lossy(&output.stdout).to_string()
}

/// A deliverable document that passes every rule when `hash` exists in
/// `example/widget` on the default branch.
pub fn valid_document(version: &str, hash: &str) -> String {
  format!(
    "\
team: release-management
release-model: cycle-with-intermediary
tracker:
  kind: bugs
  id: widget
announce-to: release-announce@example.org
repository-settings:
  example/widget: {{}}
releases:
  - version: {}
    projects:
      - repo: example/widget
        hash: {}
",
    version, hash
  )
}
