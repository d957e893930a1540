//! System git backend
//!
//! Invokes the git binary for all operations. Subprocesses run with an
//! isolated environment so user configuration cannot change behavior, and
//! the clone (the only network operation) is bounded by a timeout and made
//! atomic by cloning into a staging path that is renamed on success.

use super::Vcs;
use crate::core::error::{GateError, GateResult, GitError, ResultExt};
use std::fs;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use std::time::{Duration, Instant};

/// Git backend using the system git binary.
pub struct SystemGit;

impl SystemGit {
  /// Create a safe git command with isolated environment
  ///
  /// - Sets working directory to the clone path
  /// - Clears environment variables, whitelisting only PATH and HOME
  /// - Adds safe configuration overrides
  fn git_cmd(clone: &Path) -> Command {
    let mut cmd = Command::new("git");

    cmd.arg("-C").arg(clone);

    // Isolated environment (don't trust global config)
    cmd.env_clear();
    if let Ok(path) = std::env::var("PATH") {
      cmd.env("PATH", path);
    }
    if let Ok(home) = std::env::var("HOME") {
      cmd.env("HOME", home);
    }

    cmd.arg("-c").arg("protocol.version=2");
    cmd.arg("-c").arg("advice.detachedHead=false");

    cmd
  }

  fn run(clone: &Path, args: &[&str]) -> GateResult<Output> {
    SystemGit::git_cmd(clone)
      .args(args)
      .output()
      .with_context(|| format!("Failed to execute git {}", args.join(" ")))
  }

  /// Resolve a ref through `rev-parse --verify`, treating a non-zero exit
  /// as "does not resolve" rather than a failure.
  fn rev_parse(clone: &Path, spec: &str) -> GateResult<Option<String>> {
    let output = SystemGit::run(clone, &["rev-parse", "--verify", "--quiet", spec])?;
    if !output.status.success() {
      return Ok(None);
    }
    let hash = String::from_utf8(output.stdout)?.trim().to_string();
    if hash.is_empty() { Ok(None) } else { Ok(Some(hash)) }
  }

  /// Head of the default branch, preferring the remote's HEAD pointer.
  fn default_branch_head(clone: &Path) -> GateResult<Option<String>> {
    if let Some(head) = SystemGit::rev_parse(clone, "refs/remotes/origin/HEAD")? {
      return Ok(Some(head));
    }
    SystemGit::rev_parse(clone, "HEAD")
  }
}

/// Run a spawned git command to completion, killing it when the deadline
/// passes.
fn wait_with_deadline(cmd: &mut Command, repo_label: &str, timeout: Duration) -> GateResult<Output> {
  cmd.stdout(Stdio::null());
  cmd.stderr(Stdio::piped());

  let mut child = cmd.spawn().context("Failed to spawn git")?;
  let deadline = Instant::now() + timeout;

  loop {
    match child.try_wait()? {
      Some(_) => break,
      None => {
        if Instant::now() >= deadline {
          let _ = child.kill();
          let _ = child.wait();
          return Err(GateError::Git(GitError::Timeout {
            repo: repo_label.to_string(),
            seconds: timeout.as_secs(),
          }));
        }
        std::thread::sleep(Duration::from_millis(50));
      }
    }
  }

  let output = child.wait_with_output().context("Failed to collect git output")?;
  Ok(output)
}

impl Vcs for SystemGit {
  fn clone_repo(&self, url: &str, dest: &Path, timeout: Duration) -> GateResult<()> {
    // Clone into a staging path and rename into place so an interrupted
    // transfer never leaves a half-written clone at `dest`.
    let staging = dest.with_extension("partial");
    if staging.exists() {
      fs::remove_dir_all(&staging)?;
    }

    let mut cmd = Command::new("git");
    cmd.env_clear();
    if let Ok(path) = std::env::var("PATH") {
      cmd.env("PATH", path);
    }
    if let Ok(home) = std::env::var("HOME") {
      cmd.env("HOME", home);
    }
    cmd.args(["clone", "--quiet", url]).arg(&staging);

    let result = wait_with_deadline(&mut cmd, url, timeout);
    match result {
      Ok(output) if output.status.success() => {
        fs::rename(&staging, dest)?;
        Ok(())
      }
      Ok(output) => {
        let _ = fs::remove_dir_all(&staging);
        Err(GateError::Git(GitError::CloneFailed {
          repo: url.to_string(),
          reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }))
      }
      Err(err) => {
        let _ = fs::remove_dir_all(&staging);
        Err(err)
      }
    }
  }

  fn resolve_ref(&self, clone: &Path, reference: &str) -> GateResult<Option<String>> {
    SystemGit::rev_parse(clone, &format!("{}^{{commit}}", reference))
  }

  fn resolve_tag(&self, clone: &Path, tag: &str) -> GateResult<Option<String>> {
    SystemGit::rev_parse(clone, &format!("refs/tags/{}^{{commit}}", tag))
  }

  fn is_ancestor(&self, clone: &Path, ancestor: &str, descendant: &str) -> GateResult<bool> {
    // Both refs must resolve; a missing ref is a hard failure here, not a
    // negative answer.
    for reference in [ancestor, descendant] {
      if self.resolve_ref(clone, reference)?.is_none() {
        return Err(GateError::Git(GitError::RefNotFound {
          repo: clone.display().to_string(),
          reference: reference.to_string(),
        }));
      }
    }

    let output = SystemGit::run(clone, &["merge-base", "--is-ancestor", ancestor, descendant])?;
    match output.status.code() {
      Some(0) => Ok(true),
      Some(1) => Ok(false),
      _ => Err(GateError::Git(GitError::CommandFailed {
        command: format!("git merge-base --is-ancestor {} {}", ancestor, descendant),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
      })),
    }
  }

  fn branch_tip(&self, clone: &Path, branch: &str) -> GateResult<Option<String>> {
    SystemGit::rev_parse(clone, &format!("refs/remotes/origin/{}^{{commit}}", branch))
  }

  fn branch_base(&self, clone: &Path, branch: &str) -> GateResult<Option<String>> {
    let Some(tip) = self.branch_tip(clone, branch)? else {
      return Ok(None);
    };
    let Some(head) = SystemGit::default_branch_head(clone)? else {
      return Ok(None);
    };

    let output = SystemGit::run(clone, &["merge-base", &tip, &head])?;
    if !output.status.success() {
      // Unrelated histories have no merge base.
      return Ok(None);
    }
    let base = String::from_utf8(output.stdout)?.trim().to_string();
    if base.is_empty() { Ok(None) } else { Ok(Some(base)) }
  }
}
