//! Version-control transport abstraction
//!
//! The validation engine only needs a handful of read operations against a
//! local clone plus the initial clone itself. They are expressed as a trait
//! so the engine tolerates either the system git binary or an embedded
//! implementation; the default backend shells out to git.

mod system_git;

pub use system_git::SystemGit;

use crate::core::error::GateResult;
use std::path::Path;
use std::time::Duration;

/// Read operations the validation engine performs against a repository.
///
/// All queries are read-only against an existing local clone. Only
/// `clone_repo` touches the network, and it is bounded by a timeout so a
/// stuck transport fails the operation instead of hanging the run.
pub trait Vcs: Send + Sync {
  /// Clone `url` into `dest` with full history. All-or-nothing: on failure
  /// no partial clone is left at `dest`.
  fn clone_repo(&self, url: &str, dest: &Path, timeout: Duration) -> GateResult<()>;

  /// Resolve a commit hash, tag, or other ref to a full commit hash.
  /// Returns `None` when the ref does not resolve; only transport or
  /// subprocess failures are errors.
  fn resolve_ref(&self, clone: &Path, reference: &str) -> GateResult<Option<String>>;

  /// Whether `reference` resolves to a commit in the clone.
  fn commit_exists(&self, clone: &Path, reference: &str) -> GateResult<bool> {
    Ok(self.resolve_ref(clone, reference)?.is_some())
  }

  /// Resolve a tag name to the commit it points at.
  fn resolve_tag(&self, clone: &Path, tag: &str) -> GateResult<Option<String>>;

  /// Whether walking `descendant`'s history reaches `ancestor`.
  fn is_ancestor(&self, clone: &Path, ancestor: &str, descendant: &str) -> GateResult<bool>;

  /// Tip commit of a remote branch, `None` when the branch does not exist
  /// upstream.
  fn branch_tip(&self, clone: &Path, branch: &str) -> GateResult<Option<String>>;

  /// The commit where `branch` diverged from the default branch: the merge
  /// base of the branch tip and the default branch head. `None` when the
  /// branch does not exist upstream.
  fn branch_base(&self, clone: &Path, branch: &str) -> GateResult<Option<String>>;
}
