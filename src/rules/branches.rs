//! Branch request rules
//!
//! Branch names carry a prefix that selects the applicable rule: `stable/`
//! branches anchor maintenance lines, `feature/` and `driverfixes/`
//! branches pin explicit commits. A name that does not split into exactly
//! `prefix/suffix` is rejected by each branch rule, mirroring how the
//! prefix rule reports it, so a malformed name never hides a branch from
//! validation.

use crate::core::context::{DiagnosticKind, ValidationContext};
use crate::deliverable::{is_commit_hash, BranchLocation, BranchRequest, Deliverable, StableBranchType};
use crate::rules::transport;
use std::collections::BTreeMap;

const BRANCH_PREFIXES: &[&str] = &["stable", "feature", "driverfixes"];

/// Every branch name must start with a recognized prefix.
pub fn check_branch_prefixes(deliv: &Deliverable, ctx: &mut ValidationContext) {
  for branch in &deliv.branches {
    let prefix = branch.name.split('/').next().unwrap_or(&branch.name);
    if !BRANCH_PREFIXES.contains(&prefix) {
      ctx.error(
        DiagnosticKind::Format,
        format!("branch name {:?} does not use a recognized prefix", branch.name),
      );
    }
  }
}

/// Declared starting commits of a branch, one per repository.
///
/// A version-string location resolves through the matching release's
/// project list; a pin mapping is used as-is. Malformed hashes are dropped,
/// the location rules report those.
fn declared_branch_points<'a>(deliv: &'a Deliverable, branch: &'a BranchRequest) -> Vec<(&'a str, &'a str)> {
  let pairs: Vec<(&str, &str)> = match &branch.location {
    BranchLocation::Pins(pins) => pins.iter().map(|(repo, hash)| (repo.as_str(), hash.as_str())).collect(),
    BranchLocation::Version(version) => deliv
      .releases
      .iter()
      .find(|release| &release.version == version)
      .map(|release| {
        release
          .projects
          .iter()
          .map(|project| (project.repo.as_str(), project.hash.as_str()))
          .collect()
      })
      .unwrap_or_default(),
  };
  pairs.into_iter().filter(|(_, hash)| is_commit_hash(hash)).collect()
}

fn check_location_pins(branch_name: &str, pins: &BTreeMap<String, String>, ctx: &mut ValidationContext) {
  for (repo, value) in pins {
    if !is_commit_hash(value) {
      ctx.error(
        DiagnosticKind::Format,
        format!("branch {} pins {} to {:?}, which is not a commit hash", branch_name, repo, value),
      );
      continue;
    }
    let exists = ctx.cache().commit_exists(repo, value);
    if transport(ctx, exists) == Some(false) {
      ctx.error(
        DiagnosticKind::NotFound,
        format!("no commit {} in {} for branch {}", value, repo, branch_name),
      );
    }
  }
}

/// Stable branch requests.
///
/// The location form follows the stable-branch-type: the default type
/// starts the branch at an already-released version, the tagless type (and
/// pass-through deliverables) pins commits per repository. The branch
/// suffix must match the series, and independent deliverables may not cut
/// stable branches unless explicitly excepted.
pub fn check_stable_branches(deliv: &Deliverable, ctx: &mut ValidationContext) {
  for branch in &deliv.branches {
    let Some((prefix, suffix)) = branch.split_name() else {
      ctx.error(DiagnosticKind::Format, format!("invalid branch name {:?}", branch.name));
      continue;
    };
    if prefix != "stable" {
      continue;
    }

    if deliv.stable_branch_type == StableBranchType::Unknown {
      ctx.error(
        DiagnosticKind::Format,
        format!("unrecognized stable-branch-type for {}", deliv.display_name()),
      );
      continue;
    }

    let tagless = deliv.stable_branch_type == StableBranchType::Tagless || deliv.is_passthrough();
    match (&branch.location, tagless) {
      (BranchLocation::Version(version), false) => {
        if !deliv.releases.iter().any(|release| &release.version == version) {
          ctx.error(
            DiagnosticKind::Consistency,
            format!("stable branch {} location {} is not an existing release", branch.name, version),
          );
        }
      }
      (BranchLocation::Version(_), true) => ctx.error(
        DiagnosticKind::Format,
        format!(
          "stable branch {} location must map repositories to commits for this deliverable",
          branch.name
        ),
      ),
      (BranchLocation::Pins(pins), true) => check_location_pins(&branch.name, pins, ctx),
      (BranchLocation::Pins(_), false) => ctx.error(
        DiagnosticKind::Format,
        format!("stable branch {} location must be a released version", branch.name),
      ),
    }

    if deliv.is_independent() {
      if !ctx.config().independent_stable_exceptions.iter().any(|n| n == &deliv.name) {
        ctx.error(
          DiagnosticKind::Consistency,
          format!("independent deliverable {} cannot request stable branch {}", deliv.name, branch.name),
        );
      }
    } else if suffix != deliv.series {
      ctx.error(
        DiagnosticKind::Consistency,
        format!("stable branch {} does not match series {}", branch.name, deliv.series),
      );
    }
  }
}

/// Feature branches always pin explicit, existing commits.
pub fn check_feature_branches(deliv: &Deliverable, ctx: &mut ValidationContext) {
  for branch in &deliv.branches {
    let Some((prefix, _)) = branch.split_name() else {
      ctx.error(DiagnosticKind::Format, format!("invalid branch name {:?}", branch.name));
      continue;
    };
    if prefix != "feature" {
      continue;
    }
    if deliv.is_passthrough() {
      ctx.error(
        DiagnosticKind::Consistency,
        format!("pass-through deliverable {} cannot have feature branch {}", deliv.name, branch.name),
      );
      continue;
    }
    match &branch.location {
      BranchLocation::Version(version) => ctx.error(
        DiagnosticKind::Format,
        format!(
          "feature branch {} location must map repositories to commits, not version {}",
          branch.name, version
        ),
      ),
      BranchLocation::Pins(pins) => check_location_pins(&branch.name, pins, ctx),
    }
  }
}

/// Driver-fix branches pin commits like feature branches, but may only
/// target a series the status table records as closed.
pub fn check_driverfixes_branches(deliv: &Deliverable, ctx: &mut ValidationContext) {
  for branch in &deliv.branches {
    let Some((prefix, suffix)) = branch.split_name() else {
      ctx.error(DiagnosticKind::Format, format!("invalid branch name {:?}", branch.name));
      continue;
    };
    if prefix != "driverfixes" {
      continue;
    }
    if deliv.is_passthrough() {
      ctx.error(
        DiagnosticKind::Consistency,
        format!("pass-through deliverable {} cannot have driverfixes branch {}", deliv.name, branch.name),
      );
      continue;
    }
    let closed = ctx.series_table().is_closed(suffix);
    if !closed {
      ctx.error(
        DiagnosticKind::Consistency,
        format!("driverfixes branches may only target closed series; {} is not one", suffix),
      );
    }
    match &branch.location {
      BranchLocation::Version(version) => ctx.error(
        DiagnosticKind::Format,
        format!(
          "driverfixes branch {} location must map repositories to commits, not version {}",
          branch.name, version
        ),
      ),
      BranchLocation::Pins(pins) => check_location_pins(&branch.name, pins, ctx),
    }
  }
}

/// A branch that already exists upstream must still start where the
/// document says it does. The comparison point is where the branch diverges
/// from the default branch; a mismatch means the branch moved after the
/// request was recorded.
pub fn check_branch_points(deliv: &Deliverable, ctx: &mut ValidationContext) {
  for branch in &deliv.branches {
    if branch.split_name().is_none() {
      continue;
    }
    for (repo, commit) in declared_branch_points(deliv, branch) {
      let tip = ctx.cache().branch_tip(repo, &branch.name);
      let Some(Some(_)) = transport(ctx, tip) else {
        continue;
      };
      let base = ctx.cache().branch_base(repo, &branch.name);
      if let Some(Some(base)) = transport(ctx, base)
        && !base.eq_ignore_ascii_case(commit)
      {
        ctx.error(
          DiagnosticKind::Ancestry,
          format!("branch {} in {} has moved: it starts at {} not {}", branch.name, repo, base, commit),
        );
      }
    }
  }
}
