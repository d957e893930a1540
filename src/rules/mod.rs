//! Validation rule engine
//!
//! Rules are independent functions over `(Deliverable, ValidationContext)`.
//! Each entry in the rule table carries zero or more applicability guards;
//! when any guard fails the rule is skipped silently. Rules run in the
//! declared order, and later rules may rely on earlier rules having warmed
//! shared caches, but never on their diagnostics.

mod branches;
mod info;
mod releases;
mod series;

pub use branches::*;
pub use info::*;
pub use releases::*;
pub use series::*;

use crate::core::context::{DiagnosticKind, ValidationContext};
use crate::core::error::{GateError, GateResult, GitError};
use crate::deliverable::Deliverable;
use serde::Serialize;

/// A single validation rule.
pub type RuleFn = fn(&Deliverable, &mut ValidationContext);

/// Applicability guard evaluated before a rule body runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Guard {
  /// Skip unless the deliverable belongs to the current release series.
  Current,
  /// Skip unless the deliverable has at least one release.
  Released,
  /// Skip deliverables released outside any cycle.
  Cycle,
}

impl Guard {
  pub fn applies(self, deliv: &Deliverable, ctx: &ValidationContext) -> bool {
    match self {
      Guard::Current => deliv.series == ctx.config().current_series,
      Guard::Released => deliv.is_released(),
      Guard::Cycle => !deliv.is_independent(),
    }
  }
}

/// One entry in the rule table.
pub struct RuleEntry {
  pub name: &'static str,
  pub description: &'static str,
  pub guards: &'static [Guard],
  pub run: RuleFn,
}

/// The rule table, in execution order.
pub const RULES: &[RuleEntry] = &[
  RuleEntry {
    name: "team",
    description: "Owning team is listed in the governance table",
    guards: &[],
    run: check_team,
  },
  RuleEntry {
    name: "tracker",
    description: "Bug tracker coordinates are present and resolvable",
    guards: &[],
    run: check_tracker,
  },
  RuleEntry {
    name: "announce-to",
    description: "Announcement address is present and well-formed",
    guards: &[],
    run: check_announce_to,
  },
  RuleEntry {
    name: "release-model",
    description: "Release model is consistent with the series",
    guards: &[Guard::Current],
    run: check_release_model,
  },
  RuleEntry {
    name: "version-numbers",
    description: "Every release version is well-formed",
    guards: &[Guard::Released],
    run: check_version_numbers,
  },
  RuleEntry {
    name: "versions-ascending",
    description: "Releases are recorded in increasing version order",
    guards: &[Guard::Released],
    run: check_versions_ascending,
  },
  RuleEntry {
    name: "sha-existence",
    description: "Claimed commits exist in their repositories",
    guards: &[Guard::Released],
    run: check_sha_existence,
  },
  RuleEntry {
    name: "existing-tags",
    description: "Already-tagged versions match their claimed commits",
    guards: &[Guard::Released],
    run: check_existing_tags,
  },
  RuleEntry {
    name: "branch-membership",
    description: "Release commits sit on the expected branch lineage",
    guards: &[Guard::Released],
    run: check_branch_membership,
  },
  RuleEntry {
    name: "governance-repos",
    description: "Tagged repositories agree with governance and settings",
    guards: &[Guard::Current, Guard::Released],
    run: check_governance_repos,
  },
  RuleEntry {
    name: "branch-prefixes",
    description: "Branch names use a recognized prefix",
    guards: &[],
    run: check_branch_prefixes,
  },
  RuleEntry {
    name: "stable-branches",
    description: "Stable branch requests agree with the release history",
    guards: &[],
    run: check_stable_branches,
  },
  RuleEntry {
    name: "feature-branches",
    description: "Feature branch locations pin existing commits",
    guards: &[],
    run: check_feature_branches,
  },
  RuleEntry {
    name: "driverfixes-branches",
    description: "Driver-fix branches reference closed series and commits",
    guards: &[],
    run: check_driverfixes_branches,
  },
  RuleEntry {
    name: "branch-points",
    description: "Existing upstream branches start where declared",
    guards: &[],
    run: check_branch_points,
  },
  RuleEntry {
    name: "series-open",
    description: "Previous series was branched before this one opened",
    guards: &[Guard::Current, Guard::Cycle],
    run: check_series_open,
  },
  RuleEntry {
    name: "series-first",
    description: "The first release of a series uses a first-release form",
    guards: &[Guard::Cycle, Guard::Released],
    run: check_series_first,
  },
  RuleEntry {
    name: "series-final",
    description: "Final releases match their last release candidate",
    guards: &[Guard::Released],
    run: check_series_final,
  },
];

/// Whether all guards pass; evaluation short-circuits on the first failure.
pub fn applies(guards: &[Guard], deliv: &Deliverable, ctx: &ValidationContext) -> bool {
  guards.iter().all(|guard| guard.applies(deliv, ctx))
}

/// Run every applicable rule against one deliverable.
pub fn run_rules(deliv: &Deliverable, ctx: &mut ValidationContext) {
  for entry in RULES {
    if applies(entry.guards, deliv, ctx) {
      (entry.run)(deliv, ctx);
    }
  }
}

/// Unwrap a cache query inside a rule body.
///
/// Expected lookups never abort a rule; transport failures are recorded as
/// a Transport diagnostic and the rule skips the affected repository.
/// Missing refs surface as `None` so callers can fall back to diagnostics
/// already recorded by earlier rules.
pub(crate) fn transport<T>(ctx: &mut ValidationContext, result: GateResult<T>) -> Option<T> {
  match result {
    Ok(value) => Some(value),
    Err(GateError::Git(GitError::RefNotFound { .. })) => None,
    Err(err) => {
      ctx.error(DiagnosticKind::Transport, err.to_string());
      None
    }
  }
}
