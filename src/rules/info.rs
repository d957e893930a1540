//! Descriptive-attribute rules: team, tracker, announcements, release model.

use crate::core::context::{DiagnosticKind, TrackerError, ValidationContext};
use crate::deliverable::{Deliverable, ReleaseModel};

/// The owning team must be listed in the governance table. An unknown team
/// is advisory only; governance may simply lag behind.
pub fn check_team(deliv: &Deliverable, ctx: &mut ValidationContext) {
  let Some(team) = deliv.team.as_deref() else {
    return;
  };
  let known = match ctx.team_data() {
    Some(data) => data.team_exists(team),
    None => return,
  };
  if !known {
    ctx.warning(format!("team {:?} for {} not in governance data", team, deliv.display_name()));
  }
}

/// Bug-tracker coordinates must be present, and when a tracker backend is
/// wired in, the referenced project must exist.
pub fn check_tracker(deliv: &Deliverable, ctx: &mut ValidationContext) {
  let Some(tracker) = &deliv.tracker else {
    ctx.error(
      DiagnosticKind::Format,
      format!("no tracker given for {}", deliv.display_name()),
    );
    return;
  };
  let Some(client) = ctx.tracker() else {
    return;
  };
  match client.project_exists(&tracker.kind, &tracker.id) {
    Ok(true) => {}
    Ok(false) => ctx.error(
      DiagnosticKind::NotFound,
      format!("tracker project {}/{} does not exist", tracker.kind, tracker.id),
    ),
    Err(TrackerError::Timeout) => {
      ctx.warning(format!(
        "timed out verifying tracker project {}/{}",
        tracker.kind, tracker.id
      ));
    }
    Err(TrackerError::Unreachable(reason)) => ctx.error(
      DiagnosticKind::Transport,
      format!("could not reach tracker for {}/{}: {}", tracker.kind, tracker.id, reason),
    ),
  }
}

/// The announcement address must be present and contain no whitespace.
pub fn check_announce_to(deliv: &Deliverable, ctx: &mut ValidationContext) {
  match deliv.announce_to.as_deref() {
    None => ctx.error(
      DiagnosticKind::Format,
      format!("no announce-to given for {}", deliv.display_name()),
    ),
    Some(address) if address.chars().any(char::is_whitespace) => ctx.error(
      DiagnosticKind::Format,
      format!("found whitespace in announce-to {:?}", address),
    ),
    Some(_) => {}
  }
}

/// The release model must agree with the series the document sits in:
/// cycle deliverables need a cycle model, independent deliverables may only
/// declare the independent model, and untagged deliverables never release.
pub fn check_release_model(deliv: &Deliverable, ctx: &mut ValidationContext) {
  if deliv.is_independent() {
    if let Some(model) = deliv.release_model
      && model.is_cycle_based()
    {
      ctx.error(
        DiagnosticKind::Consistency,
        format!(
          "deliverable in the independent series cannot use release model {:?}",
          model
        ),
      );
    }
  } else {
    match deliv.release_model {
      None => ctx.error(
        DiagnosticKind::Format,
        format!("no release-model given for {}", deliv.display_name()),
      ),
      Some(ReleaseModel::Independent) => ctx.error(
        DiagnosticKind::Consistency,
        format!(
          "deliverable in series {} cannot use the independent release model",
          deliv.series
        ),
      ),
      Some(_) => {}
    }
  }

  if deliv.release_model == Some(ReleaseModel::Untagged) && deliv.is_released() {
    ctx.error(
      DiagnosticKind::Consistency,
      format!("untagged deliverable {} must not list releases", deliv.display_name()),
    );
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::core::context::RunConfig;
  use crate::core::repo_cache::RepoCache;
  use std::sync::Arc;
  use std::time::Duration;

  fn ctx_for(current: &str) -> ValidationContext {
    let cache = RepoCache::new("/tmp/relgate-info-tests", "https://git.example.org", Duration::from_secs(5));
    ValidationContext::with_cache(RunConfig::new(current), cache)
  }

  fn deliv(series: &str, body: &str) -> Deliverable {
    Deliverable::from_yaml(series, "widget", body).unwrap().0
  }

  struct FixedTracker(Result<bool, TrackerError>);

  impl crate::core::context::TrackerLookup for FixedTracker {
    fn project_exists(&self, _kind: &str, _id: &str) -> Result<bool, TrackerError> {
      self.0.clone()
    }
  }

  #[test]
  fn test_missing_tracker_is_an_error() {
    let mut ctx = ctx_for("bexar");
    check_tracker(&deliv("bexar", "---\n"), &mut ctx);
    assert_eq!(1, ctx.error_count());
  }

  #[test]
  fn test_unknown_tracker_project() {
    let mut ctx = ctx_for("bexar");
    ctx.set_tracker(Arc::new(FixedTracker(Ok(false))));
    check_tracker(&deliv("bexar", "tracker:\n  kind: launchpad\n  id: widget\n"), &mut ctx);
    assert_eq!(1, ctx.error_count());
  }

  #[test]
  fn test_tracker_timeout_is_a_warning() {
    let mut ctx = ctx_for("bexar");
    ctx.set_tracker(Arc::new(FixedTracker(Err(TrackerError::Timeout))));
    check_tracker(&deliv("bexar", "tracker:\n  kind: launchpad\n  id: widget\n"), &mut ctx);
    assert_eq!(0, ctx.error_count());
    assert_eq!(1, ctx.warning_count());
  }

  #[test]
  fn test_announce_to_required() {
    let mut ctx = ctx_for("bexar");
    check_announce_to(&deliv("bexar", "---\n"), &mut ctx);
    assert_eq!(1, ctx.error_count());
  }

  #[test]
  fn test_announce_to_rejects_whitespace() {
    let mut ctx = ctx_for("bexar");
    check_announce_to(&deliv("bexar", "announce-to: release announce@example.org\n"), &mut ctx);
    assert_eq!(1, ctx.error_count());

    let mut ctx = ctx_for("bexar");
    check_announce_to(&deliv("bexar", "announce-to: release-announce@example.org\n"), &mut ctx);
    assert_eq!(0, ctx.error_count());
  }

  #[test]
  fn test_model_required_for_cycle_series() {
    let mut ctx = ctx_for("bexar");
    check_release_model(&deliv("bexar", "---\n"), &mut ctx);
    assert_eq!(1, ctx.error_count());
  }

  #[test]
  fn test_model_optional_for_independent_series() {
    let mut ctx = ctx_for("bexar");
    check_release_model(&deliv("independent", "---\n"), &mut ctx);
    assert_eq!(0, ctx.error_count());
  }

  #[test]
  fn test_independent_model_requires_independent_series() {
    let mut ctx = ctx_for("bexar");
    check_release_model(&deliv("bexar", "release-model: independent\n"), &mut ctx);
    assert_eq!(1, ctx.error_count());

    let mut ctx = ctx_for("bexar");
    check_release_model(&deliv("independent", "release-model: independent\n"), &mut ctx);
    assert_eq!(0, ctx.error_count());
  }

  #[test]
  fn test_cycle_model_rejected_in_independent_series() {
    let mut ctx = ctx_for("bexar");
    check_release_model(&deliv("independent", "release-model: cycle-with-intermediary\n"), &mut ctx);
    assert_eq!(1, ctx.error_count());
  }

  #[test]
  fn test_untagged_model_rejects_releases() {
    let body = "\
release-model: untagged
releases:
  - version: 1.0.0
    projects:
      - repo: example/widget
        hash: be2885f544637e6ee6139df7dc7bf937925804dd
";
    let mut ctx = ctx_for("bexar");
    check_release_model(&deliv("bexar", body), &mut ctx);
    assert_eq!(1, ctx.error_count());
  }

  #[test]
  fn test_team_check_skipped_without_table() {
    let mut ctx = ctx_for("bexar");
    check_team(&deliv("bexar", "team: release-management\n"), &mut ctx);
    assert_eq!(0, ctx.warning_count());
  }

  #[test]
  fn test_unknown_team_is_a_warning() {
    let dir = tempfile::tempdir().unwrap();
    let table = dir.path().join("teams.yaml");
    std::fs::write(&table, "release-management:\n  deliverables: {}\n").unwrap();

    let mut config = RunConfig::new("bexar");
    config.team_data_path = Some(table);
    let cache = RepoCache::new(dir.path().join("cache"), "https://git.example.org", Duration::from_secs(5));
    let mut ctx = ValidationContext::with_cache(config, cache);

    check_team(&deliv("bexar", "team: no-such-team\n"), &mut ctx);
    assert_eq!(1, ctx.warning_count());
    assert_eq!(0, ctx.error_count());

    let mut ok = ctx.child("other.yaml");
    check_team(&deliv("bexar", "team: release-management\n"), &mut ok);
    assert_eq!(0, ok.warning_count());
  }
}
