//! Series lifecycle rules: opening a new series, its first release, and
//! final releases against their candidates.

use crate::core::context::{DiagnosticKind, ValidationContext, INDEPENDENT_SERIES};
use crate::deliverable::Deliverable;
use crate::version::Version;
use std::fs;

/// When a new series opens, the same deliverable in the previous series
/// should already have its stable branch. Series directories sort
/// chronologically by name, so the predecessor is the lexicographic
/// neighbor. Everything here degrades silently except the one advisory
/// finding; a half-present predecessor is not this document's problem.
pub fn check_series_open(deliv: &Deliverable, ctx: &mut ValidationContext) {
  let filename = ctx.filename().to_path_buf();
  let Some(series_dir) = filename.parent() else {
    return;
  };
  let Some(root) = series_dir.parent() else {
    return;
  };
  let Some(my_series) = series_dir.file_name().and_then(|n| n.to_str()) else {
    return;
  };
  let Ok(entries) = fs::read_dir(root) else {
    return;
  };

  let mut series_dirs: Vec<String> = entries
    .flatten()
    .filter(|entry| entry.path().is_dir())
    .filter_map(|entry| entry.file_name().into_string().ok())
    .filter(|name| name != INDEPENDENT_SERIES)
    .collect();
  series_dirs.sort();

  let Some(position) = series_dirs.iter().position(|name| name == my_series) else {
    return;
  };
  if position == 0 {
    return;
  }
  let predecessor = &series_dirs[position - 1];

  let Some(file_name) = filename.file_name() else {
    return;
  };
  let sibling = root.join(predecessor).join(file_name);
  if !sibling.exists() {
    return;
  }
  let Ok((previous, _)) = Deliverable::load(&sibling) else {
    return;
  };

  let branched = previous
    .branches
    .iter()
    .any(|branch| matches!(branch.split_name(), Some(("stable", _))));
  if !branched {
    ctx.warning(format!("{} has not been branched in {} yet", deliv.name, predecessor));
  }
}

/// The very first release of a deliverable in a series must use a
/// first-release version form. Fires only while the history holds exactly
/// one entry; once a second release lands the window has passed.
pub fn check_series_first(deliv: &Deliverable, ctx: &mut ValidationContext) {
  if deliv.releases.len() != 1 {
    return;
  }
  let Ok(version) = Version::parse(&deliv.releases[0].version) else {
    return;
  };
  if !version.is_first_release(&ctx.config().first_release_policy) {
    ctx.error(
      DiagnosticKind::Format,
      format!("version {} is not an acceptable first release in a series", version),
    );
  }
}

/// A final release preceded by release candidates must retag the commits of
/// the last candidate, per repository. A final without any candidate
/// lineage is fine.
pub fn check_series_final(deliv: &Deliverable, ctx: &mut ValidationContext) {
  for (index, release) in deliv.releases.iter().enumerate() {
    let Ok(version) = Version::parse(&release.version) else {
      continue;
    };
    if !version.is_final() {
      continue;
    }
    let candidate = deliv.releases[..index].iter().rev().find(|earlier| {
      Version::parse(&earlier.version)
        .map(|v| v.is_candidate_for(&version))
        .unwrap_or(false)
    });
    let Some(candidate) = candidate else {
      continue;
    };

    for project in &release.projects {
      match candidate.project_for(&project.repo) {
        Some(rc_project) if rc_project.hash.eq_ignore_ascii_case(&project.hash) => {}
        Some(rc_project) => ctx.error(
          DiagnosticKind::Consistency,
          format!(
            "final {} tags {} at {} but candidate {} is at {}",
            release.version, project.repo, project.hash, candidate.version, rc_project.hash
          ),
        ),
        None => ctx.error(
          DiagnosticKind::Consistency,
          format!(
            "{} is tagged in final {} but absent from candidate {}",
            project.repo, release.version, candidate.version
          ),
        ),
      }
    }
  }
}
