//! Rules over the release history: version formats and ordering, commit
//! existence, tag consistency, branch lineage, and governance agreement.

use crate::core::context::{DiagnosticKind, ValidationContext};
use crate::deliverable::{is_commit_hash, Deliverable};
use crate::rules::transport;
use crate::version::{validate_version, Version};
use std::collections::BTreeSet;

/// Every release version must parse as a dot-separated version string.
pub fn check_version_numbers(deliv: &Deliverable, ctx: &mut ValidationContext) {
  for release in &deliv.releases {
    for problem in validate_version(&release.version) {
      ctx.error(DiagnosticKind::Format, problem);
    }
  }
}

/// Releases must be recorded oldest first; each entry must sort strictly
/// above its predecessor. Unparseable versions are skipped here, the
/// version-format rule already reported them.
pub fn check_versions_ascending(deliv: &Deliverable, ctx: &mut ValidationContext) {
  let parsed: Vec<Option<Version>> = deliv
    .releases
    .iter()
    .map(|release| Version::parse(&release.version).ok())
    .collect();

  for pair in parsed.windows(2) {
    if let [Some(prev), Some(next)] = pair
      && next <= prev
    {
      ctx.error(
        DiagnosticKind::Consistency,
        format!("release {} must come after {}, not before it", next, prev),
      );
    }
  }
}

/// Every claimed commit must be a well-formed hash that exists in its
/// repository. Malformed hashes never reach the repository.
pub fn check_sha_existence(deliv: &Deliverable, ctx: &mut ValidationContext) {
  for release in &deliv.releases {
    for project in &release.projects {
      if !is_commit_hash(&project.hash) {
        ctx.error(
          DiagnosticKind::Format,
          format!(
            "{} version {} refers to {:?}, which is not a commit hash",
            project.repo, release.version, project.hash
          ),
        );
        continue;
      }
      let exists = ctx.cache().commit_exists(&project.repo, &project.hash);
      match transport(ctx, exists) {
        Some(true) | None => {}
        Some(false) => ctx.error(
          DiagnosticKind::NotFound,
          format!("no commit {} in {}", project.hash, project.repo),
        ),
      }
    }
  }
}

/// When a version is already tagged upstream, the tag must point at the
/// claimed commit. An absent tag means a new release and is fine.
pub fn check_existing_tags(deliv: &Deliverable, ctx: &mut ValidationContext) {
  for release in &deliv.releases {
    for project in &release.projects {
      if !is_commit_hash(&project.hash) {
        continue;
      }
      let resolved = ctx.cache().resolve_tag(&project.repo, &release.version);
      if let Some(Some(tagged)) = transport(ctx, resolved)
        && !tagged.eq_ignore_ascii_case(&project.hash)
      {
        ctx.error(
          DiagnosticKind::Consistency,
          format!(
            "version {} in {} is tagged at {} not {}",
            release.version, project.repo, tagged, project.hash
          ),
        );
      }
    }
  }
}

/// Release commits must sit on the branch the series releases from, and a
/// new release must descend from the deliverable's previous release.
///
/// The expected branch is the default branch for the current series and
/// `stable/<series>` otherwise; a stable branch that has not been cut yet
/// degrades the first check silently. Repositories absent from the previous
/// release only draw a warning, new repositories do join deliverables.
pub fn check_branch_membership(deliv: &Deliverable, ctx: &mut ValidationContext) {
  let expected_branch = if deliv.is_independent() {
    None
  } else if deliv.series == ctx.config().current_series {
    Some("origin/HEAD".to_string())
  } else {
    Some(format!("origin/stable/{}", deliv.series))
  };

  let mut previous: Option<usize> = None;
  for (index, release) in deliv.releases.iter().enumerate() {
    for project in &release.projects {
      if !is_commit_hash(&project.hash) {
        continue;
      }
      let exists = ctx.cache().commit_exists(&project.repo, &project.hash);
      if transport(ctx, exists) != Some(true) {
        continue;
      }

      if let Some(branch) = &expected_branch {
        let tip = ctx.cache().resolve_ref(&project.repo, branch);
        if let Some(Some(tip)) = transport(ctx, tip) {
          let on_branch = ctx.cache().is_ancestor(&project.repo, &project.hash, &tip);
          if transport(ctx, on_branch) == Some(false) {
            ctx.error(
              DiagnosticKind::Ancestry,
              format!(
                "commit {} for version {} is not on branch {} of {}",
                project.hash, release.version, branch, project.repo
              ),
            );
          }
        }
      }

      // Lineage against the previous release only matters for versions not
      // tagged yet; history that already shipped is not re-litigated.
      let tagged = ctx.cache().tag_exists(&project.repo, &release.version);
      if transport(ctx, tagged) != Some(false) {
        continue;
      }
      let Some(prev) = previous.map(|i| &deliv.releases[i]) else {
        continue;
      };
      match prev.project_for(&project.repo) {
        None => ctx.warning(format!(
          "{} was not part of the previous release {}",
          project.repo, prev.version
        )),
        Some(prev_project) => {
          if !is_commit_hash(&prev_project.hash) {
            continue;
          }
          let descends = ctx.cache().is_ancestor(&project.repo, &prev_project.hash, &project.hash);
          if transport(ctx, descends) == Some(false) {
            ctx.error(
              DiagnosticKind::Ancestry,
              format!(
                "commit {} for version {} does not descend from {} ({})",
                project.hash, release.version, prev.version, project.repo
              ),
            );
          }
        }
      }
    }
    previous = Some(index);
  }
}

/// The repositories tagged by the latest release must agree with the
/// governance table and the document's own repository-settings section.
pub fn check_governance_repos(deliv: &Deliverable, ctx: &mut ValidationContext) {
  let Some(latest) = deliv.latest_release() else {
    return;
  };
  let tagged: BTreeSet<String> = latest.projects.iter().map(|p| p.repo.clone()).collect();

  let governed: Option<Vec<String>> = ctx
    .team_data()
    .and_then(|data| data.repos_for_deliverable(&deliv.name))
    .map(|repos| repos.to_vec());
  if let Some(governed) = governed {
    for repo in &tagged {
      if !governed.iter().any(|g| g == repo) {
        ctx.warning(format!("{} is not listed for {} in governance data", repo, deliv.name));
      }
    }
    for repo in &governed {
      if !tagged.contains(repo) {
        ctx.warning(format!(
          "governance lists {} for {} but release {} does not tag it",
          repo, deliv.name, latest.version
        ));
      }
    }
  }

  for repo in &tagged {
    if !deliv.repository_settings.contains_key(repo) {
      ctx.error(
        DiagnosticKind::Consistency,
        format!("{} is tagged by {} but missing from repository-settings", repo, latest.version),
      );
    }
  }
  for repo in deliv.repository_settings.keys() {
    if !tagged.contains(repo) {
      ctx.warning(format!(
        "{} appears in repository-settings but release {} does not tag it",
        repo, latest.version
      ));
    }
  }
}
