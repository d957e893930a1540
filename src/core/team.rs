//! Team governance table
//!
//! Maps owning teams to the deliverables and repositories they govern. The
//! table is loaded from a YAML document once per validation run; rules
//! consult it to cross-check claimed repositories and team names.

use crate::core::error::{GateResult, ResultExt};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Governance data for one team.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TeamInfo {
  #[serde(default)]
  pub deliverables: BTreeMap<String, DeliverableGovernance>,
}

/// Governance entry for one deliverable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeliverableGovernance {
  #[serde(default)]
  pub repos: Vec<String>,
}

/// The full team table, keyed by team name.
#[derive(Debug, Clone, Default)]
pub struct TeamData {
  teams: BTreeMap<String, TeamInfo>,
}

impl TeamData {
  pub fn load(path: &Path) -> GateResult<TeamData> {
    let content =
      fs::read_to_string(path).with_context(|| format!("Failed to read team data from {}", path.display()))?;
    TeamData::parse(&content)
  }

  pub fn parse(content: &str) -> GateResult<TeamData> {
    let teams: BTreeMap<String, TeamInfo> = serde_yaml::from_str(content)?;
    Ok(TeamData { teams })
  }

  pub fn team_exists(&self, name: &str) -> bool {
    self.teams.contains_key(name)
  }

  /// Repositories governance lists for a deliverable, searched across all
  /// teams. `None` when no team governs a deliverable by that name.
  pub fn repos_for_deliverable(&self, deliverable: &str) -> Option<&[String]> {
    self
      .teams
      .values()
      .find_map(|team| team.deliverables.get(deliverable))
      .map(|gov| gov.repos.as_slice())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const TABLE: &str = "\
release-management:
  deliverables:
    widget:
      repos:
        - example/widget
        - example/widget-tools
";

  #[test]
  fn test_team_exists() {
    let data = TeamData::parse(TABLE).unwrap();
    assert!(data.team_exists("release-management"));
    assert!(!data.team_exists("nonsense-name"));
  }

  #[test]
  fn test_repos_for_deliverable() {
    let data = TeamData::parse(TABLE).unwrap();
    let repos = data.repos_for_deliverable("widget").unwrap();
    assert_eq!(repos, ["example/widget", "example/widget-tools"]);
    assert!(data.repos_for_deliverable("unknown").is_none());
  }

  #[test]
  fn test_extra_team_fields_are_ignored() {
    let table = "\
release-management:
  mission: coordinate releases
  deliverables: {}
";
    // Unrecognized per-team keys are fine; only the structure we use is typed.
    let data = TeamData::parse(table).unwrap();
    assert!(data.team_exists("release-management"));
  }
}
