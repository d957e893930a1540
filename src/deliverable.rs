//! Typed model of one release-metadata document
//!
//! A deliverable document describes one named component: the chronological
//! list of releases it has made in a series, the auxiliary branches it
//! wants, and a closed set of typed attributes individual rules consume.
//! The series name and deliverable name come from the document's location
//! (`<root>/<series>/<name>.yaml`), not the document body.
//!
//! Loading is deliberately strict about shape but lenient about extras:
//! unrecognized top-level keys are reported back to the caller as warnings
//! rather than silently ignored or rejected.

use crate::core::context::INDEPENDENT_SERIES;
use crate::core::error::{GateError, GateResult, ResultExt};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Recognized top-level keys of a deliverable document.
pub const KNOWN_KEYS: &[&str] = &[
  "team",
  "releases",
  "branches",
  "release-model",
  "release-type",
  "stable-branch-type",
  "artifact-link-mode",
  "tracker",
  "announce-to",
  "repository-settings",
];

/// How a deliverable's releases relate to the release cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReleaseModel {
  CycleWithIntermediary,
  CycleWithMilestones,
  CycleTrailing,
  Independent,
  Untagged,
}

impl ReleaseModel {
  /// Models tied to the release cycle (everything except independent).
  pub fn is_cycle_based(self) -> bool {
    !matches!(self, ReleaseModel::Independent)
  }
}

/// Artifact classification of a deliverable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReleaseType {
  Standard,
  Library,
  Service,
  /// Pass-through artifact with no independent versioning; such
  /// deliverables never carry feature or driver-fix branches.
  Passthrough,
}

/// How stable branch locations are expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StableBranchType {
  /// Location is a released version string (the branch starts at a tag).
  #[default]
  Std,
  /// Location is an explicit per-repository commit mapping.
  Tagless,
  /// Anything else; rejected by the stable-branch rule.
  #[serde(other)]
  Unknown,
}

/// Bug-tracker coordinates for existence checks.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackerRef {
  pub kind: String,
  pub id: String,
}

/// One repository's contribution to a release.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectRef {
  pub repo: String,
  pub hash: String,
  #[serde(rename = "artifact-base", default)]
  pub artifact_base: Option<String>,
}

/// One version bump of the deliverable.
#[derive(Debug, Clone, Deserialize)]
pub struct Release {
  pub version: String,
  #[serde(default)]
  pub projects: Vec<ProjectRef>,
}

impl Release {
  pub fn project_for(&self, repo: &str) -> Option<&ProjectRef> {
    self.projects.iter().find(|p| p.repo == repo)
  }
}

/// Where an auxiliary branch should start.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum BranchLocation {
  /// A version string; the branch starts at that release's tag.
  Version(String),
  /// Explicit commit per repository.
  Pins(BTreeMap<String, String>),
}

/// A request to create or validate an auxiliary branch.
#[derive(Debug, Clone, Deserialize)]
pub struct BranchRequest {
  pub name: String,
  pub location: BranchLocation,
}

impl BranchRequest {
  /// `("stable", "bexar")` for `stable/bexar`; `None` when there is no
  /// slash-separated prefix.
  pub fn split_name(&self) -> Option<(&str, &str)> {
    let (prefix, rest) = self.name.split_once('/')?;
    if prefix.is_empty() || rest.is_empty() || rest.contains('/') {
      return None;
    }
    Some((prefix, rest))
  }
}

/// Per-repository settings carried by the document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RepoSettings {}

#[derive(Debug, Clone, Default, Deserialize)]
struct RawDeliverable {
  #[serde(default)]
  team: Option<String>,
  #[serde(default)]
  releases: Option<Vec<Release>>,
  #[serde(default)]
  branches: Option<Vec<BranchRequest>>,
  #[serde(rename = "release-model", default)]
  release_model: Option<ReleaseModel>,
  #[serde(rename = "release-type", default)]
  release_type: Option<ReleaseType>,
  #[serde(rename = "stable-branch-type", default)]
  stable_branch_type: Option<StableBranchType>,
  #[serde(rename = "artifact-link-mode", default)]
  artifact_link_mode: Option<String>,
  #[serde(default)]
  tracker: Option<TrackerRef>,
  #[serde(rename = "announce-to", default)]
  announce_to: Option<String>,
  #[serde(rename = "repository-settings", default)]
  repository_settings: BTreeMap<String, RepoSettings>,
}

/// One parsed release-metadata document.
#[derive(Debug, Clone)]
pub struct Deliverable {
  pub team: Option<String>,
  pub series: String,
  pub name: String,
  pub releases: Vec<Release>,
  pub branches: Vec<BranchRequest>,
  pub release_model: Option<ReleaseModel>,
  pub release_type: Option<ReleaseType>,
  pub stable_branch_type: StableBranchType,
  pub artifact_link_mode: Option<String>,
  pub tracker: Option<TrackerRef>,
  pub announce_to: Option<String>,
  pub repository_settings: BTreeMap<String, RepoSettings>,
}

impl Deliverable {
  /// Parse the body of a deliverable document. Returns the deliverable and
  /// one message per unrecognized top-level key.
  pub fn from_yaml(series: &str, name: &str, content: &str) -> GateResult<(Deliverable, Vec<String>)> {
    let value: serde_yaml::Value = serde_yaml::from_str(content)?;

    let mut unknown = Vec::new();
    if let serde_yaml::Value::Mapping(mapping) = &value {
      for key in mapping.keys() {
        if let serde_yaml::Value::String(key) = key
          && !KNOWN_KEYS.contains(&key.as_str())
        {
          unknown.push(format!("unrecognized key {:?} in deliverable {}", key, name));
        }
      }
    }

    let raw: RawDeliverable = if value.is_null() {
      RawDeliverable::default()
    } else {
      serde_yaml::from_value(value)?
    };

    let deliverable = Deliverable {
      team: raw.team,
      series: series.to_string(),
      name: name.to_string(),
      releases: raw.releases.unwrap_or_default(),
      branches: raw.branches.unwrap_or_default(),
      release_model: raw.release_model,
      release_type: raw.release_type,
      stable_branch_type: raw.stable_branch_type.unwrap_or_default(),
      artifact_link_mode: raw.artifact_link_mode,
      tracker: raw.tracker,
      announce_to: raw.announce_to,
      repository_settings: raw.repository_settings,
    };

    Ok((deliverable, unknown))
  }

  /// Load a document from `<root>/<series>/<name>.yaml`, deriving series
  /// and name from the path.
  pub fn load(path: &Path) -> GateResult<(Deliverable, Vec<String>)> {
    let name = path
      .file_stem()
      .and_then(|stem| stem.to_str())
      .ok_or_else(|| GateError::message(format!("cannot derive deliverable name from {}", path.display())))?;
    let series = path
      .parent()
      .and_then(|dir| dir.file_name())
      .and_then(|dir| dir.to_str())
      .ok_or_else(|| GateError::message(format!("cannot derive series name from {}", path.display())))?;

    let content =
      fs::read_to_string(path).with_context(|| format!("Failed to read deliverable from {}", path.display()))?;
    Deliverable::from_yaml(series, name, &content)
  }

  pub fn is_independent(&self) -> bool {
    self.series == INDEPENDENT_SERIES
  }

  pub fn is_released(&self) -> bool {
    !self.releases.is_empty()
  }

  pub fn is_passthrough(&self) -> bool {
    self.release_type == Some(ReleaseType::Passthrough)
  }

  pub fn latest_release(&self) -> Option<&Release> {
    self.releases.last()
  }

  pub fn display_name(&self) -> String {
    format!("{}/{}", self.series, self.name)
  }
}

/// Whether a string looks like a full commit hash (40 hex characters,
/// case-insensitive).
pub fn is_commit_hash(value: &str) -> bool {
  value.len() == 40 && value.chars().all(|c| c.is_ascii_hexdigit())
}
