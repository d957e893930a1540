//! Version string parsing and ordering
//!
//! Release versions are dot-separated decimal segments where the final
//! segment may carry a pre-release suffix, e.g. `1.5.0`, `1.5.1.0b2`,
//! `1.5.1.0rc1`. Ordering follows the packaging convention the release
//! process publishes with: betas sort before release candidates, and both
//! sort before the final version with the same release segments.

use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::sync::OnceLock;

/// Pre-release marker carried by the last version segment.
///
/// Ordering is part of the contract: `Beta < Candidate < Final`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PreReleaseKind {
  Beta,
  Candidate,
  Final,
}

/// A parsed release version.
#[derive(Debug, Clone)]
pub struct Version {
  segments: Vec<u64>,
  kind: PreReleaseKind,
  pre_number: Option<u64>,
  raw: String,
}

fn suffix_re() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r"^(\d+)(b|rc)(\d+)$").unwrap())
}

impl Version {
  /// Parse a version string, collecting every format problem found.
  pub fn parse(value: &str) -> Result<Version, Vec<String>> {
    let mut problems = Vec::new();

    if value.is_empty() {
      return Err(vec!["version string is empty".to_string()]);
    }

    let parts: Vec<&str> = value.split('.').collect();
    let mut segments = Vec::with_capacity(parts.len());
    let mut kind = PreReleaseKind::Final;
    let mut pre_number = None;

    for (i, part) in parts.iter().enumerate() {
      if part.is_empty() {
        problems.push(format!("empty segment in version {:?}", value));
        continue;
      }
      if part.chars().all(|c| c.is_ascii_digit()) {
        match part.parse::<u64>() {
          Ok(n) => segments.push(n),
          Err(_) => problems.push(format!("segment {:?} in version {:?} is out of range", part, value)),
        }
        continue;
      }
      // Only the last segment may carry a pre-release suffix.
      if i == parts.len() - 1
        && let Some(caps) = suffix_re().captures(part)
      {
        match caps[1].parse::<u64>() {
          Ok(n) => segments.push(n),
          Err(_) => problems.push(format!("segment {:?} in version {:?} is out of range", part, value)),
        }
        kind = match &caps[2] {
          "b" => PreReleaseKind::Beta,
          _ => PreReleaseKind::Candidate,
        };
        match caps[3].parse::<u64>() {
          Ok(n) => pre_number = Some(n),
          Err(_) => {
            problems.push(format!("pre-release number in segment {:?} of version {:?} is out of range", part, value))
          }
        }
        continue;
      }
      problems.push(format!("segment {:?} in version {:?} is not a number or recognized pre-release form", part, value));
    }

    if problems.is_empty() {
      Ok(Version {
        segments,
        kind,
        pre_number,
        raw: value.to_string(),
      })
    } else {
      Err(problems)
    }
  }

  /// Release segments, without any pre-release suffix.
  pub fn segments(&self) -> &[u64] {
    &self.segments
  }

  pub fn kind(&self) -> PreReleaseKind {
    self.kind
  }

  pub fn pre_number(&self) -> Option<u64> {
    self.pre_number
  }

  pub fn is_final(&self) -> bool {
    self.kind == PreReleaseKind::Final
  }

  /// True when `self` is a pre-release candidate for the final version
  /// `base` (same release segments, candidate kind).
  pub fn is_candidate_for(&self, base: &Version) -> bool {
    self.kind == PreReleaseKind::Candidate && eq_padded(&self.segments, &base.segments)
  }

  /// True when this version is an accepted form for the very first release
  /// of a series under the given policy.
  pub fn is_first_release(&self, policy: &FirstReleasePolicy) -> bool {
    let trailing_zero = self.segments.last().is_some_and(|n| *n == 0);
    policy.accepted.iter().any(|form| match form {
      FirstReleaseForm::ZeroFinalSegment => self.kind == PreReleaseKind::Final && trailing_zero,
      FirstReleaseForm::Beta => self.kind == PreReleaseKind::Beta && trailing_zero,
      FirstReleaseForm::Candidate => self.kind == PreReleaseKind::Candidate && trailing_zero,
    })
  }
}

fn eq_padded(a: &[u64], b: &[u64]) -> bool {
  cmp_padded(a, b) == Ordering::Equal
}

fn cmp_padded(a: &[u64], b: &[u64]) -> Ordering {
  let len = a.len().max(b.len());
  for i in 0..len {
    let left = a.get(i).copied().unwrap_or(0);
    let right = b.get(i).copied().unwrap_or(0);
    match left.cmp(&right) {
      Ordering::Equal => {}
      other => return other,
    }
  }
  Ordering::Equal
}

impl Ord for Version {
  fn cmp(&self, other: &Self) -> Ordering {
    cmp_padded(&self.segments, &other.segments)
      .then(self.kind.cmp(&other.kind))
      .then(self.pre_number.cmp(&other.pre_number))
  }
}

impl PartialOrd for Version {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl PartialEq for Version {
  fn eq(&self, other: &Self) -> bool {
    self.cmp(other) == Ordering::Equal
  }
}

impl Eq for Version {}

impl fmt::Display for Version {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.raw)
  }
}

/// Validate a version string without constructing a `Version`.
///
/// Returns one description per problem found, empty when well-formed.
pub fn validate_version(value: &str) -> Vec<String> {
  match Version::parse(value) {
    Ok(_) => Vec::new(),
    Err(problems) => problems,
  }
}

/// Accepted version forms for the first release of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirstReleaseForm {
  /// Final version whose last release segment is zero, e.g. `1.5.0`.
  ZeroFinalSegment,
  /// Beta whose numeric tail is zero, e.g. `1.5.1.0b1`.
  Beta,
  /// Release candidate whose numeric tail is zero, e.g. `1.5.1.0rc1`.
  Candidate,
}

/// Policy table for recognized first-release forms.
///
/// The accepted set is policy, not algorithm, so callers can tighten it
/// (e.g. require a pre-release lineage before the first final).
#[derive(Debug, Clone)]
pub struct FirstReleasePolicy {
  pub accepted: Vec<FirstReleaseForm>,
}

impl Default for FirstReleasePolicy {
  fn default() -> Self {
    Self {
      accepted: vec![
        FirstReleaseForm::ZeroFinalSegment,
        FirstReleaseForm::Beta,
        FirstReleaseForm::Candidate,
      ],
    }
  }
}
