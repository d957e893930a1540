//! End-to-end checks against real git repositories.

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_clean_document_passes() -> Result<()> {
  let fixture = GateFixture::new()?;
  let remote = fixture.add_remote("example/widget")?;
  let hash = remote.head()?;

  let file = fixture.write_deliverable("bexar", "widget", &valid_document("1.0.0", &hash))?;
  let output = fixture.check("bexar", &file, &[])?;

  assert_eq!(Some(0), output.status.code(), "{}", stdout_of(&output));
  assert!(stdout_of(&output).contains("0 error(s)"));
  Ok(())
}

#[test]
fn test_missing_commit_fails() -> Result<()> {
  let fixture = GateFixture::new()?;
  fixture.add_remote("example/widget")?;

  let bogus = "c".repeat(40);
  let file = fixture.write_deliverable("bexar", "widget", &valid_document("1.0.0", &bogus))?;
  let output = fixture.check("bexar", &file, &[])?;

  assert_eq!(Some(3), output.status.code());
  assert!(stdout_of(&output).contains("no commit"));
  Ok(())
}

#[test]
fn test_malformed_hash_is_rejected_without_lookup() -> Result<()> {
  let fixture = GateFixture::new()?;
  fixture.add_remote("example/widget")?;

  let file = fixture.write_deliverable("bexar", "widget", &valid_document("1.0.0", "not-a-hash"))?;
  let output = fixture.check("bexar", &file, &[])?;

  assert_eq!(Some(3), output.status.code());
  assert!(stdout_of(&output).contains("not a commit hash"));
  Ok(())
}

#[test]
fn test_existing_tag_must_match_claimed_commit() -> Result<()> {
  let fixture = GateFixture::new()?;
  let remote = fixture.add_remote("example/widget")?;
  remote.tag("1.0.0")?;
  let later = remote.commit("second change")?;

  let file = fixture.write_deliverable("bexar", "widget", &valid_document("1.0.0", &later))?;
  let output = fixture.check("bexar", &file, &[])?;

  assert_eq!(Some(3), output.status.code());
  assert!(stdout_of(&output).contains("is tagged at"));
  Ok(())
}

#[test]
fn test_matching_tag_passes() -> Result<()> {
  let fixture = GateFixture::new()?;
  let remote = fixture.add_remote("example/widget")?;
  let hash = remote.head()?;
  remote.tag("1.0.0")?;

  let file = fixture.write_deliverable("bexar", "widget", &valid_document("1.0.0", &hash))?;
  let output = fixture.check("bexar", &file, &[])?;

  assert_eq!(Some(0), output.status.code(), "{}", stdout_of(&output));
  Ok(())
}

#[test]
fn test_decreasing_versions_fail() -> Result<()> {
  let fixture = GateFixture::new()?;
  let remote = fixture.add_remote("example/widget")?;
  let first = remote.head()?;
  let second = remote.commit("second change")?;

  let mut doc = valid_document("1.1.0", &first);
  doc.push_str(&format!(
    "  - version: 1.0.0\n    projects:\n      - repo: example/widget\n        hash: {}\n",
    second
  ));
  let file = fixture.write_deliverable("bexar", "widget", &doc)?;
  let output = fixture.check("bexar", &file, &[])?;

  assert_eq!(Some(3), output.status.code());
  assert!(stdout_of(&output).contains("must come after"));
  Ok(())
}

#[test]
fn test_release_must_descend_from_previous() -> Result<()> {
  let fixture = GateFixture::new()?;
  let remote = fixture.add_remote("example/widget")?;
  let first = remote.head()?;
  remote.tag("1.0.0")?;
  let unrelated = remote.orphan_commit("other", "disconnected line")?;

  let mut doc = valid_document("1.0.0", &first);
  doc.push_str(&format!(
    "  - version: 1.1.0\n    projects:\n      - repo: example/widget\n        hash: {}\n",
    unrelated
  ));
  let file = fixture.write_deliverable("bexar", "widget", &doc)?;
  let output = fixture.check("bexar", &file, &[])?;

  assert_eq!(Some(3), output.status.code());
  assert!(stdout_of(&output).contains("does not descend"));
  Ok(())
}

#[test]
fn test_branch_that_moved_is_reported() -> Result<()> {
  let fixture = GateFixture::new()?;
  let remote = fixture.add_remote("example/widget")?;
  let declared = remote.head()?;
  remote.tag("1.0.0")?;
  let moved = remote.commit("second change")?;
  remote.branch_at("stable/bexar", &moved)?;

  let mut doc = valid_document("1.0.0", &declared);
  doc.push_str("branches:\n  - name: stable/bexar\n    location: 1.0.0\n");
  let file = fixture.write_deliverable("bexar", "widget", &doc)?;
  let output = fixture.check("bexar", &file, &[])?;

  assert_eq!(Some(3), output.status.code());
  assert!(stdout_of(&output).contains("has moved"));
  Ok(())
}

#[test]
fn test_branch_at_declared_point_passes() -> Result<()> {
  let fixture = GateFixture::new()?;
  let remote = fixture.add_remote("example/widget")?;
  let declared = remote.head()?;
  remote.tag("1.0.0")?;
  remote.commit("second change")?;
  remote.branch_at("stable/bexar", &declared)?;

  let mut doc = valid_document("1.0.0", &declared);
  doc.push_str("branches:\n  - name: stable/bexar\n    location: 1.0.0\n");
  let file = fixture.write_deliverable("bexar", "widget", &doc)?;
  let output = fixture.check("bexar", &file, &[])?;

  assert_eq!(Some(0), output.status.code(), "{}", stdout_of(&output));
  Ok(())
}

#[test]
fn test_final_release_must_retag_last_candidate() -> Result<()> {
  let fixture = GateFixture::new()?;
  let remote = fixture.add_remote("example/widget")?;
  let rc1 = remote.head()?;
  remote.tag("1.5.0.0rc1")?;
  let rc2 = remote.commit("candidate fix")?;
  remote.tag("1.5.0.0rc2")?;
  let stray = remote.commit("late change")?;

  // The final should retag rc2 but points at a later commit.
  let mut doc = valid_document("1.5.0.0rc1", &rc1);
  doc.push_str(&format!(
    "  - version: 1.5.0.0rc2\n    projects:\n      - repo: example/widget\n        hash: {}\n  - version: 1.5.0\n    projects:\n      - repo: example/widget\n        hash: {}\n",
    rc2, stray
  ));
  let file = fixture.write_deliverable("bexar", "widget", &doc)?;
  let output = fixture.check("bexar", &file, &[])?;

  assert_eq!(Some(3), output.status.code());
  assert!(stdout_of(&output).contains("candidate"));
  Ok(())
}

#[test]
fn test_final_matching_candidate_passes() -> Result<()> {
  let fixture = GateFixture::new()?;
  let remote = fixture.add_remote("example/widget")?;
  let rc = remote.head()?;
  remote.tag("1.5.0.0rc1")?;

  let mut doc = valid_document("1.5.0.0rc1", &rc);
  doc.push_str(&format!(
    "  - version: 1.5.0\n    projects:\n      - repo: example/widget\n        hash: {}\n",
    rc
  ));
  let file = fixture.write_deliverable("bexar", "widget", &doc)?;
  let output = fixture.check("bexar", &file, &[])?;

  assert_eq!(Some(0), output.status.code(), "{}", stdout_of(&output));
  Ok(())
}

#[test]
fn test_unknown_key_is_a_warning() -> Result<()> {
  let fixture = GateFixture::new()?;
  let remote = fixture.add_remote("example/widget")?;
  let hash = remote.head()?;

  let mut doc = valid_document("1.0.0", &hash);
  doc.push_str("launchpad: widget\n");
  let file = fixture.write_deliverable("bexar", "widget", &doc)?;
  let output = fixture.check("bexar", &file, &[])?;

  assert_eq!(Some(0), output.status.code(), "{}", stdout_of(&output));
  assert!(stdout_of(&output).contains("unrecognized key"));
  Ok(())
}

#[test]
fn test_json_report() -> Result<()> {
  let fixture = GateFixture::new()?;
  let remote = fixture.add_remote("example/widget")?;
  let hash = remote.head()?;

  let file = fixture.write_deliverable("bexar", "widget", &valid_document("1.0.0", &hash))?;
  let output = fixture.check("bexar", &file, &["--json"])?;

  assert_eq!(Some(0), output.status.code(), "{}", stdout_of(&output));
  let report: serde_json::Value = serde_json::from_str(&stdout_of(&output))?;
  assert_eq!(1, report["files"]);
  assert_eq!(0, report["errors"]);
  assert!(report["diagnostics"].as_array().unwrap().is_empty());
  Ok(())
}

#[test]
fn test_json_report_carries_diagnostics() -> Result<()> {
  let fixture = GateFixture::new()?;
  fixture.add_remote("example/widget")?;

  let bogus = "c".repeat(40);
  let file = fixture.write_deliverable("bexar", "widget", &valid_document("1.0.0", &bogus))?;
  let output = fixture.check("bexar", &file, &["--json"])?;

  assert_eq!(Some(3), output.status.code());
  let report: serde_json::Value = serde_json::from_str(&stdout_of(&output))?;
  assert_eq!(1, report["errors"]);
  let diagnostics = report["diagnostics"].as_array().unwrap();
  assert_eq!("not-found", diagnostics[0]["kind"]);
  Ok(())
}

#[test]
fn test_missing_file_is_a_user_error() -> Result<()> {
  let fixture = GateFixture::new()?;
  fixture.write_deliverable("bexar", "widget", "---\n")?;

  let missing = fixture.deliverables.join("bexar/nonsense.yaml");
  let output = fixture.check("bexar", &missing, &[])?;

  assert_eq!(Some(1), output.status.code());
  Ok(())
}

#[test]
fn test_series_directory_is_discovered() -> Result<()> {
  let fixture = GateFixture::new()?;
  let remote = fixture.add_remote("example/widget")?;
  let hash = remote.head()?;

  fixture.write_deliverable("bexar", "widget", &valid_document("1.0.0", &hash))?;
  fixture.write_deliverable("bexar", "broken", &valid_document("1.0.0", "not-a-hash"))?;

  let remote_base = fixture.remotes.display().to_string();
  let root = fixture.deliverables.display().to_string();
  let output = run_relgate(&[
    "check",
    "--deliverables-root",
    &root,
    "--current-series",
    "bexar",
    "--remote-base",
    &remote_base,
  ])?;

  assert_eq!(Some(3), output.status.code());
  let rendered = stdout_of(&output);
  assert!(rendered.contains("2 file(s)"));
  assert!(rendered.contains("broken.yaml"));
  Ok(())
}

#[test]
fn test_independent_series_skips_cycle_rules() -> Result<()> {
  let fixture = GateFixture::new()?;
  let remote = fixture.add_remote("example/widget")?;
  let hash = remote.head()?;

  // 1.0.1 would fail the first-release rule in a cycle series.
  let mut doc = valid_document("1.0.1", &hash);
  doc = doc.replace("release-model: cycle-with-intermediary\n", "");
  let file = fixture.write_deliverable("independent", "widget", &doc)?;
  let output = fixture.check("bexar", &file, &[])?;

  assert_eq!(Some(0), output.status.code(), "{}", stdout_of(&output));
  Ok(())
}
