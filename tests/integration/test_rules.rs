//! Rule listing command.

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_rules_listing() -> Result<()> {
  let output = run_relgate(&["rules"])?;
  assert_eq!(Some(0), output.status.code());

  let rendered = stdout_of(&output);
  for name in ["sha-existence", "versions-ascending", "stable-branches", "series-first"] {
    assert!(rendered.contains(name), "missing rule {}", name);
  }
  Ok(())
}

#[test]
fn test_rules_listing_json() -> Result<()> {
  let output = run_relgate(&["rules", "--json"])?;
  assert_eq!(Some(0), output.status.code());

  let listing: serde_json::Value = serde_json::from_str(&stdout_of(&output))?;
  let rules = listing.as_array().unwrap();
  assert!(rules.len() >= 15);
  assert_eq!("team", rules[0]["name"]);
  assert!(rules.iter().any(|r| r["guards"]
    .as_array()
    .is_some_and(|g| g.iter().any(|v| v == "released"))));
  Ok(())
}
