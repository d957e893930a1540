//! List the registered validation rules.

use crate::core::error::GateResult;
use crate::rules::RULES;
use serde::Serialize;

#[derive(Serialize)]
struct RuleListing<'a> {
  name: &'a str,
  description: &'a str,
  guards: &'a [crate::rules::Guard],
}

/// Print the rule table in registration order.
pub fn run_rules_listing(json: bool) -> GateResult<()> {
  if json {
    let listing: Vec<RuleListing> = RULES
      .iter()
      .map(|rule| RuleListing {
        name: rule.name,
        description: rule.description,
        guards: rule.guards,
      })
      .collect();
    println!("{}", serde_json::to_string_pretty(&listing)?);
    return Ok(());
  }

  println!("📋 Registered rules:");
  for rule in RULES {
    let guards: Vec<String> = rule.guards.iter().map(|g| format!("{:?}", g).to_lowercase()).collect();
    if guards.is_empty() {
      println!("   • {}: {}", rule.name, rule.description);
    } else {
      println!("   • {}: {} (applies to: {})", rule.name, rule.description, guards.join(", "));
    }
  }
  Ok(())
}
