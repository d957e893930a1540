pub mod check;
pub mod rules;

pub use check::{run_check, CheckArgs};
pub use rules::run_rules_listing;
