mod helpers;
mod test_check;
mod test_rules;
