pub mod context;
pub mod error;
pub mod repo_cache;
pub mod series;
pub mod team;
pub mod vcs;
