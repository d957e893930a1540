//! Validation gate for release-metadata documents
//!
//! A deliverable document requests releases and branches for one component
//! of a coordinated release process. The gate parses those documents, runs
//! an ordered table of validation rules against them and the upstream git
//! repositories they reference, and reports every finding instead of
//! stopping at the first.
//!
//! The library exposes the engine for embedding; the `relgate` binary wires
//! it to a command line.

pub mod commands;
pub mod core;
pub mod deliverable;
pub mod rules;
pub mod version;
