//! Series status table
//!
//! Release cycles ("series") are named and ordered; auxiliary branches may
//! only reference series the process knows about, and driver-fix branches
//! only closed ones. The table lives in a `series_status.yaml` document
//! beside the deliverables tree.

use crate::core::error::{GateResult, ResultExt};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesState {
  Open,
  Closed,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeriesInfo {
  pub name: String,
  pub status: SeriesState,
}

/// Known series, in chronological order (oldest first).
#[derive(Debug, Clone, Default)]
pub struct SeriesTable {
  series: Vec<SeriesInfo>,
}

impl SeriesTable {
  pub fn load(path: &Path) -> GateResult<SeriesTable> {
    let content =
      fs::read_to_string(path).with_context(|| format!("Failed to read series table from {}", path.display()))?;
    SeriesTable::parse(&content)
  }

  pub fn parse(content: &str) -> GateResult<SeriesTable> {
    let series: Vec<SeriesInfo> = serde_yaml::from_str(content)?;
    Ok(SeriesTable { series })
  }

  pub fn is_known(&self, name: &str) -> bool {
    self.series.iter().any(|s| s.name == name)
  }

  pub fn is_closed(&self, name: &str) -> bool {
    self.series.iter().any(|s| s.name == name && s.status == SeriesState::Closed)
  }
}
