//! Scenario report export
//!
//! Serializes scenario results to JSON for external consumption.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scenarios::ScenarioResult;

/// Combined export of a batch of scenario runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationExport {
    pub version: String,
    pub scenarios: Vec<ScenarioResult>,
    pub total_steps: u64,
    pub total_events: usize,
    pub all_passed: bool,
}

/// Build a complete simulation export.
pub fn build_export(results: &[ScenarioResult]) -> SimulationExport {
    SimulationExport {
        version: crate::VERSION.to_string(),
        scenarios: results.to_vec(),
        total_steps: results.iter().map(|r| r.steps_run).sum(),
        total_events: results.iter().map(|r| r.events_emitted).sum(),
        all_passed: results.iter().all(|r| r.passed),
    }
}

/// Export errors
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Export complete simulation data as JSON.
pub fn export_json(export: &SimulationExport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(export)
}

/// Write export to a file path.
pub fn write_to_file(export: &SimulationExport, path: &str) -> Result<(), ExportError> {
    let json = export_json(export)?;
    std::fs::write(path, json)?;
    Ok(())
}
