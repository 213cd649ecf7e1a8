// JSON report of a run's alert events (`run --output alerts.json`).
//
// The same file can be fed back to `trendwatch notify` to re-send the
// alerts, e.g. after fixing mail credentials.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::store::save_json_atomic;
use crate::trends::AlertEvent;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertReport {
    pub generated_at: DateTime<Utc>,
    pub alerts: Vec<AlertEvent>,
}

pub fn write_report(path: &Path, alerts: &[AlertEvent], generated_at: DateTime<Utc>) -> Result<()> {
    let report = AlertReport {
        generated_at,
        alerts: alerts.to_vec(),
    };
    save_json_atomic(path, &report)
        .with_context(|| format!("Failed to write alert report to {}", path.display()))
}

pub fn read_report(path: &Path) -> Result<AlertReport> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read alert report {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("{} is not an alert report", path.display()))
}
