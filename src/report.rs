//! Compliance report building.
//!
//! The desired state per device is a map of show commands to expected
//! output. A collaborator does the actual comparison against gathered
//! state; this module assembles the per-command results into the JSON
//! report, merging with any report from an earlier run.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use color_eyre::eyre::{eyre, Result, WrapErr};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of comparing one command's desired state with the actual
/// state on the device.
#[derive(Debug, Clone, PartialEq)]
pub enum CmdResult {
    /// The comparison ran; the value carries at least a `complies` bool.
    Compared(Value),
    /// The comparison could not run for this command.
    Skipped { reason: String },
}

/// Comparison collaborator. The generator itself never talks to
/// devices, so the comparison against gathered state is injected.
pub trait Compare {
    fn compare(&self, cmd: &str, desired: &Value, actual: &Value) -> CmdResult;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredReport {
    complies: bool,
    skipped: Vec<String>,
    #[serde(flatten)]
    commands: BTreeMap<String, Value>,
}

fn report_path(directory: &Path, hostname: &str) -> PathBuf {
    directory
        .join("reports")
        .join(format!("{hostname}_compliance_report.json"))
}

/// Runs the comparison for every desired command and merges the result
/// into `<directory>/reports/<hostname>_compliance_report.json`.
///
/// Returns whether the device complies. A report from an earlier run is
/// updated in place: its skipped list grows and a `complies: false` is
/// never flipped back to true by a later partial run.
pub fn merge_report(
    directory: &Path,
    hostname: &str,
    desired: &BTreeMap<String, Value>,
    actual: &BTreeMap<String, Value>,
    compare: &dyn Compare,
) -> Result<bool> {
    let mut commands: BTreeMap<String, Value> = BTreeMap::new();
    let mut skipped: Vec<String> = Vec::new();
    for (cmd, desired_state) in desired {
        let actual_state = actual.get(cmd).unwrap_or(&Value::Null);
        match compare.compare(cmd, desired_state, actual_state) {
            CmdResult::Compared(outcome) => {
                commands.insert(cmd.clone(), outcome);
            }
            CmdResult::Skipped { reason } => {
                warn!("{hostname}: validation of '{cmd}' skipped: {reason}");
                skipped.push(cmd.clone());
                commands.insert(
                    cmd.clone(),
                    serde_json::json!({"skipped": true, "reason": reason}),
                );
            }
        }
    }
    let complies = commands
        .values()
        .all(|outcome| outcome.get("complies").and_then(Value::as_bool).unwrap_or(true));

    let path = report_path(directory, hostname);
    let mut report = match fs::read_to_string(&path) {
        Ok(existing) => {
            let mut report: StoredReport = serde_json::from_str(&existing)
                .wrap_err_with(|| format!("Corrupt compliance report {}", path.display()))?;
            report.skipped.extend(skipped);
            if report.complies {
                report.complies = complies;
            }
            report
        }
        Err(_) => StoredReport {
            complies,
            skipped,
            commands: BTreeMap::new(),
        },
    };
    report.commands.extend(commands);

    let parent = path
        .parent()
        .ok_or_else(|| eyre!("Report path {} has no parent directory", path.display()))?;
    fs::create_dir_all(parent)
        .wrap_err_with(|| format!("Failed to create report directory {}", parent.display()))?;
    fs::write(&path, serde_json::to_string_pretty(&report)?)
        .wrap_err_with(|| format!("Failed to write compliance report {}", path.display()))?;
    info!(
        "{hostname}: compliance report written to {}, complies: {}",
        path.display(),
        report.complies
    );
    Ok(report.complies)
}
