use chrono::{DateTime, Utc};
use std::fmt;

use crate::nautobot::SyncCounts;

/// Steps of the per-device pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Fetch,
    Inventory,
    Interfaces,
    Vlans,
    Backup,
    ConfigContext,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Step::Fetch => "fetch",
            Step::Inventory => "inventory",
            Step::Interfaces => "interfaces",
            Step::Vlans => "vlans",
            Step::Backup => "backup",
            Step::ConfigContext => "config-context",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Done,
    /// Completed, with something the operator should know about
    Noted(String),
    Failed(String),
    Skipped(String),
}

impl From<&SyncCounts> for StepOutcome {
    fn from(counts: &SyncCounts) -> Self {
        if counts.errors.is_empty() {
            StepOutcome::Done
        } else {
            StepOutcome::Failed(counts.errors.join("; "))
        }
    }
}

/// What happened to one device during a run
#[derive(Debug, Clone)]
pub struct DeviceReport {
    pub name: String,
    pub steps: Vec<(Step, StepOutcome)>,
}

impl DeviceReport {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            steps: Vec::new(),
        }
    }

    pub fn record(&mut self, step: Step, outcome: StepOutcome) {
        self.steps.push((step, outcome));
    }

    pub fn outcome(&self, step: Step) -> Option<&StepOutcome> {
        self.steps.iter().find(|(s, _)| *s == step).map(|(_, o)| o)
    }

    /// Configuration was fetched and nothing failed afterwards
    pub fn succeeded(&self) -> bool {
        matches!(self.outcome(Step::Fetch), Some(StepOutcome::Done))
            && !self
                .steps
                .iter()
                .any(|(_, o)| matches!(o, StepOutcome::Failed(_)))
    }

    pub fn notes(&self) -> Vec<String> {
        self.steps
            .iter()
            .filter_map(|(step, o)| match o {
                StepOutcome::Noted(note) => Some(format!("{}: {}", step, note)),
                _ => None,
            })
            .collect()
    }

    pub fn failures(&self) -> Vec<String> {
        self.steps
            .iter()
            .filter_map(|(step, o)| match o {
                StepOutcome::Failed(reason) => Some(format!("{}: {}", step, reason)),
                _ => None,
            })
            .collect()
    }
}

/// Summary of a whole run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub devices: Vec<DeviceReport>,
}

impl RunReport {
    pub fn succeeded(&self) -> usize {
        self.devices.iter().filter(|d| d.succeeded()).count()
    }

    pub fn failed(&self) -> usize {
        self.devices.len() - self.succeeded()
    }

    pub fn log_summary(&self) {
        for device in &self.devices {
            if device.succeeded() {
                let notes = device.notes();
                if notes.is_empty() {
                    tracing::info!("{}: success", device.name);
                } else {
                    tracing::warn!("{}: success ({})", device.name, notes.join(", "));
                }
            } else {
                let mut reasons = device.failures();
                if reasons.is_empty() {
                    reasons = device
                        .steps
                        .iter()
                        .filter_map(|(step, o)| match o {
                            StepOutcome::Skipped(reason) => Some(format!("{} skipped: {}", step, reason)),
                            _ => None,
                        })
                        .collect();
                }
                tracing::warn!("{}: failed ({})", device.name, reasons.join(", "));
            }
        }

        let elapsed = self.finished_at - self.started_at;
        tracing::info!(
            "Run finished in {}s: {} devices, {} succeeded, {} failed",
            elapsed.num_seconds(),
            self.devices.len(),
            self.succeeded(),
            self.failed()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_success_requires_fetch() {
        let mut report = DeviceReport::new("R1");
        report.record(Step::Fetch, StepOutcome::Failed("timeout".to_string()));
        report.record(Step::Inventory, StepOutcome::Done);
        assert!(!report.succeeded());
        assert_eq!(report.failures(), vec!["fetch: timeout"]);

        let mut report = DeviceReport::new("R2");
        report.record(Step::Fetch, StepOutcome::Done);
        report.record(Step::Interfaces, StepOutcome::Skipped("no device id".to_string()));
        report.record(Step::Backup, StepOutcome::Done);
        assert!(report.succeeded());
    }

    #[test]
    fn test_noted_step_still_succeeds() {
        let mut report = DeviceReport::new("R1");
        report.record(Step::Fetch, StepOutcome::Done);
        report.record(Step::Backup, StepOutcome::Noted("not pushed to remote".to_string()));
        assert!(report.succeeded());
        assert!(report.failures().is_empty());
        assert_eq!(report.notes(), vec!["backup: not pushed to remote"]);
    }

    #[test]
    fn test_sync_counts_outcome() {
        let mut counts = SyncCounts::default();
        assert_eq!(StepOutcome::from(&counts), StepOutcome::Done);
        counts.errors.push("Gi0/0: boom".to_string());
        counts.errors.push("Gi0/1: boom".to_string());
        assert_eq!(
            StepOutcome::from(&counts),
            StepOutcome::Failed("Gi0/0: boom; Gi0/1: boom".to_string())
        );
    }
}
