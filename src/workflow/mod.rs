mod report;

pub use report::{DeviceReport, RunReport, Step, StepOutcome};

use chrono::Utc;
use std::sync::Arc;

use crate::backup::BackupWriter;
use crate::fetch::ConfigSource;
use crate::models::{DeviceDescriptor, EnvironmentProfile};
use crate::nautobot::{PushOutcome, SourceOfTruth};

/// Workflow runs the fetch / sync / backup pipeline over a device list,
/// one device at a time. Failures are contained per device.
pub struct Workflow {
    source: Option<Box<dyn ConfigSource>>,
    sot: Arc<dyn SourceOfTruth>,
    backup: BackupWriter,
    profile: EnvironmentProfile,
}

impl Workflow {
    /// `source` is None when the configured fetch method was not recognized
    pub fn new(
        source: Option<Box<dyn ConfigSource>>,
        sot: Arc<dyn SourceOfTruth>,
        backup: BackupWriter,
        profile: EnvironmentProfile,
    ) -> Self {
        Self {
            source,
            sot,
            backup,
            profile,
        }
    }

    pub async fn run(&self, devices: &[DeviceDescriptor]) -> RunReport {
        let started_at = Utc::now();
        let mut reports = Vec::with_capacity(devices.len());

        for device in devices {
            reports.push(self.process_device(device).await);
        }

        RunReport {
            started_at,
            finished_at: Utc::now(),
            devices: reports,
        }
    }

    async fn process_device(&self, device: &DeviceDescriptor) -> DeviceReport {
        let mut report = DeviceReport::new(&device.name);
        tracing::info!("Processing device: {}", device.name);

        let Some(source) = &self.source else {
            tracing::warn!("Invalid method for device {}. Skipping...", device.name);
            report.record(Step::Fetch, StepOutcome::Skipped("invalid fetch method".to_string()));
            return report;
        };

        let gathered = match source.fetch(device).await {
            Ok(text) if text.trim().is_empty() => {
                tracing::warn!(
                    "Device {} returned an empty configuration via {}",
                    device.name,
                    source.method()
                );
                report.record(
                    Step::Fetch,
                    StepOutcome::Failed("empty configuration returned".to_string()),
                );
                None
            }
            Ok(text) => {
                tracing::info!(
                    "Fetched configuration from {} via {} ({} bytes)",
                    device.name,
                    source.method(),
                    text.len()
                );
                report.record(Step::Fetch, StepOutcome::Done);
                Some(text)
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to fetch configuration from {} ({}): {:#}",
                    device.name,
                    device.host,
                    e
                );
                report.record(Step::Fetch, StepOutcome::Failed(e.to_string()));
                None
            }
        };

        let parsed = gathered.as_deref().and_then(|raw| source.parse(raw));
        let record = self.profile.record_for(&device.name);

        let mut device_id = match self.sot.push_device(&record).await {
            Ok(outcome) => {
                match outcome {
                    PushOutcome::Created(_) => tracing::info!("Created {} in Nautobot", device.name),
                    PushOutcome::Updated(_) => tracing::info!("Updated {} in Nautobot", device.name),
                }
                report.record(Step::Inventory, StepOutcome::Done);
                Some(outcome.id())
            }
            Err(e) => {
                tracing::warn!("Failed to push {} to Nautobot: {:#}", device.name, e);
                report.record(Step::Inventory, StepOutcome::Failed(e.to_string()));
                None
            }
        };

        if let Some(parsed) = parsed.filter(|p| !p.is_empty()) {
            if device_id.is_none() {
                device_id = self.sot.get_device_id(&device.name).await;
            }

            match device_id {
                None => {
                    tracing::warn!(
                        "Device '{}' not found in Nautobot, skipping interface and VLAN push",
                        device.name
                    );
                    let reason = "device not found in Nautobot".to_string();
                    report.record(Step::Interfaces, StepOutcome::Skipped(reason.clone()));
                    report.record(Step::Vlans, StepOutcome::Skipped(reason));
                }
                Some(id) => {
                    if !parsed.interfaces.is_empty() {
                        let counts = self.sot.push_interfaces(id, &parsed.interfaces).await;
                        tracing::info!("Interfaces for {}: {}", device.name, counts.summary());
                        report.record(Step::Interfaces, StepOutcome::from(&counts));
                    }
                    if !parsed.vlans.is_empty() {
                        let counts = self.sot.push_vlans(id, &parsed.vlans).await;
                        tracing::info!("VLANs for {}: {}", device.name, counts.summary());
                        report.record(Step::Vlans, StepOutcome::from(&counts));
                    }
                }
            }
        }

        let Some(config) = gathered else {
            let reason = "no configuration gathered".to_string();
            report.record(Step::Backup, StepOutcome::Skipped(reason.clone()));
            report.record(Step::ConfigContext, StepOutcome::Skipped(reason));
            return report;
        };

        match self
            .backup
            .save(&device.name, &record.manufacturer, &record.device_type.model, &config)
            .await
        {
            Ok(outcome) => {
                let result = if !outcome.committed {
                    StepOutcome::Noted("written but not committed".to_string())
                } else if !outcome.pushed {
                    StepOutcome::Noted("committed but not pushed to remote".to_string())
                } else {
                    StepOutcome::Done
                };
                report.record(Step::Backup, result);
            }
            Err(e) => {
                tracing::warn!("Failed to back up {}: {:#}", device.name, e);
                report.record(Step::Backup, StepOutcome::Failed(e.to_string()));
            }
        }

        if self.sot.update_device_config(&device.name, &config).await {
            report.record(Step::ConfigContext, StepOutcome::Done);
        } else {
            tracing::warn!("Failed to update configuration for device {}.", device.name);
            report.record(
                Step::ConfigContext,
                StepOutcome::Failed("config context update failed".to_string()),
            );
        }

        report
    }
}
