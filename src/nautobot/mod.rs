pub mod client;
pub mod sync;
pub mod types;

#[cfg(test)]
mod fake;

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{InterfaceRecord, InventoryRecord, VlanRecord};

pub use client::NautobotClient;
pub use types::{ApiError, MissingReference, PushOutcome, SyncCounts};

/// Operations the workflow needs from the source-of-truth system
#[async_trait]
pub trait SourceOfTruth: Send + Sync {
    /// Resolve a device name to its ID; any failure is reported as None
    async fn get_device_id(&self, name: &str) -> Option<Uuid>;

    /// Idempotent create-or-update of a device record keyed by name
    async fn push_device(&self, record: &InventoryRecord) -> Result<PushOutcome>;

    async fn push_interfaces(&self, device_id: Uuid, interfaces: &[InterfaceRecord]) -> SyncCounts;

    async fn push_vlans(&self, device_id: Uuid, vlans: &[VlanRecord]) -> SyncCounts;

    /// Overwrite the stored running config; false on any failure
    async fn update_device_config(&self, device_name: &str, running_config: &str) -> bool;
}

#[async_trait]
impl SourceOfTruth for NautobotClient {
    async fn get_device_id(&self, name: &str) -> Option<Uuid> {
        NautobotClient::get_device_id(self, name).await
    }

    async fn push_device(&self, record: &InventoryRecord) -> Result<PushOutcome> {
        NautobotClient::push_device(self, record).await
    }

    async fn push_interfaces(&self, device_id: Uuid, interfaces: &[InterfaceRecord]) -> SyncCounts {
        sync::push_interfaces(self, device_id, interfaces).await
    }

    async fn push_vlans(&self, device_id: Uuid, vlans: &[VlanRecord]) -> SyncCounts {
        sync::push_vlans(self, device_id, vlans).await
    }

    async fn update_device_config(&self, device_name: &str, running_config: &str) -> bool {
        NautobotClient::update_device_config(self, device_name, running_config).await
    }
}
