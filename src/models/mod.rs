mod inventory;
mod parsed;

pub use inventory::{DeviceDescriptor, EnvironmentProfile, InventoryRecord};
pub use parsed::{InterfaceRecord, ParsedConfig, PortMode, VlanRecord};
