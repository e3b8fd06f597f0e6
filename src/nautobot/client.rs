use anyhow::Result;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

use super::types::*;
use crate::models::InventoryRecord;

/// Resolved IDs of the reference data a device points at
#[derive(Debug, Clone, Copy)]
pub(crate) struct DeviceRefs {
    pub device_type: Uuid,
    pub role: Uuid,
    pub location: Uuid,
    pub status: Uuid,
}

/// Nautobot API client
pub struct NautobotClient {
    base_url: String,
    token: String,
    client: Client,
}

impl NautobotClient {
    pub fn new(url: String, token: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            base_url: url.trim_end_matches('/').to_string(),
            token,
            client,
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    fn auth_header(&self) -> String {
        format!("Token {}", self.token)
    }

    /// Map a non-success response to an ApiError
    async fn check(resp: Response) -> Result<Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        Err(ApiError { status, body }.into())
    }

    /// Helper to perform a filtered GET list request
    async fn list<T: DeserializeOwned>(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<Vec<T>> {
        let resp = self
            .client
            .get(self.api_url(endpoint))
            .query(query)
            .header("Authorization", self.auth_header())
            .header("Accept", "application/json")
            .send()
            .await?;

        let paginated: PaginatedResponse<T> = Self::check(resp).await?.json().await?;
        Ok(paginated.results)
    }

    /// Helper to look up the first item matching a filter
    async fn find_one<T: DeserializeOwned>(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<Option<T>> {
        Ok(self.list(endpoint, query).await?.into_iter().next())
    }

    /// Helper to create a resource via POST
    async fn create_resource<T, B>(&self, endpoint: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize,
    {
        let resp = self
            .client
            .post(self.api_url(endpoint))
            .header("Authorization", self.auth_header())
            .header("Accept", "application/json")
            .json(body)
            .send()
            .await?;

        Ok(Self::check(resp).await?.json().await?)
    }

    /// Helper to partially update a resource via PATCH
    async fn patch_resource<T, B>(&self, endpoint: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize,
    {
        let resp = self
            .client
            .patch(self.api_url(endpoint))
            .header("Authorization", self.auth_header())
            .header("Accept", "application/json")
            .json(body)
            .send()
            .await?;

        Ok(Self::check(resp).await?.json().await?)
    }

    /// Test connectivity to Nautobot
    pub async fn test_connection(&self) -> bool {
        match self
            .client
            .get(self.api_url("/status/"))
            .header("Authorization", self.auth_header())
            .header("Accept", "application/json")
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    // --- Reference data ---

    pub async fn get_or_create_manufacturer(&self, name: &str) -> Result<NbManufacturer> {
        if let Some(m) = self.find_one("/dcim/manufacturers/", &[("name", name)]).await? {
            return Ok(m);
        }

        tracing::info!("Creating manufacturer {} in Nautobot", name);
        self.create_resource("/dcim/manufacturers/", &ManufacturerCreate {
            name: name.to_string(),
        }).await
    }

    pub async fn get_or_create_device_type(&self, manufacturer_id: Uuid, model: &str) -> Result<NbDeviceType> {
        let manufacturer = manufacturer_id.to_string();
        if let Some(dt) = self
            .find_one("/dcim/device-types/", &[("model", model), ("manufacturer", manufacturer.as_str())])
            .await?
        {
            return Ok(dt);
        }

        tracing::info!("Creating device type {} in Nautobot", model);
        self.create_resource("/dcim/device-types/", &DeviceTypeCreate {
            manufacturer: manufacturer_id,
            model: model.to_string(),
        }).await
    }

    pub async fn get_or_create_role(&self, name: &str) -> Result<NbNamed> {
        if let Some(role) = self.find_one("/extras/roles/", &[("name", name)]).await? {
            return Ok(role);
        }

        tracing::info!("Creating role {} in Nautobot", name);
        self.create_resource("/extras/roles/", &RoleCreate {
            name: name.to_string(),
            content_types: vec!["dcim.device".to_string()],
        }).await
    }

    /// Look up reference data that is never created implicitly
    async fn require_named(&self, endpoint: &str, kind: &str, name: &str) -> Result<Uuid> {
        match self.find_one::<NbNamed>(endpoint, &[("name", name)]).await? {
            Some(found) => Ok(found.id),
            None => Err(MissingReference::new(kind, name).into()),
        }
    }

    pub async fn location_id(&self, name: &str) -> Result<Uuid> {
        self.require_named("/dcim/locations/", "location", name).await
    }

    pub async fn status_id(&self, name: &str) -> Result<Uuid> {
        self.require_named("/extras/statuses/", "status", name).await
    }

    pub async fn namespace_id(&self, name: &str) -> Result<Uuid> {
        self.require_named("/ipam/namespaces/", "namespace", name).await
    }

    /// Make sure everything the record references exists, creating what may be created
    pub(crate) async fn ensure_reference_data(&self, record: &InventoryRecord) -> Result<DeviceRefs> {
        let manufacturer = self.get_or_create_manufacturer(&record.manufacturer).await?;
        let device_type = self
            .get_or_create_device_type(manufacturer.id, &record.device_type.model)
            .await?;
        let role = self.get_or_create_role(&record.role.name).await?;
        let location = self.location_id(&record.location.name).await?;
        let status = self.status_id(&record.status.name).await?;

        Ok(DeviceRefs {
            device_type: device_type.id,
            role: role.id,
            location,
            status,
        })
    }

    // --- Devices ---

    pub async fn find_device(&self, name: &str) -> Result<Option<NbDevice>> {
        self.find_one("/dcim/devices/", &[("name", name)]).await
    }

    /// Look up a device ID by name. Errors are logged and reported as not found.
    pub async fn get_device_id(&self, name: &str) -> Option<Uuid> {
        match self.find_device(name).await {
            Ok(Some(device)) => Some(device.id),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Device lookup for {} failed: {}", name, e);
                None
            }
        }
    }

    /// Create or update a device record keyed by name
    pub async fn push_device(&self, record: &InventoryRecord) -> Result<PushOutcome> {
        let refs = self.ensure_reference_data(record).await?;

        let body = DeviceWrite {
            name: record.name.clone(),
            device_type: refs.device_type,
            role: refs.role,
            location: refs.location,
            status: refs.status,
            serial: record.serial.clone(),
        };

        match self.find_device(&record.name).await? {
            Some(existing) => {
                let _: NbDevice = self
                    .patch_resource(&format!("/dcim/devices/{}/", existing.id), &body)
                    .await?;
                Ok(PushOutcome::Updated(existing.id))
            }
            None => {
                let created: NbDevice = self.create_resource("/dcim/devices/", &body).await?;
                Ok(PushOutcome::Created(created.id))
            }
        }
    }

    /// Overwrite the running config stored in the device's local config context.
    /// Returns true on HTTP 200; every failure is logged and reported as false.
    pub async fn update_device_config(&self, device_name: &str, running_config: &str) -> bool {
        let Some(device_id) = self.get_device_id(device_name).await else {
            tracing::warn!("Device '{}' not found in Nautobot.", device_name);
            return false;
        };

        let payload = serde_json::json!({
            "local_config_context_data": {
                "running_config": running_config
            }
        });

        let resp = match self
            .client
            .patch(self.api_url(&format!("/dcim/devices/{}/", device_id)))
            .header("Authorization", self.auth_header())
            .header("Accept", "application/json")
            .json(&payload)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!("Failed to update Config Context for {}: {}", device_name, e);
                return false;
            }
        };

        if resp.status() == reqwest::StatusCode::OK {
            tracing::info!("Successfully updated Config Context for device: {}", device_name);
            true
        } else {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!("Failed to update Config Context: {} - {}", status.as_u16(), body);
            false
        }
    }

    // --- Interfaces ---

    pub async fn list_interfaces_by_device(&self, device_id: Uuid) -> Result<Vec<NbInterface>> {
        let device = device_id.to_string();
        self.list("/dcim/interfaces/", &[("device_id", device.as_str()), ("limit", "1000")]).await
    }

    pub(crate) async fn create_interface(&self, body: &InterfaceWrite) -> Result<NbInterface> {
        self.create_resource("/dcim/interfaces/", body).await
    }

    pub(crate) async fn update_interface(&self, id: Uuid, body: &InterfaceWrite) -> Result<NbInterface> {
        self.patch_resource(&format!("/dcim/interfaces/{}/", id), body).await
    }

    pub(crate) async fn set_interface_vlans(&self, id: Uuid, body: &InterfaceVlanPatch) -> Result<NbInterface> {
        self.patch_resource(&format!("/dcim/interfaces/{}/", id), body).await
    }

    // --- IP addresses ---

    /// Get or create an IP address and attach it to an interface
    pub async fn assign_ip_address(
        &self,
        interface_id: Uuid,
        address: &str,
        status: Uuid,
        namespace: Uuid,
    ) -> Result<()> {
        let ip: NbIpAddress = match self
            .find_one("/ipam/ip-addresses/", &[("address", address)])
            .await?
        {
            Some(ip) => ip,
            None => {
                self.create_resource("/ipam/ip-addresses/", &IpAddressCreate {
                    address: address.to_string(),
                    status,
                    namespace,
                    ip_type: "host".to_string(),
                }).await?
            }
        };

        let ip_id = ip.id.to_string();
        let iface_id = interface_id.to_string();
        let existing: Option<NbIpToInterface> = self
            .find_one(
                "/ipam/ip-address-to-interface/",
                &[("ip_address", ip_id.as_str()), ("interface", iface_id.as_str())],
            )
            .await?;

        if existing.is_none() {
            let _: NbIpToInterface = self
                .create_resource("/ipam/ip-address-to-interface/", &IpToInterfaceCreate {
                    ip_address: ip.id,
                    interface: interface_id,
                })
                .await?;
        }
        Ok(())
    }

    // --- VLANs ---

    /// Location the device is assigned to
    pub async fn device_location(&self, device_id: Uuid) -> Result<Uuid> {
        let id = device_id.to_string();
        let device: Option<NbDevice> = self.find_one("/dcim/devices/", &[("id", id.as_str())]).await?;
        device
            .and_then(|d| d.location_id())
            .ok_or_else(|| MissingReference::new("device location", &id).into())
    }

    /// VLAN IDs are only unique per location
    pub async fn find_vlan(&self, vid: u16, location: Uuid) -> Result<Option<NbVlan>> {
        let vid = vid.to_string();
        let location = location.to_string();
        self.find_one("/ipam/vlans/", &[("vid", vid.as_str()), ("location", location.as_str())])
            .await
    }

    pub(crate) async fn create_vlan(&self, body: &VlanWrite) -> Result<NbVlan> {
        self.create_resource("/ipam/vlans/", body).await
    }

    pub(crate) async fn update_vlan(&self, id: Uuid, body: &VlanWrite) -> Result<NbVlan> {
        self.patch_resource(&format!("/ipam/vlans/{}/", id), body).await
    }
}
