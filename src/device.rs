//! Device nodes
//!
//! One node per device discovered on the account. A device node never talks
//! to the service on its own initiative; the controller hands it the current
//! session during the fast-poll fan-out.

use crate::error::{BridgeError, Result};
use crate::hub::{DEVICE_DEF, Driver, Node, NodeDef, NodeRegistry};
use crate::logging::{LogContext, StructuredLogger, get_logger_with_context};
use crate::monitor::{MonitorSession, UsageField};
use serde_json::Value;

/// Token the service prefixes device ids with
const ID_PREFIX: &str = "dcm";

/// Driver value for a device that is currently drawing power
pub const STATUS_ON: i64 = 100;
pub const STATUS_OFF: i64 = 0;

/// Usage drivers, in the order they are written
const USAGE_DRIVERS: [(Driver, UsageField); 5] = [
    (Driver::Gv1, UsageField::AvgMonthlyRuns),
    (Driver::Gv5, UsageField::AvgWatts),
    (Driver::Gv2, UsageField::AvgMonthlyKwh),
    (Driver::Gv3, UsageField::CurrentMonthRuns),
    (Driver::Gv4, UsageField::CurrentMonthKwh),
];

/// Hub address for a raw device id: lowercased, first `dcm` removed, hyphens
/// removed.
pub fn stable_address(raw_id: &str) -> String {
    raw_id
        .to_lowercase()
        .replacen(ID_PREFIX, "", 1)
        .replace('-', "")
}

/// A discovered device
pub struct DeviceNode {
    address: String,
    primary: String,
    name: String,
    /// Raw id, key for device-info lookups
    original_id: String,
    /// Display name as reported by the service, key into the active set
    original_name: String,
    logger: StructuredLogger,
}

impl DeviceNode {
    pub fn new(primary: &str, raw_id: &str, name: &str) -> Self {
        let address = stable_address(raw_id);
        let logger = get_logger_with_context(
            LogContext::new("device")
                .with_address(&address)
                .with_field("name", name.to_string()),
        );
        Self {
            address,
            primary: primary.to_string(),
            name: name.to_string(),
            original_id: raw_id.to_string(),
            original_name: name.to_string(),
            logger,
        }
    }

    pub fn original_id(&self) -> &str {
        &self.original_id
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    /// Write the initial zeroes for the usage drivers
    pub fn init_drivers(&self, registry: &dyn NodeRegistry) -> Result<()> {
        for (driver, _) in USAGE_DRIVERS {
            registry.set_driver(&self.address, driver, 0)?;
        }
        Ok(())
    }

    async fn refresh(&self, session: &dyn MonitorSession, registry: &dyn NodeRegistry) -> Result<()> {
        let on = session
            .active_devices()
            .iter()
            .any(|name| name == &self.original_name);
        registry.set_driver(
            &self.address,
            Driver::St,
            if on { STATUS_ON } else { STATUS_OFF },
        )?;

        let Some(info) = session.device_info(&self.original_id).await? else {
            return Ok(());
        };
        let Some(usage) = info.get("usage").filter(|u| !u.is_null()) else {
            return Ok(());
        };
        write_usage(&self.address, usage, registry)
    }
}

// Each field is written as soon as it is read; a bad field stops the rest
fn write_usage(address: &str, usage: &Value, registry: &dyn NodeRegistry) -> Result<()> {
    if !usage.is_object() {
        return Err(BridgeError::api(format!("usage is not an object: {}", usage)));
    }
    for (driver, field) in USAGE_DRIVERS {
        registry.set_driver(address, driver, field.read(usage)?)?;
    }
    Ok(())
}

#[async_trait::async_trait]
impl Node for DeviceNode {
    fn address(&self) -> &str {
        &self.address
    }

    fn primary(&self) -> &str {
        &self.primary
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn def(&self) -> &'static NodeDef {
        &DEVICE_DEF
    }

    fn query_enabled(&self) -> bool {
        true
    }

    async fn update(&self, session: &dyn MonitorSession, registry: &dyn NodeRegistry) {
        if let Err(e) = self.refresh(session, registry).await {
            self.logger.error(&format!("update failed: {}", e));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_strips_prefix_and_hyphens() {
        assert_eq!(stable_address("DCM-AB12-34"), "ab1234");
        assert_eq!(stable_address("dcm-ab12-34"), "ab1234");
        assert_eq!(stable_address("a1b2c3"), "a1b2c3");
    }

    #[test]
    fn address_only_strips_first_prefix() {
        assert_eq!(stable_address("DCM-DCM-1"), "dcm1");
    }

    #[test]
    fn address_is_deterministic() {
        let raw = "DCM-Ff00-9a";
        assert_eq!(stable_address(raw), stable_address(raw));
    }

    #[test]
    fn node_keeps_original_keys() {
        let node = DeviceNode::new("controller", "DCM-AB12-34", "Fridge");
        assert_eq!(node.address(), "ab1234");
        assert_eq!(node.primary(), "controller");
        assert_eq!(node.original_id(), "DCM-AB12-34");
        assert_eq!(node.original_name(), "Fridge");
        assert!(node.query_enabled());
        assert_eq!(node.def().id, "SENSEDEVICE");
    }
}
