use std::sync::Arc;

use serde_json::Value;
use tokio::task::JoinHandle;

use crate::device::DeviceNode;
use crate::error::{BridgeError, Result};
use crate::hub::{Node, NodeRegistry};
use crate::logging::get_logger;
use crate::monitor::{DeviceRecord, MonitorSession};

/// Background device enumeration. At most one runs at a time; the controller
/// checks [`DiscoveryTask::is_running`] instead of waiting for it.
pub struct DiscoveryTask {
    handle: JoinHandle<Result<usize>>,
}

impl DiscoveryTask {
    /// Start enumerating devices on the tokio runtime
    pub fn spawn(
        primary: String,
        session: Arc<dyn MonitorSession>,
        registry: Arc<dyn NodeRegistry>,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let result = discover_devices(&primary, session.as_ref(), registry.as_ref()).await;
            if let Err(e) = &result {
                get_logger("discovery").error(&format!("Discovery failed: {}", e));
            }
            result
        });
        Self { handle }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Abort the scan. Nodes already registered stay registered.
    pub fn cancel(self) {
        self.handle.abort();
    }

    /// Wait for completion; number of nodes added
    pub async fn join(self) -> Result<usize> {
        self.handle
            .await
            .map_err(|e| BridgeError::generic(format!("discovery task failed: {}", e)))?
    }
}

/// Enumerate the account's devices and register a node for each listed one.
/// Returns how many new nodes were added.
pub async fn discover_devices(
    primary: &str,
    session: &dyn MonitorSession,
    registry: &dyn NodeRegistry,
) -> Result<usize> {
    let logger = get_logger("discovery");
    let devices = session.discovered_devices().await?;
    logger.info(&format!("discovery found {} device records", devices.len()));

    let mut added = 0;
    for raw in devices.iter().filter(|d| !d.is_null()) {
        let record = match DeviceRecord::from_value(raw) {
            Ok(r) => r,
            Err(e) => {
                logger.error(&format!("discover device name: {} ({})", raw_name(raw), e));
                continue;
            }
        };
        if !record.is_listed() {
            logger.debug(&format!("skipping device '{}'", record.name));
            continue;
        }

        let node = DeviceNode::new(primary, &record.id, &record.name);
        let address = node.address().to_string();
        let is_new = registry.get_node(&address).is_none();
        let node = Arc::new(node);
        let registered = registry.add_node(node.clone()).and_then(|_| {
            if is_new {
                node.init_drivers(registry)
            } else {
                Ok(())
            }
        });
        match registered {
            Ok(()) if is_new => added += 1,
            Ok(()) => {}
            Err(e) => logger.error(&format!("discover device name: {} ({})", record.name, e)),
        }
    }

    logger.info(&format!("discovery complete, {} new nodes", added));
    Ok(added)
}

fn raw_name(raw: &Value) -> String {
    raw.get("name")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| "<unnamed>".to_string())
}
