use crate::error::Result;
use crate::monitor::MonitorSession;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::drivers::{Driver, NodeDef, NoticeKey, ReportCommand};

/// A hub-visible node
#[async_trait::async_trait]
pub trait Node: Send + Sync {
    /// Unique hub address
    fn address(&self) -> &str;
    /// Address of the parent (primary) node
    fn primary(&self) -> &str;
    fn name(&self) -> &str;
    fn def(&self) -> &'static NodeDef;

    /// Whether the controller fans telemetry refreshes out to this node
    fn query_enabled(&self) -> bool {
        false
    }

    /// Re-derive driver values from the current session. Must not fail:
    /// per-node problems are logged by the node itself.
    async fn update(&self, _session: &dyn MonitorSession, _registry: &dyn NodeRegistry) {}
}

/// Node registration, driver storage and reporting, notices.
///
/// Implementations must be safe to use from the poll task and the discovery
/// task at the same time.
pub trait NodeRegistry: Send + Sync {
    /// Register a node. Re-registering an address replaces the node handle
    /// and keeps its stored driver values.
    fn add_node(&self, node: Arc<dyn Node>) -> Result<()>;

    fn get_node(&self, address: &str) -> Option<Arc<dyn Node>>;

    /// All nodes in registration order
    fn nodes(&self) -> Vec<Arc<dyn Node>>;

    /// Store a driver value, reporting it to the hub when it changed
    fn set_driver(&self, address: &str, driver: Driver, value: i64) -> Result<()>;

    /// Last stored value of a driver
    fn driver(&self, address: &str, driver: Driver) -> Option<i64>;

    /// Re-report every stored driver of a node
    fn report_drivers(&self, address: &str) -> Result<()>;

    fn report_cmd(&self, address: &str, command: ReportCommand, value: i64) -> Result<()>;

    fn clear_notices(&self);

    fn add_notice(&self, key: NoticeKey, message: &str);

    fn notices(&self) -> BTreeMap<String, String>;
}
