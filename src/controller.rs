//! Account controller
//!
//! Owns the authenticated session and the account-level node. Two poll
//! cadences drive it: the long poll re-authenticates and pulses the
//! heartbeat, the short poll pulls fresh telemetry and fans it out to every
//! device node. Both are skipped while a discovery scan is running.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{BridgeError, Result};
use crate::hub::{
    CONTROLLER_DEF, Driver, Node, NodeCommand, NodeDef, NodeRegistry, ReportCommand,
};
use crate::logging::{StructuredLogger, get_logger};
use crate::monitor::{AccountReadings, MonitorConnector, MonitorSession};

pub mod credentials;
pub mod discovery;

pub use credentials::{Credentials, Rejection};
pub use discovery::{DiscoveryTask, discover_devices};

/// Hub address of the controller node
pub const CONTROLLER_ADDRESS: &str = "controller";
const CONTROLLER_NAME: &str = "Sense";

/// Value sent with heartbeat commands
const HEARTBEAT_VALUE: i64 = 2;

/// The controller as the hub sees it
struct ControllerNode;

impl Node for ControllerNode {
    fn address(&self) -> &str {
        CONTROLLER_ADDRESS
    }

    fn primary(&self) -> &str {
        CONTROLLER_ADDRESS
    }

    fn name(&self) -> &str {
        CONTROLLER_NAME
    }

    fn def(&self) -> &'static NodeDef {
        &CONTROLLER_DEF
    }
}

/// Controller drivers fed from the account readings, in publish order
fn aggregate_drivers(r: &AccountReadings) -> [(Driver, Option<f64>); 10] {
    [
        (Driver::Cpw, r.active_power),
        (Driver::Gv6, r.active_solar_power),
        (Driver::Gv7, r.daily_usage),
        (Driver::Gv8, r.daily_production),
        (Driver::Gv9, r.weekly_usage),
        (Driver::Gv10, r.weekly_production),
        (Driver::Gv11, r.monthly_usage),
        (Driver::Gv12, r.monthly_production),
        (Driver::Gv13, r.yearly_usage),
        (Driver::Gv14, r.yearly_production),
    ]
}

/// Missing readings publish as 0
fn driver_value(reading: Option<f64>) -> i64 {
    match reading {
        Some(v) if v.is_finite() => v.trunc() as i64,
        _ => 0,
    }
}

pub struct AccountController {
    registry: Arc<dyn NodeRegistry>,
    connector: Arc<dyn MonitorConnector>,
    credentials: Credentials,
    session: Option<Arc<dyn MonitorSession>>,
    discovery: Option<DiscoveryTask>,
    /// 0 or 1; the next pulse is DON when 0
    heartbeat: u8,
    logger: StructuredLogger,
}

impl AccountController {
    /// Create the controller and register its node
    pub fn new(
        registry: Arc<dyn NodeRegistry>,
        connector: Arc<dyn MonitorConnector>,
    ) -> Result<Self> {
        registry.add_node(Arc::new(ControllerNode))?;
        Ok(Self {
            registry,
            connector,
            credentials: Credentials::default(),
            session: None,
            discovery: None,
            heartbeat: 0,
            logger: get_logger("controller"),
        })
    }

    pub fn address(&self) -> &str {
        CONTROLLER_ADDRESS
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn session(&self) -> Option<&Arc<dyn MonitorSession>> {
        self.session.as_ref()
    }

    pub fn heartbeat_state(&self) -> u8 {
        self.heartbeat
    }

    /// Handle a custom-parameters delivery. Returns whether the credentials
    /// were accepted and the session started.
    pub async fn apply_credentials(&mut self, params: &HashMap<String, String>) -> bool {
        self.registry.clear_notices();

        if let Err(rejection) = self.credentials.accept(params) {
            self.logger.error(rejection.message);
            self.registry.add_notice(rejection.key, rejection.message);
            return false;
        }

        match self.start_session().await {
            Ok(()) => true,
            Err(e) => {
                self.logger
                    .error(&format!("Error starting Sense node server: {}", e));
                false
            }
        }
    }

    async fn start_session(&mut self) -> Result<()> {
        self.heartbeat()?;
        self.connect().await?;
        self.start_discovery();
        Ok(())
    }

    /// True while a discovery scan is running. Clears the handle of a scan
    /// that has finished.
    pub fn discovery_in_flight(&mut self) -> bool {
        match &self.discovery {
            Some(task) if task.is_running() => true,
            Some(_) => {
                self.discovery = None;
                false
            }
            None => false,
        }
    }

    /// Long poll: fresh session and a heartbeat pulse
    pub async fn refresh_slow(&mut self) {
        if self.discovery_in_flight() {
            self.logger
                .debug("Skipping long poll while discovery in progress...");
            return;
        }
        if let Err(e) = self.connect().await {
            self.logger
                .error(&format!("Unable to connect to Sense API: {}", e));
        }
        if let Err(e) = self.heartbeat() {
            self.logger.error(&format!("heartbeat failed: {}", e));
        }
    }

    /// Short poll: pull telemetry, publish aggregates, update devices
    pub async fn refresh_fast(&mut self) {
        if self.discovery_in_flight() {
            self.logger
                .debug("Skipping short poll while discovery in progress...");
            return;
        }
        let session = match self.fetch().await {
            Ok(session) => session,
            Err(e) => {
                self.logger.error(&format!(
                    "unable to retrieve Sense Monitor usage: {}",
                    e
                ));
                return;
            }
        };

        self.publish_readings(&session.readings());

        for node in self.registry.nodes() {
            if node.query_enabled() {
                node.update(session.as_ref(), self.registry.as_ref()).await;
            }
        }
    }

    async fn fetch(&self) -> Result<Arc<dyn MonitorSession>> {
        let session = self
            .session
            .clone()
            .ok_or_else(|| BridgeError::auth("not connected to the Sense API"))?;
        session.update_realtime().await?;
        session.update_trend_data().await?;
        Ok(session)
    }

    fn publish_readings(&self, readings: &AccountReadings) {
        let mut updates = vec![(Driver::St, 1)];
        updates.extend(
            aggregate_drivers(readings)
                .into_iter()
                .map(|(driver, reading)| (driver, driver_value(reading))),
        );
        for (driver, value) in updates {
            if let Err(e) = self.registry.set_driver(CONTROLLER_ADDRESS, driver, value) {
                self.logger
                    .error(&format!("failed to set {}: {}", driver, e));
            }
        }
    }

    /// Toggle the heartbeat and report the matching pulse
    pub fn heartbeat(&mut self) -> Result<()> {
        self.logger.info(&format!("heartbeat hb={}", self.heartbeat));
        let command = if self.heartbeat == 0 {
            self.heartbeat = 1;
            ReportCommand::On
        } else {
            self.heartbeat = 0;
            ReportCommand::Off
        };
        self.registry
            .report_cmd(CONTROLLER_ADDRESS, command, HEARTBEAT_VALUE)
    }

    /// Replace the session with a freshly authenticated one. On failure the
    /// old session is dropped.
    async fn connect(&mut self) -> Result<()> {
        self.session = None;
        let (email, password) = self
            .credentials
            .usable()
            .ok_or_else(|| BridgeError::config("email and password are not configured"))?;
        let session = self.connector.connect(email, password).await?;
        self.session = Some(session);
        Ok(())
    }

    /// Start a discovery scan unless one is already running
    pub fn start_discovery(&mut self) {
        if self.discovery_in_flight() {
            self.logger.info("Discovery is still in progress");
            return;
        }
        let Some(session) = self.session.clone() else {
            self.logger
                .error("Discovery skipped: not connected to the Sense API");
            return;
        };
        self.logger.info("Starting discovery");
        self.discovery = Some(DiscoveryTask::spawn(
            CONTROLLER_ADDRESS.to_string(),
            session,
            self.registry.clone(),
        ));
    }

    /// Take the running discovery task, if any, so a caller can wait on it
    pub fn take_discovery(&mut self) -> Option<DiscoveryTask> {
        self.discovery.take()
    }

    /// Republish every node's last-known drivers
    pub fn query_all(&self) {
        for node in self.registry.nodes() {
            if let Err(e) = self.registry.report_drivers(node.address()) {
                self.logger
                    .error(&format!("query {} failed: {}", node.address(), e));
            }
        }
    }

    /// Dispatch a hub command addressed to the controller or a device
    pub fn handle_command(&mut self, address: &str, command: NodeCommand) {
        match (address == CONTROLLER_ADDRESS, command) {
            (true, NodeCommand::Query) => self.query_all(),
            (true, NodeCommand::Discover) => self.start_discovery(),
            (false, NodeCommand::Query) => {
                if let Err(e) = self.registry.report_drivers(address) {
                    self.logger.warn(&format!("query {} failed: {}", address, e));
                }
            }
            (false, NodeCommand::Discover) => {
                self.logger
                    .warn(&format!("node {} does not support discovery", address));
            }
        }
    }
}
