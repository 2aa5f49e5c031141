use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{BridgeError, Result};
use crate::logging::{StructuredLogger, get_logger};

use super::drivers::{Driver, NoticeKey, ReportCommand, Uom};
use super::registry::{Node, NodeRegistry};

const REPORT_HISTORY: usize = 1024;

/// Something the hub was told
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    Driver {
        address: String,
        driver: Driver,
        value: i64,
        uom: u8,
    },
    Command {
        address: String,
        command: ReportCommand,
        value: i64,
    },
}

struct DriverSlot {
    driver: Driver,
    uom: Uom,
    value: i64,
}

struct NodeSlot {
    node: Arc<dyn Node>,
    drivers: Vec<DriverSlot>,
}

#[derive(Default)]
struct HubState {
    nodes: Vec<NodeSlot>,
    notices: BTreeMap<String, String>,
    reports: VecDeque<Report>,
}

impl HubState {
    fn slot(&self, address: &str) -> Option<&NodeSlot> {
        self.nodes.iter().find(|s| s.node.address() == address)
    }

    fn slot_mut(&mut self, address: &str) -> Option<&mut NodeSlot> {
        self.nodes.iter_mut().find(|s| s.node.address() == address)
    }

    fn push_report(&mut self, report: Report) {
        if self.reports.len() == REPORT_HISTORY {
            self.reports.pop_front();
        }
        self.reports.push_back(report);
    }
}

/// In-memory node registry. Every report is written to the log and kept in a
/// bounded history.
pub struct LocalHub {
    state: RwLock<HubState>,
    logger: StructuredLogger,
}

impl Default for LocalHub {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalHub {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(HubState::default()),
            logger: get_logger("hub"),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HubState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HubState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reports since the last call, oldest first
    pub fn take_reports(&self) -> Vec<Report> {
        self.write().reports.drain(..).collect()
    }

    /// Commands reported by a node, oldest first, without consuming history
    pub fn reported_commands(&self, address: &str) -> Vec<ReportCommand> {
        self.read()
            .reports
            .iter()
            .filter_map(|r| match r {
                Report::Command {
                    address: a,
                    command,
                    ..
                } if a == address => Some(*command),
                _ => None,
            })
            .collect()
    }

    fn log_driver(&self, address: &str, driver: Driver, value: i64, uom: Uom) {
        self.logger.debug(&format!(
            "report {}:{} = {} (uom {})",
            address,
            driver,
            value,
            uom.code()
        ));
    }
}

impl NodeRegistry for LocalHub {
    fn add_node(&self, node: Arc<dyn Node>) -> Result<()> {
        let address = node.address().to_string();
        if address.is_empty() {
            return Err(BridgeError::hub("node address cannot be empty"));
        }
        let mut state = self.write();
        if let Some(slot) = state.slot_mut(&address) {
            self.logger
                .debug(&format!("node {} already registered, updating", address));
            slot.node = node;
            return Ok(());
        }
        self.logger.info(&format!(
            "adding node {} '{}' ({}) under {}",
            address,
            node.name(),
            node.def().id,
            node.primary()
        ));
        let drivers = node
            .def()
            .drivers
            .iter()
            .map(|(driver, uom, value)| DriverSlot {
                driver: *driver,
                uom: *uom,
                value: *value,
            })
            .collect();
        state.nodes.push(NodeSlot { node, drivers });
        Ok(())
    }

    fn get_node(&self, address: &str) -> Option<Arc<dyn Node>> {
        self.read().slot(address).map(|s| s.node.clone())
    }

    fn nodes(&self) -> Vec<Arc<dyn Node>> {
        self.read().nodes.iter().map(|s| s.node.clone()).collect()
    }

    fn set_driver(&self, address: &str, driver: Driver, value: i64) -> Result<()> {
        let mut state = self.write();
        let slot = state
            .slot_mut(address)
            .ok_or_else(|| BridgeError::hub(format!("unknown node {}", address)))?;
        let entry = slot
            .drivers
            .iter_mut()
            .find(|d| d.driver == driver)
            .ok_or_else(|| {
                BridgeError::hub(format!("node {} has no driver {}", address, driver))
            })?;
        if entry.value == value {
            return Ok(());
        }
        entry.value = value;
        let uom = entry.uom;
        state.push_report(Report::Driver {
            address: address.to_string(),
            driver,
            value,
            uom: uom.code(),
        });
        drop(state);
        self.log_driver(address, driver, value, uom);
        Ok(())
    }

    fn driver(&self, address: &str, driver: Driver) -> Option<i64> {
        self.read().slot(address).and_then(|s| {
            s.drivers
                .iter()
                .find(|d| d.driver == driver)
                .map(|d| d.value)
        })
    }

    fn report_drivers(&self, address: &str) -> Result<()> {
        let mut state = self.write();
        let current: Vec<(Driver, i64, Uom)> = state
            .slot(address)
            .ok_or_else(|| BridgeError::hub(format!("unknown node {}", address)))?
            .drivers
            .iter()
            .map(|d| (d.driver, d.value, d.uom))
            .collect();
        for (driver, value, uom) in &current {
            state.push_report(Report::Driver {
                address: address.to_string(),
                driver: *driver,
                value: *value,
                uom: uom.code(),
            });
        }
        drop(state);
        for (driver, value, uom) in current {
            self.log_driver(address, driver, value, uom);
        }
        Ok(())
    }

    fn report_cmd(&self, address: &str, command: ReportCommand, value: i64) -> Result<()> {
        let mut state = self.write();
        if state.slot(address).is_none() {
            return Err(BridgeError::hub(format!("unknown node {}", address)));
        }
        state.push_report(Report::Command {
            address: address.to_string(),
            command,
            value,
        });
        drop(state);
        self.logger.info(&format!(
            "command {} {} {}",
            address,
            command.as_str(),
            value
        ));
        Ok(())
    }

    fn clear_notices(&self) {
        self.write().notices.clear();
    }

    fn add_notice(&self, key: NoticeKey, message: &str) {
        self.logger
            .warn(&format!("notice [{}]: {}", key.as_str(), message));
        self.write()
            .notices
            .insert(key.as_str().to_string(), message.to_string());
    }

    fn notices(&self) -> BTreeMap<String, String> {
        self.read().notices.clone()
    }
}
