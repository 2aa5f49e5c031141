//! Scripted monitoring service for integration tests
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::{Value, json};
use tokio::sync::Notify;

use sense_bridge::error::{BridgeError, Result};
use sense_bridge::monitor::{AccountReadings, MonitorConnector, MonitorSession};

/// What a fake session serves. Shared between the connector and every
/// session it hands out so a test can change it mid-run.
#[derive(Default)]
pub struct Script {
    pub readings: AccountReadings,
    pub active: Vec<String>,
    pub devices: Vec<Value>,
    pub info: HashMap<String, Value>,
    pub fail_realtime: bool,
    pub fail_devices: bool,
}

pub struct FakeSession {
    script: Arc<Mutex<Script>>,
    /// When set, discovery parks until the gate is notified
    gate: Option<Arc<Notify>>,
    pub info_calls: AtomicUsize,
}

#[async_trait::async_trait]
impl MonitorSession for FakeSession {
    async fn update_realtime(&self) -> Result<()> {
        if self.script.lock().unwrap().fail_realtime {
            return Err(BridgeError::network("realtime feed unreachable"));
        }
        Ok(())
    }

    async fn update_trend_data(&self) -> Result<()> {
        Ok(())
    }

    fn readings(&self) -> AccountReadings {
        self.script.lock().unwrap().readings.clone()
    }

    fn active_devices(&self) -> Vec<String> {
        self.script.lock().unwrap().active.clone()
    }

    async fn discovered_devices(&self) -> Result<Vec<Value>> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        let script = self.script.lock().unwrap();
        if script.fail_devices {
            return Err(BridgeError::api("device list unavailable"));
        }
        Ok(script.devices.clone())
    }

    async fn device_info(&self, device_id: &str) -> Result<Option<Value>> {
        self.info_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.script.lock().unwrap().info.get(device_id).cloned())
    }
}

#[derive(Default)]
pub struct FakeConnector {
    pub script: Arc<Mutex<Script>>,
    pub gate: Option<Arc<Notify>>,
    pub reject: Mutex<bool>,
    pub logins: Mutex<Vec<(String, String)>>,
}

impl FakeConnector {
    pub fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script: Arc::new(Mutex::new(script)),
            ..Default::default()
        })
    }

    /// Discovery blocks until the returned gate is notified
    pub fn gated(script: Script) -> (Arc<Self>, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let connector = Arc::new(Self {
            script: Arc::new(Mutex::new(script)),
            gate: Some(gate.clone()),
            ..Default::default()
        });
        (connector, gate)
    }

    pub fn login_count(&self) -> usize {
        self.logins.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl MonitorConnector for FakeConnector {
    async fn connect(&self, email: &str, password: &str) -> Result<Arc<dyn MonitorSession>> {
        self.logins
            .lock()
            .unwrap()
            .push((email.to_string(), password.to_string()));
        if *self.reject.lock().unwrap() {
            return Err(BridgeError::auth("bad credentials"));
        }
        Ok(Arc::new(FakeSession {
            script: self.script.clone(),
            gate: self.gate.clone(),
            info_calls: AtomicUsize::new(0),
        }))
    }
}

pub fn device(id: &str, name: &str, listed: &str) -> Value {
    json!({"id": id, "name": name, "tags": {"DeviceListAllowed": listed}})
}

pub fn params(email: &str, password: &str) -> HashMap<String, String> {
    HashMap::from([
        ("email".to_string(), email.to_string()),
        ("password".to_string(), password.to_string()),
    ])
}
