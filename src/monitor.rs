//! Monitoring-service client contract
//!
//! The controller talks to the cloud account only through these traits, so
//! the concrete HTTP client in [`crate::sense`] can be replaced in tests.

use crate::error::{BridgeError, Result};
use serde_json::Value;
use std::sync::Arc;

/// Account-level aggregates from the latest realtime and trend refresh.
/// `None` means the service did not provide the value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountReadings {
    pub active_power: Option<f64>,
    pub active_solar_power: Option<f64>,
    pub daily_usage: Option<f64>,
    pub daily_production: Option<f64>,
    pub weekly_usage: Option<f64>,
    pub weekly_production: Option<f64>,
    pub monthly_usage: Option<f64>,
    pub monthly_production: Option<f64>,
    pub yearly_usage: Option<f64>,
    pub yearly_production: Option<f64>,
}

/// Creates authenticated sessions
#[async_trait::async_trait]
pub trait MonitorConnector: Send + Sync {
    async fn connect(&self, email: &str, password: &str) -> Result<Arc<dyn MonitorSession>>;
}

/// An authenticated session holding the most recent snapshot
#[async_trait::async_trait]
pub trait MonitorSession: Send + Sync {
    /// Pull a fresh realtime sample (power, active devices)
    async fn update_realtime(&self) -> Result<()>;

    /// Pull day/week/month/year aggregates
    async fn update_trend_data(&self) -> Result<()>;

    fn readings(&self) -> AccountReadings;

    /// Names of devices currently drawing power
    fn active_devices(&self) -> Vec<String>;

    /// Raw device records known to the account; entries may be `null`
    async fn discovered_devices(&self) -> Result<Vec<Value>>;

    /// Raw per-device details, `None` when the service has none
    async fn device_info(&self, device_id: &str) -> Result<Option<Value>>;
}

/// The fields of a raw device record discovery cares about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRecord {
    pub id: String,
    pub name: String,
    /// `DeviceListAllowed` tag is the literal string "true"
    pub list_allowed: bool,
}

impl DeviceRecord {
    /// Extract `id`, `name` and `tags.DeviceListAllowed` from a raw record
    pub fn from_value(value: &Value) -> Result<Self> {
        let id = value
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| BridgeError::api("device record has no id"))?;
        let name = value
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| BridgeError::api("device record has no name"))?;
        let list_allowed = value
            .get("tags")
            .and_then(|t| t.get("DeviceListAllowed"))
            .ok_or_else(|| BridgeError::api(format!("device '{}' has no DeviceListAllowed tag", name)))?;
        let list_allowed = list_allowed.as_str() == Some("true");
        Ok(Self {
            id: id.to_string(),
            name: name.to_string(),
            list_allowed,
        })
    }

    /// Devices hidden from the account's device list, and the two synthetic
    /// buckets, never become nodes.
    pub fn is_listed(&self) -> bool {
        self.list_allowed && self.name != "Always On" && self.name != "Unknown"
    }
}

/// Usage statistics from a device-info record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageField {
    AvgMonthlyRuns,
    AvgWatts,
    AvgMonthlyKwh,
    CurrentMonthRuns,
    CurrentMonthKwh,
}

impl UsageField {
    pub fn key(&self) -> &'static str {
        match self {
            Self::AvgMonthlyRuns => "avg_monthly_runs",
            Self::AvgWatts => "avg_watts",
            Self::AvgMonthlyKwh => "avg_monthly_KWH",
            Self::CurrentMonthRuns => "current_month_runs",
            Self::CurrentMonthKwh => "current_month_KWH",
        }
    }

    /// Read this field from a `usage` object. Numbers are truncated to an
    /// integer; strings must hold an integer.
    pub fn read(&self, usage: &Value) -> Result<i64> {
        let raw = usage
            .get(self.key())
            .ok_or_else(|| BridgeError::api(format!("usage has no {}", self.key())))?;
        let number = match raw {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<i64>().ok().map(|i| i as f64),
            _ => None,
        };
        match number {
            Some(f) if f.is_finite() => Ok(f.trunc() as i64),
            _ => Err(BridgeError::api(format!(
                "usage {} is not a number: {}",
                self.key(),
                raw
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_extraction() {
        let rec = DeviceRecord::from_value(&json!({
            "id": "DCM-AB12-34",
            "name": "Fridge",
            "tags": {"DeviceListAllowed": "true"}
        }))
        .unwrap();
        assert_eq!(rec.id, "DCM-AB12-34");
        assert!(rec.is_listed());

        assert!(DeviceRecord::from_value(&json!({"id": "x", "name": "y"})).is_err());
        assert!(DeviceRecord::from_value(&json!({"name": "y", "tags": {}})).is_err());
    }

    #[test]
    fn listing_predicate() {
        let mk = |name: &str, allowed: Value| {
            DeviceRecord::from_value(&json!({
                "id": "1", "name": name, "tags": {"DeviceListAllowed": allowed}
            }))
            .unwrap()
        };
        assert!(!mk("Always On", json!("true")).is_listed());
        assert!(!mk("Unknown", json!("true")).is_listed());
        assert!(!mk("Dryer", json!("false")).is_listed());
        // Only the literal string counts
        assert!(!mk("Dryer", json!(true)).is_listed());
        assert!(mk("Dryer", json!("true")).is_listed());
    }

    #[test]
    fn usage_fields_truncate() {
        let usage = json!({"avg_watts": 151.9, "avg_monthly_runs": "12", "current_month_KWH": null});
        assert_eq!(UsageField::AvgWatts.read(&usage).unwrap(), 151);
        assert_eq!(UsageField::AvgMonthlyRuns.read(&usage).unwrap(), 12);
        assert!(UsageField::AvgMonthlyKwh
            .read(&json!({"avg_monthly_KWH": "20.4"}))
            .is_err());
        assert!(UsageField::CurrentMonthKwh.read(&usage).is_err());
        assert!(UsageField::CurrentMonthRuns.read(&usage).is_err());
    }
}
