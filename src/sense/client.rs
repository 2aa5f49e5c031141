use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::Local;
use reqwest::{StatusCode, Url};
use serde_json::Value;

use crate::config::SenseConfig;
use crate::error::{BridgeError, Result};
use crate::logging::{StructuredLogger, get_logger};
use crate::monitor::{AccountReadings, MonitorConnector, MonitorSession};

use super::realtime;
use super::types::{AuthResponse, TrendResponse, TrendScale, id_string};

const PROTOCOL_VERSION: &str = "3";

/// Builds authenticated [`SenseSession`]s
pub struct SenseConnector {
    config: SenseConfig,
    http: reqwest::Client,
}

impl SenseConnector {
    pub fn new(config: &SenseConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("sense-bridge/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            config: config.clone(),
            http,
        })
    }
}

#[async_trait::async_trait]
impl MonitorConnector for SenseConnector {
    async fn connect(&self, email: &str, password: &str) -> Result<Arc<dyn MonitorSession>> {
        let session = SenseSession::authenticate(&self.config, self.http.clone(), email, password).await?;
        Ok(Arc::new(session))
    }
}

/// Realtime feed address for a monitor, token percent-encoded
fn feed_url(base: &str, monitor_id: &str, token: &str) -> Result<Url> {
    Url::parse_with_params(
        &format!("{}/monitors/{}/realtimefeed", base, monitor_id),
        &[("access_token", token)],
    )
    .map_err(|e| BridgeError::config(format!("invalid realtime url {}: {}", base, e)))
}

#[derive(Default)]
struct Snapshot {
    readings: AccountReadings,
    active_devices: Vec<String>,
}

/// One authenticated session against the Sense API
pub struct SenseSession {
    http: reqwest::Client,
    api_url: String,
    realtime_url: String,
    timeout: Duration,
    access_token: String,
    monitor_id: String,
    snapshot: RwLock<Snapshot>,
    logger: StructuredLogger,
}

impl SenseSession {
    /// Log in and pick the account's first monitor
    pub async fn authenticate(
        config: &SenseConfig,
        http: reqwest::Client,
        email: &str,
        password: &str,
    ) -> Result<Self> {
        let logger = get_logger("sense");
        let api_url = config.api_url.trim_end_matches('/').to_string();

        let resp = http
            .post(format!("{}/authenticate", api_url))
            .form(&[("email", email), ("password", password)])
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(BridgeError::auth(format!(
                "authentication rejected: {}",
                status
            )));
        }
        let auth: AuthResponse = resp.json().await?;
        let monitor_id = auth
            .monitors
            .first()
            .and_then(|m| id_string(&m.id))
            .ok_or_else(|| BridgeError::auth("account has no monitor"))?;

        logger.info(&format!(
            "authenticated user {} monitor {}",
            auth.user_id
                .as_ref()
                .and_then(id_string)
                .unwrap_or_else(|| "?".to_string()),
            monitor_id
        ));

        Ok(Self {
            http,
            api_url,
            realtime_url: config.realtime_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(config.timeout_secs),
            access_token: auth.access_token,
            monitor_id,
            snapshot: RwLock::new(Snapshot::default()),
            logger,
        })
    }

    pub fn monitor_id(&self) -> &str {
        &self.monitor_id
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<reqwest::Response> {
        let resp = self
            .http
            .get(format!("{}/{}", self.api_url, path))
            .header("Authorization", format!("bearer {}", self.access_token))
            .header("x-sense-protocol", PROTOCOL_VERSION)
            .query(query)
            .send()
            .await?;
        Ok(resp)
    }

    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        let resp = self.get(path, query).await?;
        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(BridgeError::auth(format!("{} rejected the token", path)));
        }
        if !status.is_success() {
            return Err(BridgeError::api(format!("{} returned {}", path, status)));
        }
        Ok(resp.json().await?)
    }

    async fn trend(&self, scale: TrendScale) -> Result<TrendResponse> {
        // Trends are anchored at local noon of the current day
        let start = Local::now()
            .date_naive()
            .and_hms_opt(12, 0, 0)
            .map(|t| t.format("%Y-%m-%dT%H:%M:%S").to_string())
            .unwrap_or_default();
        let body = self
            .get_json(
                "app/history/trends",
                &[
                    ("monitor_id", self.monitor_id.clone()),
                    ("scale", scale.as_str().to_string()),
                    ("start", start),
                ],
            )
            .await?;
        Ok(serde_json::from_value(body)?)
    }

    fn snapshot_mut(&self) -> std::sync::RwLockWriteGuard<'_, Snapshot> {
        self.snapshot.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait::async_trait]
impl MonitorSession for SenseSession {
    async fn update_realtime(&self) -> Result<()> {
        let url = feed_url(&self.realtime_url, &self.monitor_id, &self.access_token)?;
        let sample = realtime::fetch_sample(url.as_str(), self.timeout).await?;
        let mut snap = self.snapshot_mut();
        snap.readings.active_power = sample.w;
        snap.readings.active_solar_power = sample.solar_w;
        snap.active_devices = sample.devices.into_iter().map(|d| d.name).collect();
        Ok(())
    }

    async fn update_trend_data(&self) -> Result<()> {
        let mut totals = Vec::with_capacity(TrendScale::ALL.len());
        for scale in TrendScale::ALL {
            let trend = self.trend(scale).await?;
            totals.push((scale, trend.consumption_total(), trend.production_total()));
        }
        let mut snap = self.snapshot_mut();
        for (scale, usage, production) in totals {
            let r = &mut snap.readings;
            match scale {
                TrendScale::Day => (r.daily_usage, r.daily_production) = (usage, production),
                TrendScale::Week => (r.weekly_usage, r.weekly_production) = (usage, production),
                TrendScale::Month => (r.monthly_usage, r.monthly_production) = (usage, production),
                TrendScale::Year => (r.yearly_usage, r.yearly_production) = (usage, production),
            }
        }
        Ok(())
    }

    fn readings(&self) -> AccountReadings {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .readings
            .clone()
    }

    fn active_devices(&self) -> Vec<String> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .active_devices
            .clone()
    }

    async fn discovered_devices(&self) -> Result<Vec<Value>> {
        let body = self
            .get_json(&format!("app/monitors/{}/devices", self.monitor_id), &[])
            .await?;
        match body {
            Value::Array(devices) => Ok(devices),
            other => Err(BridgeError::api(format!(
                "device list is not an array: {}",
                other
            ))),
        }
    }

    async fn device_info(&self, device_id: &str) -> Result<Option<Value>> {
        let path = format!("app/monitors/{}/devices/{}", self.monitor_id, device_id);
        let resp = self.get(&path, &[]).await?;
        if resp.status() == StatusCode::NOT_FOUND {
            self.logger
                .debug(&format!("no device info for {}", device_id));
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(BridgeError::api(format!("{} returned {}", path, resp.status())));
        }
        let body: Value = resp.json().await?;
        Ok((!body.is_null()).then_some(body))
    }
}
