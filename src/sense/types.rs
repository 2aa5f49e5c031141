use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub(crate) struct AuthResponse {
    pub access_token: String,
    #[serde(default)]
    pub user_id: Option<Value>,
    #[serde(default)]
    pub monitors: Vec<MonitorRef>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MonitorRef {
    pub id: Value,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TrendResponse {
    #[serde(default)]
    pub consumption: Option<TrendTotal>,
    #[serde(default)]
    pub production: Option<TrendTotal>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TrendTotal {
    #[serde(default)]
    pub total: Option<f64>,
}

impl TrendResponse {
    pub fn consumption_total(&self) -> Option<f64> {
        self.consumption.as_ref().and_then(|t| t.total)
    }

    pub fn production_total(&self) -> Option<f64> {
        self.production.as_ref().and_then(|t| t.total)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RealtimeMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub payload: Value,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub(crate) struct RealtimePayload {
    #[serde(default)]
    pub w: Option<f64>,
    #[serde(default)]
    pub solar_w: Option<f64>,
    #[serde(default)]
    pub devices: Vec<RealtimeDevice>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RealtimeDevice {
    #[serde(default)]
    pub name: String,
}

/// Trend aggregation window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendScale {
    Day,
    Week,
    Month,
    Year,
}

impl TrendScale {
    pub const ALL: [TrendScale; 4] = [Self::Day, Self::Week, Self::Month, Self::Year];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "DAY",
            Self::Week => "WEEK",
            Self::Month => "MONTH",
            Self::Year => "YEAR",
        }
    }
}

/// Ids arrive as numbers or strings depending on the endpoint
pub(crate) fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
