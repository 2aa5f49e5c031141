use std::time::Duration;

use futures::StreamExt;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use crate::error::{BridgeError, Result};

use super::types::{RealtimeMessage, RealtimePayload};

/// Interpret one feed frame. `Ok(None)` for frames that carry no sample
/// (hello, monitor info, keepalives).
pub(crate) fn parse_frame(text: &str) -> Result<Option<RealtimePayload>> {
    let message: RealtimeMessage = serde_json::from_str(text)?;
    match message.kind.as_str() {
        "realtime_update" => Ok(Some(serde_json::from_value(message.payload)?)),
        "error" => {
            let reason = message
                .payload
                .get("error_reason")
                .and_then(|r| r.as_str())
                .unwrap_or("unknown error");
            Err(BridgeError::api(format!("realtime feed error: {}", reason)))
        }
        _ => Ok(None),
    }
}

/// Open the feed, wait for the first realtime update and close it again
pub(crate) async fn fetch_sample(url: &str, timeout: Duration) -> Result<RealtimePayload> {
    tokio::time::timeout(timeout, first_sample(url))
        .await
        .map_err(|_| BridgeError::timeout("no realtime update received in time"))?
}

async fn first_sample(url: &str) -> Result<RealtimePayload> {
    let (mut ws, _) = connect_async(url).await?;
    while let Some(frame) = ws.next().await {
        match frame? {
            Message::Text(text) => {
                if let Some(sample) = parse_frame(&text)? {
                    let _ = ws.close(None).await;
                    return Ok(sample);
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }
    Err(BridgeError::api("realtime feed closed before an update arrived"))
}
