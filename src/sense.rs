//! Sense Energy Monitor client
//!
//! REST calls go through reqwest; the instantaneous power sample comes from
//! the realtime websocket feed, read until the first update and closed.

pub mod client;
mod realtime;
pub mod types;

pub use client::{SenseConnector, SenseSession};
pub use types::TrendScale;
