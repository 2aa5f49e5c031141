//! # sense-bridge
//!
//! Polling adapter that publishes a Sense home energy monitor's telemetry
//! into a home-automation hub as nodes with typed drivers.
//!
//! ## Architecture
//!
//! - `config`: YAML configuration and validation
//! - `logging`: structured logging and tracing
//! - `hub`: node, driver and notice model plus the in-memory registry
//! - `monitor`: client contract for the monitoring service
//! - `sense`: HTTP and realtime-feed client for the Sense cloud API
//! - `controller`: account controller, credentials and device discovery
//! - `device`: per-device nodes
//! - `runtime`: lifecycle event delivery and poll scheduling

pub mod config;
pub mod controller;
pub mod device;
pub mod error;
pub mod hub;
pub mod logging;
pub mod monitor;
pub mod runtime;
pub mod sense;

// Re-export commonly used types
pub use config::Config;
pub use controller::AccountController;
pub use error::{BridgeError, Result};
pub use runtime::App;
