//! Hub-side node model
//!
//! The home-automation hub sees this bridge as a set of nodes: one controller
//! node for the monitoring account plus one node per discovered device. Each
//! node exposes typed, unit-tagged integer attributes ("drivers") and accepts
//! a small set of commands. The codes in [`drivers`] are a fixed contract with
//! the hub's profile definition.

pub mod drivers;
pub mod events;
pub mod local;
pub mod registry;

pub use drivers::{CONTROLLER_DEF, DEVICE_DEF, Driver, NodeDef, NoticeKey, ReportCommand, Uom};
pub use events::{HubEvent, NodeCommand, PollKind};
pub use local::{LocalHub, Report};
pub use registry::{Node, NodeRegistry};
