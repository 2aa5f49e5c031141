use std::collections::HashMap;
use std::str::FromStr;

/// Poll cadence delivered by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollKind {
    /// Fast telemetry refresh
    Short,
    /// Reconnect and heartbeat
    Long,
}

/// Commands the hub can send to a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeCommand {
    /// Republish last-known driver values
    Query,
    /// Enumerate account devices (controller only)
    Discover,
}

impl FromStr for NodeCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "QUERY" => Ok(Self::Query),
            "DISCOVER" | "DISCOVERY" => Ok(Self::Discover),
            other => Err(format!("unknown command '{}'", other)),
        }
    }
}

/// Lifecycle events delivered by the host runtime, serially, on one task
#[derive(Debug, Clone, PartialEq)]
pub enum HubEvent {
    Start,
    CustomParams(HashMap<String, String>),
    Poll(PollKind),
    Command { address: String, command: NodeCommand },
    Stop,
}
