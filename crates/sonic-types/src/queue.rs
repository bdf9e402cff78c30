//! Egress queue types.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Type of egress queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueType {
    /// Queue carrying both unicast and multicast traffic.
    #[default]
    All,
    /// Unicast-only queue.
    Unicast,
    /// Multicast-only queue.
    Multicast,
}

impl QueueType {
    /// Returns true if the queue can carry unicast traffic.
    pub const fn is_unicast(&self) -> bool {
        matches!(self, QueueType::Unicast)
    }

    /// Returns true for multicast-only queues.
    pub const fn is_multicast(&self) -> bool {
        matches!(self, QueueType::Multicast)
    }
}

impl fmt::Display for QueueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QueueType::All => "all",
            QueueType::Unicast => "unicast",
            QueueType::Multicast => "multicast",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for QueueType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(QueueType::All),
            "unicast" | "uc" => Ok(QueueType::Unicast),
            "multicast" | "mc" => Ok(QueueType::Multicast),
            _ => Err(ParseError::InvalidQueueType(s.to_string())),
        }
    }
}
