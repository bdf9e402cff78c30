//! Scheduler algorithm and shaper settings.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Scheduling discipline of a scheduler profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulingType {
    /// Strict priority.
    Strict,
    /// Weighted round robin.
    Wrr,
    /// Deficit weighted round robin.
    #[default]
    Dwrr,
}

impl SchedulingType {
    /// Returns true if the discipline uses the weight attribute.
    pub const fn is_weighted(&self) -> bool {
        matches!(self, SchedulingType::Wrr | SchedulingType::Dwrr)
    }
}

impl fmt::Display for SchedulingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SchedulingType::Strict => "strict",
            SchedulingType::Wrr => "wrr",
            SchedulingType::Dwrr => "dwrr",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for SchedulingType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strict" | "sp" => Ok(SchedulingType::Strict),
            "wrr" => Ok(SchedulingType::Wrr),
            "dwrr" => Ok(SchedulingType::Dwrr),
            _ => Err(ParseError::InvalidSchedulingType(s.to_string())),
        }
    }
}

/// Unit used by shapers and meters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeterType {
    Packets,
    #[default]
    Bytes,
}

impl fmt::Display for MeterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeterType::Packets => write!(f, "packets"),
            MeterType::Bytes => write!(f, "bytes"),
        }
    }
}

impl FromStr for MeterType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "packets" => Ok(MeterType::Packets),
            "bytes" => Ok(MeterType::Bytes),
            _ => Err(ParseError::InvalidSchedulingType(s.to_string())),
        }
    }
}
