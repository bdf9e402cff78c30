//! Policer settings and storm-control types.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Policer marking mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicerMode {
    /// Single rate three color marker.
    #[default]
    SrTcm,
    /// Two rate three color marker.
    TrTcm,
    /// Storm control (single rate, drop above CIR).
    StormControl,
}

impl fmt::Display for PolicerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PolicerMode::SrTcm => "sr_tcm",
            PolicerMode::TrTcm => "tr_tcm",
            PolicerMode::StormControl => "storm_control",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for PolicerMode {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sr_tcm" => Ok(PolicerMode::SrTcm),
            "tr_tcm" => Ok(PolicerMode::TrTcm),
            "storm_control" => Ok(PolicerMode::StormControl),
            _ => Err(ParseError::InvalidPolicerSetting(s.to_string())),
        }
    }
}

/// Whether incoming packet color is honoured by the meter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorSource {
    #[default]
    Blind,
    Aware,
}

impl fmt::Display for ColorSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorSource::Blind => write!(f, "blind"),
            ColorSource::Aware => write!(f, "aware"),
        }
    }
}

impl FromStr for ColorSource {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "blind" => Ok(ColorSource::Blind),
            "aware" => Ok(ColorSource::Aware),
            _ => Err(ParseError::InvalidPolicerSetting(s.to_string())),
        }
    }
}

/// Action applied to a packet of a given color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PacketAction {
    #[default]
    Forward,
    Drop,
    Copy,
    Trap,
}

impl fmt::Display for PacketAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PacketAction::Forward => "forward",
            PacketAction::Drop => "drop",
            PacketAction::Copy => "copy",
            PacketAction::Trap => "trap",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for PacketAction {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "forward" => Ok(PacketAction::Forward),
            "drop" => Ok(PacketAction::Drop),
            "copy" => Ok(PacketAction::Copy),
            "trap" => Ok(PacketAction::Trap),
            _ => Err(ParseError::InvalidPolicerSetting(s.to_string())),
        }
    }
}

/// Port policer slot.
///
/// A port carries one policer reference per storm type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StormType {
    /// Unknown-unicast flood storm control.
    Flood,
    Broadcast,
    Multicast,
    /// Policer applied to all packets on the port.
    PacketAll,
}

impl StormType {
    /// Number of port policer slots.
    pub const COUNT: usize = 4;

    /// Every slot in index order.
    pub const ALL: [StormType; 4] = [
        StormType::Flood,
        StormType::Broadcast,
        StormType::Multicast,
        StormType::PacketAll,
    ];

    /// Returns the port slot index.
    pub const fn slot(&self) -> usize {
        match self {
            StormType::Flood => 0,
            StormType::Broadcast => 1,
            StormType::Multicast => 2,
            StormType::PacketAll => 3,
        }
    }

    /// Returns the storm type name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            StormType::Flood => "unknown-unicast",
            StormType::Broadcast => "broadcast",
            StormType::Multicast => "unknown-multicast",
            StormType::PacketAll => "all",
        }
    }
}

impl fmt::Display for StormType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StormType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "unknown-unicast" | "flood" => Ok(StormType::Flood),
            "broadcast" => Ok(StormType::Broadcast),
            "unknown-multicast" | "multicast" => Ok(StormType::Multicast),
            "all" => Ok(StormType::PacketAll),
            _ => Err(ParseError::InvalidPolicerSetting(format!(
                "invalid storm type: {}",
                s
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_storm_slots() {
        for (i, t) in StormType::ALL.iter().enumerate() {
            assert_eq!(t.slot(), i);
            assert_eq!(t.as_str().parse::<StormType>().unwrap(), *t);
        }
    }

    #[test]
    fn test_policer_mode_parse() {
        assert_eq!("tr_tcm".parse::<PolicerMode>().unwrap(), PolicerMode::TrTcm);
        assert!("token".parse::<PolicerMode>().is_err());
    }

    #[test]
    fn test_packet_action_parse() {
        assert_eq!("DROP".parse::<PacketAction>().unwrap(), PacketAction::Drop);
        assert_eq!(ColorSource::default(), ColorSource::Blind);
    }
}
