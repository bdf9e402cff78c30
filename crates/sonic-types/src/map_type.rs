//! QoS classification map types.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Type of a QoS map.
///
/// Every port holds one map slot per type, indexed by [`QosMapType::slot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QosMapType {
    Dot1pToTc,
    Dot1pToColor,
    DscpToTc,
    DscpToColor,
    TcToQueue,
    TcAndColorToDscp,
    TcAndColorToDot1p,
    TcToPriorityGroup,
    PfcPriorityToPriorityGroup,
    PfcPriorityToQueue,
    DscpToForwardingClass,
    MplsExpToTc,
    MplsExpToColor,
    TcAndColorToMplsExp,
}

impl QosMapType {
    /// Number of per-port map slots.
    pub const COUNT: usize = 14;

    /// Every map type in slot order.
    pub const ALL: [QosMapType; 14] = [
        QosMapType::Dot1pToTc,
        QosMapType::Dot1pToColor,
        QosMapType::DscpToTc,
        QosMapType::DscpToColor,
        QosMapType::TcToQueue,
        QosMapType::TcAndColorToDscp,
        QosMapType::TcAndColorToDot1p,
        QosMapType::TcToPriorityGroup,
        QosMapType::PfcPriorityToPriorityGroup,
        QosMapType::PfcPriorityToQueue,
        QosMapType::DscpToForwardingClass,
        QosMapType::MplsExpToTc,
        QosMapType::MplsExpToColor,
        QosMapType::TcAndColorToMplsExp,
    ];

    /// Returns the port slot index for this map type.
    pub const fn slot(&self) -> usize {
        match self {
            QosMapType::Dot1pToTc => 0,
            QosMapType::Dot1pToColor => 1,
            QosMapType::DscpToTc => 2,
            QosMapType::DscpToColor => 3,
            QosMapType::TcToQueue => 4,
            QosMapType::TcAndColorToDscp => 5,
            QosMapType::TcAndColorToDot1p => 6,
            QosMapType::TcToPriorityGroup => 7,
            QosMapType::PfcPriorityToPriorityGroup => 8,
            QosMapType::PfcPriorityToQueue => 9,
            QosMapType::DscpToForwardingClass => 10,
            QosMapType::MplsExpToTc => 11,
            QosMapType::MplsExpToColor => 12,
            QosMapType::TcAndColorToMplsExp => 13,
        }
    }

    /// Returns true for the 802.1p ingress classification maps.
    pub const fn is_dot1p_family(&self) -> bool {
        matches!(self, QosMapType::Dot1pToTc | QosMapType::Dot1pToColor)
    }

    /// Returns true for the DSCP ingress classification maps.
    pub const fn is_dscp_family(&self) -> bool {
        matches!(self, QosMapType::DscpToTc | QosMapType::DscpToColor)
    }

    /// Returns true if the map classifies ingress traffic.
    pub const fn is_ingress_classification(&self) -> bool {
        self.is_dot1p_family() || self.is_dscp_family()
    }

    /// Returns the SAI-style name of the map type.
    pub const fn as_str(&self) -> &'static str {
        match self {
            QosMapType::Dot1pToTc => "DOT1P_TO_TC",
            QosMapType::Dot1pToColor => "DOT1P_TO_COLOR",
            QosMapType::DscpToTc => "DSCP_TO_TC",
            QosMapType::DscpToColor => "DSCP_TO_COLOR",
            QosMapType::TcToQueue => "TC_TO_QUEUE",
            QosMapType::TcAndColorToDscp => "TC_AND_COLOR_TO_DSCP",
            QosMapType::TcAndColorToDot1p => "TC_AND_COLOR_TO_DOT1P",
            QosMapType::TcToPriorityGroup => "TC_TO_PRIORITY_GROUP",
            QosMapType::PfcPriorityToPriorityGroup => "PFC_PRIORITY_TO_PRIORITY_GROUP",
            QosMapType::PfcPriorityToQueue => "PFC_PRIORITY_TO_QUEUE",
            QosMapType::DscpToForwardingClass => "DSCP_TO_FORWARDING_CLASS",
            QosMapType::MplsExpToTc => "MPLS_EXP_TO_TC",
            QosMapType::MplsExpToColor => "MPLS_EXP_TO_COLOR",
            QosMapType::TcAndColorToMplsExp => "TC_AND_COLOR_TO_MPLS_EXP",
        }
    }
}

impl fmt::Display for QosMapType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for QosMapType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_uppercase();
        QosMapType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == upper)
            .ok_or_else(|| ParseError::InvalidMapType(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_slots_are_dense_and_unique() {
        for (i, t) in QosMapType::ALL.iter().enumerate() {
            assert_eq!(t.slot(), i);
        }
    }

    #[test]
    fn test_families() {
        assert!(QosMapType::Dot1pToColor.is_dot1p_family());
        assert!(QosMapType::DscpToTc.is_dscp_family());
        assert!(!QosMapType::TcToQueue.is_ingress_classification());
    }

    #[test]
    fn test_parse() {
        assert_eq!("dscp_to_tc".parse::<QosMapType>().unwrap(), QosMapType::DscpToTc);
        assert_eq!(
            "TC_TO_PRIORITY_GROUP".parse::<QosMapType>().unwrap(),
            QosMapType::TcToPriorityGroup
        );
        assert!("exp_to_nothing".parse::<QosMapType>().is_err());
    }
}
