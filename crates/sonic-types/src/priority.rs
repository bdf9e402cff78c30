//! Packet priority fields with range validation.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! bounded_priority {
    ($(#[$meta:meta])* $name:ident, $max:expr, $err:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
        #[serde(try_from = "u8", into = "u8")]
        pub struct $name(u8);

        impl $name {
            /// Number of distinct values.
            pub const COUNT: usize = $max as usize + 1;

            /// Largest valid value.
            pub const MAX: u8 = $max;

            /// Creates a validated value.
            pub const fn new(value: u8) -> Result<Self, ParseError> {
                if value <= Self::MAX {
                    Ok($name(value))
                } else {
                    Err(ParseError::$err(value as u16))
                }
            }

            /// Returns the raw value.
            pub const fn as_u8(&self) -> u8 {
                self.0
            }

            /// Returns the value usable as an array index.
            pub const fn index(&self) -> usize {
                self.0 as usize
            }

            /// Iterates every valid value in ascending order.
            pub fn all() -> impl Iterator<Item = Self> {
                (0..=Self::MAX).map($name)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let value: u16 = s.trim().parse().map_err(|_| ParseError::$err(u16::MAX))?;
                let value = u8::try_from(value).map_err(|_| ParseError::$err(value))?;
                $name::new(value)
            }
        }

        impl TryFrom<u8> for $name {
            type Error = ParseError;

            fn try_from(value: u8) -> Result<Self, Self::Error> {
                $name::new(value)
            }
        }

        impl From<$name> for u8 {
            fn from(value: $name) -> u8 {
                value.0
            }
        }
    };
}

bounded_priority!(
    /// Differentiated Services Code Point (0-63).
    Dscp,
    63,
    InvalidDscp
);

bounded_priority!(
    /// IEEE 802.1p priority code point (0-7).
    Dot1p,
    7,
    InvalidDot1p
);

bounded_priority!(
    /// Switch-internal traffic class (0-15).
    ///
    /// Traffic classes select egress queues and ingress priority groups
    /// through the port's QoS maps.
    TrafficClass,
    15,
    InvalidTrafficClass
);

impl TrafficClass {
    /// Traffic class assigned when no classification map matches.
    pub const DEFAULT: TrafficClass = TrafficClass(0);
}

/// Packet color (drop precedence).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PacketColor {
    #[default]
    Green,
    Yellow,
    Red,
}

impl PacketColor {
    /// Number of colors.
    pub const COUNT: usize = 3;

    /// All colors, in drop-precedence order.
    pub const ALL: [PacketColor; 3] = [PacketColor::Green, PacketColor::Yellow, PacketColor::Red];

    /// Returns the color usable as an array index.
    pub const fn index(&self) -> usize {
        match self {
            PacketColor::Green => 0,
            PacketColor::Yellow => 1,
            PacketColor::Red => 2,
        }
    }
}

impl fmt::Display for PacketColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PacketColor::Green => "green",
            PacketColor::Yellow => "yellow",
            PacketColor::Red => "red",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for PacketColor {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "green" => Ok(PacketColor::Green),
            "yellow" => Ok(PacketColor::Yellow),
            "red" => Ok(PacketColor::Red),
            _ => Err(ParseError::InvalidColor(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_dscp_range() {
        assert!(Dscp::new(0).is_ok());
        assert!(Dscp::new(63).is_ok());
        assert_eq!(Dscp::new(64), Err(ParseError::InvalidDscp(64)));
        assert_eq!(Dscp::COUNT, 64);
    }

    #[test]
    fn test_dot1p_range() {
        assert!(Dot1p::new(7).is_ok());
        assert_eq!(Dot1p::new(8), Err(ParseError::InvalidDot1p(8)));
        assert_eq!(Dot1p::all().count(), 8);
    }

    #[test]
    fn test_traffic_class_parse() {
        assert_eq!("5".parse::<TrafficClass>().unwrap().as_u8(), 5);
        assert!("16".parse::<TrafficClass>().is_err());
        assert!("300".parse::<TrafficClass>().is_err());
        assert!("tc".parse::<TrafficClass>().is_err());
        assert_eq!(TrafficClass::DEFAULT.as_u8(), 0);
    }

    #[test]
    fn test_color_roundtrip_and_index() {
        for color in PacketColor::ALL {
            assert_eq!(color.to_string().parse::<PacketColor>().unwrap(), color);
        }
        assert_eq!(PacketColor::Red.index(), 2);
        assert!("blue".parse::<PacketColor>().is_err());
    }

    #[test]
    fn test_serde_rejects_out_of_range() {
        let dscp: Dscp = serde_json::from_str("46").unwrap();
        assert_eq!(dscp.as_u8(), 46);
        assert!(serde_json::from_str::<Dscp>("64").is_err());
    }
}
