//! WRED ECN marking modes.

use crate::{PacketColor, ParseError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which packet colors are ECN marked instead of dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EcnMarkMode {
    #[default]
    None,
    Green,
    Yellow,
    Red,
    GreenYellow,
    GreenRed,
    YellowRed,
    All,
}

impl EcnMarkMode {
    /// Returns true if packets of `color` are ECN marked.
    pub const fn marks(&self, color: PacketColor) -> bool {
        match color {
            PacketColor::Green => matches!(
                self,
                EcnMarkMode::Green | EcnMarkMode::GreenYellow | EcnMarkMode::GreenRed | EcnMarkMode::All
            ),
            PacketColor::Yellow => matches!(
                self,
                EcnMarkMode::Yellow | EcnMarkMode::GreenYellow | EcnMarkMode::YellowRed | EcnMarkMode::All
            ),
            PacketColor::Red => matches!(
                self,
                EcnMarkMode::Red | EcnMarkMode::GreenRed | EcnMarkMode::YellowRed | EcnMarkMode::All
            ),
        }
    }

    /// Returns the mode name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            EcnMarkMode::None => "none",
            EcnMarkMode::Green => "green",
            EcnMarkMode::Yellow => "yellow",
            EcnMarkMode::Red => "red",
            EcnMarkMode::GreenYellow => "green_yellow",
            EcnMarkMode::GreenRed => "green_red",
            EcnMarkMode::YellowRed => "yellow_red",
            EcnMarkMode::All => "all",
        }
    }
}

impl fmt::Display for EcnMarkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EcnMarkMode {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(EcnMarkMode::None),
            "green" => Ok(EcnMarkMode::Green),
            "yellow" => Ok(EcnMarkMode::Yellow),
            "red" => Ok(EcnMarkMode::Red),
            "green_yellow" => Ok(EcnMarkMode::GreenYellow),
            "green_red" => Ok(EcnMarkMode::GreenRed),
            "yellow_red" => Ok(EcnMarkMode::YellowRed),
            "all" => Ok(EcnMarkMode::All),
            _ => Err(ParseError::InvalidEcnMode(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marks() {
        assert!(EcnMarkMode::All.marks(PacketColor::Red));
        assert!(EcnMarkMode::GreenYellow.marks(PacketColor::Yellow));
        assert!(!EcnMarkMode::GreenYellow.marks(PacketColor::Red));
        assert!(!EcnMarkMode::None.marks(PacketColor::Green));
    }

    #[test]
    fn test_parse() {
        assert_eq!("yellow_red".parse::<EcnMarkMode>().unwrap(), EcnMarkMode::YellowRed);
        assert!("blue".parse::<EcnMarkMode>().is_err());
    }
}
