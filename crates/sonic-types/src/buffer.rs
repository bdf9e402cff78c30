//! Buffer pool settings.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Direction of a buffer pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BufferPoolType {
    Ingress,
    Egress,
}

impl BufferPoolType {
    /// Returns the packing discriminator used in pool handles.
    pub const fn as_u32(&self) -> u32 {
        match self {
            BufferPoolType::Ingress => 0,
            BufferPoolType::Egress => 1,
        }
    }

    /// Inverse of [`BufferPoolType::as_u32`].
    pub const fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(BufferPoolType::Ingress),
            1 => Some(BufferPoolType::Egress),
            _ => None,
        }
    }
}

impl fmt::Display for BufferPoolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BufferPoolType::Ingress => write!(f, "ingress"),
            BufferPoolType::Egress => write!(f, "egress"),
        }
    }
}

impl FromStr for BufferPoolType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ingress" => Ok(BufferPoolType::Ingress),
            "egress" => Ok(BufferPoolType::Egress),
            _ => Err(ParseError::InvalidBufferSetting(format!(
                "invalid pool type: {}",
                s
            ))),
        }
    }
}

/// Shared-buffer threshold mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdMode {
    Static,
    #[default]
    Dynamic,
}

impl fmt::Display for ThresholdMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThresholdMode::Static => write!(f, "static"),
            ThresholdMode::Dynamic => write!(f, "dynamic"),
        }
    }
}

impl FromStr for ThresholdMode {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "static" => Ok(ThresholdMode::Static),
            "dynamic" => Ok(ThresholdMode::Dynamic),
            _ => Err(ParseError::InvalidBufferSetting(format!(
                "invalid threshold mode: {}",
                s
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_type_discriminator() {
        for t in [BufferPoolType::Ingress, BufferPoolType::Egress] {
            assert_eq!(BufferPoolType::from_u32(t.as_u32()), Some(t));
        }
        assert_eq!(BufferPoolType::from_u32(7), None);
    }

    #[test]
    fn test_threshold_mode_parse() {
        assert_eq!("STATIC".parse::<ThresholdMode>().unwrap(), ThresholdMode::Static);
        assert!("adaptive".parse::<ThresholdMode>().is_err());
    }
}
