//! WRED profile node and attributes.

use serde::Serialize;
use sonic_sai::WredOid;
use sonic_types::{EcnMarkMode, PacketColor};

use super::link::WredLinks;
use crate::consts::{WRED_MAX_DROP_PROB, WRED_MAX_WEIGHT};
use crate::error::{QosError, QosResult};

/// Drop curve for one packet color.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WredColorConfig {
    pub enable: bool,
    pub min_threshold: u32,
    pub max_threshold: u32,
    /// Percent.
    pub drop_probability: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WredConfig {
    /// Indexed by [`PacketColor::index`].
    pub colors: [WredColorConfig; PacketColor::COUNT],
    pub weight: u8,
    pub ecn_mode: EcnMarkMode,
}

impl WredConfig {
    pub fn color(&self, color: PacketColor) -> &WredColorConfig {
        &self.colors[color.index()]
    }

    /// Validates and stores one attribute.
    pub fn apply(&mut self, attr: &WredAttr) -> QosResult<()> {
        match *attr {
            WredAttr::Enable(c, v) => self.colors[c.index()].enable = v,
            WredAttr::MinThreshold(c, v) => self.colors[c.index()].min_threshold = v,
            WredAttr::MaxThreshold(c, v) => self.colors[c.index()].max_threshold = v,
            WredAttr::DropProbability(c, v) => {
                if v > WRED_MAX_DROP_PROB {
                    return Err(QosError::invalid_attr_value(format!(
                        "{} drop probability {} above {}",
                        c, v, WRED_MAX_DROP_PROB
                    )));
                }
                self.colors[c.index()].drop_probability = v;
            }
            WredAttr::Weight(w) => {
                if w > WRED_MAX_WEIGHT {
                    return Err(QosError::invalid_attr_value(format!(
                        "WRED weight {} above {}",
                        w, WRED_MAX_WEIGHT
                    )));
                }
                self.weight = w;
            }
            WredAttr::EcnMarkMode(m) => self.ecn_mode = m,
        }
        Ok(())
    }

    /// Checks thresholds once all attributes are in.
    pub fn validate(&self) -> QosResult<()> {
        for color in PacketColor::ALL {
            let c = self.color(color);
            if c.enable && c.min_threshold > c.max_threshold {
                return Err(QosError::invalid_attr_value(format!(
                    "{} min threshold {} above max {}",
                    color, c.min_threshold, c.max_threshold
                )));
            }
        }
        Ok(())
    }

    pub fn get(&self, id: WredAttrId) -> WredAttr {
        match id {
            WredAttrId::Enable(c) => WredAttr::Enable(c, self.color(c).enable),
            WredAttrId::MinThreshold(c) => WredAttr::MinThreshold(c, self.color(c).min_threshold),
            WredAttrId::MaxThreshold(c) => WredAttr::MaxThreshold(c, self.color(c).max_threshold),
            WredAttrId::DropProbability(c) => {
                WredAttr::DropProbability(c, self.color(c).drop_probability)
            }
            WredAttrId::Weight => WredAttr::Weight(self.weight),
            WredAttrId::EcnMarkMode => WredAttr::EcnMarkMode(self.ecn_mode),
        }
    }
}

/// A WRED profile and the queues, port pools and buffer pools using it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WredNode {
    pub wred_id: WredOid,
    pub config: WredConfig,
    #[serde(skip)]
    pub links: WredLinks,
}

impl WredNode {
    pub fn new(wred_id: WredOid, config: WredConfig) -> Self {
        Self {
            wred_id,
            config,
            links: WredLinks::default(),
        }
    }
}

/// WRED attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WredAttr {
    Enable(PacketColor, bool),
    MinThreshold(PacketColor, u32),
    MaxThreshold(PacketColor, u32),
    DropProbability(PacketColor, u32),
    Weight(u8),
    EcnMarkMode(EcnMarkMode),
}

impl WredAttr {
    pub fn id(&self) -> WredAttrId {
        match *self {
            WredAttr::Enable(c, _) => WredAttrId::Enable(c),
            WredAttr::MinThreshold(c, _) => WredAttrId::MinThreshold(c),
            WredAttr::MaxThreshold(c, _) => WredAttrId::MaxThreshold(c),
            WredAttr::DropProbability(c, _) => WredAttrId::DropProbability(c),
            WredAttr::Weight(_) => WredAttrId::Weight,
            WredAttr::EcnMarkMode(_) => WredAttrId::EcnMarkMode,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WredAttrId {
    Enable(PacketColor),
    MinThreshold(PacketColor),
    MaxThreshold(PacketColor),
    DropProbability(PacketColor),
    Weight,
    EcnMarkMode,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drop_probability_bound() {
        let mut config = WredConfig::default();
        assert!(config
            .apply(&WredAttr::DropProbability(PacketColor::Red, 101))
            .is_err());
        config
            .apply(&WredAttr::DropProbability(PacketColor::Red, 100))
            .unwrap();
        assert_eq!(config.color(PacketColor::Red).drop_probability, 100);
    }

    #[test]
    fn test_threshold_order_checked_only_when_enabled() {
        let mut config = WredConfig::default();
        config.apply(&WredAttr::MinThreshold(PacketColor::Green, 2000)).unwrap();
        config.apply(&WredAttr::MaxThreshold(PacketColor::Green, 1000)).unwrap();
        assert!(config.validate().is_ok());

        config.apply(&WredAttr::Enable(PacketColor::Green, true)).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_weight_bound() {
        let mut config = WredConfig::default();
        assert!(config.apply(&WredAttr::Weight(16)).is_err());
        config.apply(&WredAttr::Weight(15)).unwrap();
        assert_eq!(config.get(WredAttrId::Weight), WredAttr::Weight(15));
    }
}
