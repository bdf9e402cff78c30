//! Policer node and attributes.

use serde::Serialize;
use sonic_orch_common::IdList;
use sonic_sai::{AclEntryOid, PolicerOid, PortOid};
use sonic_types::{ColorSource, MeterType, PacketAction, PacketColor, PolicerMode, StormType};

use crate::consts::POLICER_MAX_ACTION;
use crate::error::{QosError, QosResult};

/// Rate and burst parameters of a policer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PolicerConfig {
    pub meter_type: MeterType,
    pub mode: PolicerMode,
    pub color_source: ColorSource,
    pub cbs: u64,
    pub cir: u64,
    pub pbs: u64,
    pub pir: u64,
    /// Per-color action, indexed by [`PacketColor::index`]. `None` keeps
    /// the default (forward).
    pub actions: [Option<PacketAction>; POLICER_MAX_ACTION],
}

impl PolicerConfig {
    pub fn action(&self, color: PacketColor) -> PacketAction {
        self.actions[color.index()].unwrap_or_default()
    }

    pub fn apply(&mut self, attr: &PolicerAttr) -> QosResult<()> {
        match *attr {
            PolicerAttr::MeterType(m) => self.meter_type = m,
            PolicerAttr::Mode(m) => self.mode = m,
            PolicerAttr::ColorSource(c) => self.color_source = c,
            PolicerAttr::Cbs(v) => self.cbs = v,
            PolicerAttr::Cir(v) => self.cir = v,
            PolicerAttr::Pbs(v) => self.pbs = v,
            PolicerAttr::Pir(v) => self.pir = v,
            PolicerAttr::PacketAction(c, a) => self.actions[c.index()] = Some(a),
        }
        Ok(())
    }

    pub fn validate(&self) -> QosResult<()> {
        if self.mode == PolicerMode::TrTcm && self.pir < self.cir {
            return Err(QosError::invalid_attr_value(format!(
                "PIR {} below CIR {}",
                self.pir, self.cir
            )));
        }
        Ok(())
    }

    pub fn get(&self, id: PolicerAttrId) -> PolicerAttr {
        match id {
            PolicerAttrId::MeterType => PolicerAttr::MeterType(self.meter_type),
            PolicerAttrId::Mode => PolicerAttr::Mode(self.mode),
            PolicerAttrId::ColorSource => PolicerAttr::ColorSource(self.color_source),
            PolicerAttrId::Cbs => PolicerAttr::Cbs(self.cbs),
            PolicerAttrId::Cir => PolicerAttr::Cir(self.cir),
            PolicerAttrId::Pbs => PolicerAttr::Pbs(self.pbs),
            PolicerAttrId::Pir => PolicerAttr::Pir(self.pir),
            PolicerAttrId::PacketAction(c) => PolicerAttr::PacketAction(c, self.action(c)),
        }
    }
}

/// A policer and its users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicerNode {
    pub policer_id: PolicerOid,
    pub config: PolicerConfig,
    /// Ports using this policer, per storm-control slot.
    #[serde(skip)]
    pub ports: [IdList<PortOid>; StormType::COUNT],
    #[serde(skip)]
    pub acl_rules: IdList<AclEntryOid>,
}

impl PolicerNode {
    pub fn new(policer_id: PolicerOid, config: PolicerConfig) -> Self {
        Self {
            policer_id,
            config,
            ports: Default::default(),
            acl_rules: IdList::new(),
        }
    }

    pub fn is_referenced(&self) -> bool {
        !self.acl_rules.is_empty() || self.ports.iter().any(|l| !l.is_empty())
    }
}

/// Policer attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicerAttr {
    /// Create only.
    MeterType(MeterType),
    /// Create only.
    Mode(PolicerMode),
    ColorSource(ColorSource),
    Cbs(u64),
    Cir(u64),
    Pbs(u64),
    Pir(u64),
    PacketAction(PacketColor, PacketAction),
}

impl PolicerAttr {
    pub fn id(&self) -> PolicerAttrId {
        match *self {
            PolicerAttr::MeterType(_) => PolicerAttrId::MeterType,
            PolicerAttr::Mode(_) => PolicerAttrId::Mode,
            PolicerAttr::ColorSource(_) => PolicerAttrId::ColorSource,
            PolicerAttr::Cbs(_) => PolicerAttrId::Cbs,
            PolicerAttr::Cir(_) => PolicerAttrId::Cir,
            PolicerAttr::Pbs(_) => PolicerAttrId::Pbs,
            PolicerAttr::Pir(_) => PolicerAttrId::Pir,
            PolicerAttr::PacketAction(c, _) => PolicerAttrId::PacketAction(c),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicerAttrId {
    MeterType,
    Mode,
    ColorSource,
    Cbs,
    Cir,
    Pbs,
    Pir,
    PacketAction(PacketColor),
}
