//! QoS map node and attributes.

use serde::Serialize;
use sonic_orch_common::IdList;
use sonic_sai::{PortOid, QosMapOid};
use sonic_types::{PacketColor, QosMapType};

use crate::consts::{MAX_DOT1P, MAX_DSCP, MAX_PFC_PRI, MAX_TC};
use crate::error::{QosError, QosResult};

/// Key or value side of a map entry. Only the fields relevant to the
/// map type are read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QosMapParams {
    pub tc: u8,
    pub dscp: u8,
    pub dot1p: u8,
    pub prio: u8,
    pub pg: u8,
    pub queue_index: u8,
    pub color: PacketColor,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QosMapEntry {
    pub key: QosMapParams,
    pub value: QosMapParams,
}

impl QosMapEntry {
    pub fn new(key: QosMapParams, value: QosMapParams) -> Self {
        Self { key, value }
    }
}

fn check(field: &str, v: u8, max: u8) -> QosResult<()> {
    if v >= max {
        return Err(QosError::invalid_attr_value(format!(
            "{} {} out of range (max {})",
            field,
            v,
            max - 1
        )));
    }
    Ok(())
}

/// Range-checks the fields `map_type` reads.
pub fn validate_entries(map_type: QosMapType, entries: &[QosMapEntry]) -> QosResult<()> {
    for e in entries {
        match map_type {
            QosMapType::Dot1pToTc => {
                check("dot1p", e.key.dot1p, MAX_DOT1P)?;
                check("tc", e.value.tc, MAX_TC)?;
            }
            QosMapType::Dot1pToColor => check("dot1p", e.key.dot1p, MAX_DOT1P)?,
            QosMapType::DscpToTc => {
                check("dscp", e.key.dscp, MAX_DSCP)?;
                check("tc", e.value.tc, MAX_TC)?;
            }
            QosMapType::DscpToColor => check("dscp", e.key.dscp, MAX_DSCP)?,
            QosMapType::TcToQueue => check("tc", e.key.tc, MAX_TC)?,
            QosMapType::TcToPriorityGroup => check("tc", e.key.tc, MAX_TC)?,
            QosMapType::PfcPriorityToQueue | QosMapType::PfcPriorityToPriorityGroup => {
                check("prio", e.key.prio, MAX_PFC_PRI)?
            }
            QosMapType::TcAndColorToDot1p => {
                check("tc", e.key.tc, MAX_TC)?;
                check("dot1p", e.value.dot1p, MAX_DOT1P)?;
            }
            QosMapType::TcAndColorToDscp => {
                check("tc", e.key.tc, MAX_TC)?;
                check("dscp", e.value.dscp, MAX_DSCP)?;
            }
            _ => {}
        }
    }
    Ok(())
}

/// A classification map and the ports using it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QosMapNode {
    pub map_id: QosMapOid,
    pub map_type: QosMapType,
    pub entries: Vec<QosMapEntry>,
    #[serde(skip)]
    pub ports: IdList<PortOid>,
}

impl QosMapNode {
    pub fn new(map_type: QosMapType, entries: Vec<QosMapEntry>) -> Self {
        Self {
            map_id: QosMapOid::NULL,
            map_type,
            entries,
            ports: IdList::new(),
        }
    }
}

/// QoS map attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QosMapAttr {
    /// Create only.
    Type(QosMapType),
    MapToValueList(Vec<QosMapEntry>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QosMapAttrId {
    Type,
    MapToValueList,
}
