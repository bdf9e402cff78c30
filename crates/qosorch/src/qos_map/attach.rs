//! Binding maps to port slots.
//!
//! The NPU keeps a single active ingress classification map per port, and
//! withdrawing one DOT1P or DSCP map clears all of them. After a removal
//! the surviving ingress map is installed again:
//!
//! - a DOT1P map removed: DSCP_TO_TC if set, else DSCP_TO_COLOR if set;
//! - a DSCP map removed: with no DOT1P map left, DOT1P classification is
//!   reset to the default; otherwise DOT1P_TO_TC if set, else
//!   DOT1P_TO_COLOR.
//!
//! The two directions are not symmetric and are kept that way.

use sonic_sai::{PortOid, QosMapOid};
use sonic_types::QosMapType;

use crate::consts::DEFAULT_TC;
use crate::db::QosDb;
use crate::debug_log;
use crate::error::{QosError, QosResult};
use crate::npu::NpuApiTable;

/// Installs `map` in the `map_type` slot of `port`. A null `map` removes
/// whatever the slot holds.
pub(crate) fn map_set(
    npu: &NpuApiTable,
    db: &mut QosDb,
    port: PortOid,
    map_type: QosMapType,
    map: QosMapOid,
) -> QosResult<()> {
    let old = db
        .ports
        .get(&port)
        .ok_or(QosError::InvalidObjectId(port.as_raw()))?
        .map(map_type);
    if old == map {
        return Ok(());
    }
    if map.is_null() {
        return map_remove(npu, db, port, map_type);
    }

    let node = db.maps.get(&map).ok_or(QosError::InvalidObjectId(map.as_raw()))?;
    if node.map_type != map_type {
        return Err(QosError::invalid_attr_value(format!(
            "map {} is {}, slot is {}",
            map, node.map_type, map_type
        )));
    }

    npu.qos_map.port_map_set(port, map, map_type, true)?;

    if !old.is_null() {
        db.map_mut(old)?.ports.unlink(&port)?;
    }
    db.port_mut(port)?.maps[map_type.slot()] = map;
    db.map_mut(map)?.ports.link_back(port)?;

    debug_log!("QosMapOrch", port = %port, map_type = %map_type, map = %map, "map installed");
    Ok(())
}

/// Withdraws the map in the `map_type` slot of `port`. An empty slot is
/// left alone.
pub(crate) fn map_remove(npu: &NpuApiTable, db: &mut QosDb, port: PortOid, map_type: QosMapType) -> QosResult<()> {
    let map = db.port(port)?.map(map_type);
    if map.is_null() {
        return Ok(());
    }

    npu.qos_map.port_map_set(port, map, map_type, false)?;
    db.port_mut(port)?.maps[map_type.slot()] = QosMapOid::NULL;
    db.map_mut(map)?.ports.unlink(&port)?;

    debug_log!("QosMapOrch", port = %port, map_type = %map_type, map = %map, "map withdrawn");
    reinstall_ingress(npu, db, port, map_type)
}

fn reinstall_ingress(npu: &NpuApiTable, db: &QosDb, port: PortOid, removed: QosMapType) -> QosResult<()> {
    let node = db.port(port)?;
    let first_set = |types: [QosMapType; 2]| {
        types
            .into_iter()
            .map(|t| (t, node.map(t)))
            .find(|(_, m)| !m.is_null())
    };

    let restore = if removed.is_dot1p_family() {
        first_set([QosMapType::DscpToTc, QosMapType::DscpToColor])
    } else if removed.is_dscp_family() {
        match first_set([QosMapType::Dot1pToTc, QosMapType::Dot1pToColor]) {
            None => Some((QosMapType::Dot1pToTc, QosMapOid::NULL)),
            found => found,
        }
    } else {
        None
    };

    if let Some((map_type, map)) = restore {
        npu.qos_map.port_map_set(port, map, map_type, true)?;
        debug_log!("QosMapOrch", port = %port, map_type = %map_type, map = %map, "ingress map reinstalled");
    }
    Ok(())
}

/// Pushes `map` to every port using it. Stops at the first port the
/// backend rejects.
pub(crate) fn map_port_list_update(npu: &NpuApiTable, db: &QosDb, map: QosMapOid) -> QosResult<()> {
    let node = db.map(map)?;
    for port in node.ports.iter() {
        npu.qos_map.port_map_set(port, map, node.map_type, true)?;
    }
    Ok(())
}

/// Traffic class that `port` maps to priority group `pg_index`.
///
/// A port without a TC_TO_PRIORITY_GROUP map uses [`DEFAULT_TC`].
pub fn get_tc_from_pg(db: &QosDb, port: PortOid, pg_index: u8) -> QosResult<u8> {
    let map = db
        .ports
        .get(&port)
        .ok_or_else(|| QosError::invalid_parameter(format!("no QoS state for port {}", port)))?
        .map(QosMapType::TcToPriorityGroup);
    if map.is_null() {
        return Ok(DEFAULT_TC);
    }

    db.map(map)?
        .entries
        .iter()
        .find(|e| e.value.pg == pg_index)
        .map(|e| e.key.tc)
        .ok_or_else(|| QosError::not_found("tc for priority group", pg_index as u64))
}
