//! QosMapOrch implementation.

use std::sync::Arc;

use serde_json::json;
use sonic_sai::{PortOid, QosMapOid};
use sonic_types::QosMapType;

use super::attach::{get_tc_from_pg, map_port_list_update, map_set};
use super::types::{validate_entries, QosMapAttr, QosMapAttrId, QosMapEntry, QosMapNode};
use crate::audit::{AuditCategory, AuditOutcome, AuditRecord};
use crate::context::QosContext;
use crate::error::{QosError, QosResult};
use crate::{audit_log, debug_log, error_log};

/// QoS map orchestrator statistics.
#[derive(Debug, Clone, Default)]
pub struct QosMapOrchStats {
    pub maps_created: u64,
    pub maps_removed: u64,
    pub maps_updated: u64,
    pub port_binds: u64,
}

/// QoS map orchestrator.
pub struct QosMapOrch {
    ctx: Arc<QosContext>,
    stats: QosMapOrchStats,
}

impl std::fmt::Debug for QosMapOrch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QosMapOrch")
            .field("stats", &self.stats)
            .finish()
    }
}

impl QosMapOrch {
    pub fn new(ctx: Arc<QosContext>) -> Self {
        Self {
            ctx,
            stats: QosMapOrchStats::default(),
        }
    }

    pub fn stats(&self) -> &QosMapOrchStats {
        &self.stats
    }

    /// Creates a map. The type is mandatory and must be supported by the
    /// backend; the entry list defaults to empty.
    pub fn create(&mut self, attrs: &[QosMapAttr]) -> QosResult<QosMapOid> {
        let mut map_type = None;
        let mut entries: Vec<QosMapEntry> = Vec::new();
        for attr in attrs {
            match attr {
                QosMapAttr::Type(t) => map_type = Some(*t),
                QosMapAttr::MapToValueList(list) => entries = list.clone(),
            }
        }
        let map_type = map_type.ok_or_else(|| QosError::invalid_parameter("missing map type"))?;
        if let Some(pos) = attrs.iter().position(|a| matches!(a, QosMapAttr::MapToValueList(_))) {
            validate_entries(map_type, &entries).map_err(|e| e.at_index(pos))?;
        }

        let npu = self.ctx.npu();
        if !npu.qos_map.is_map_type_supported(map_type) {
            return Err(QosError::not_supported(format!("map type {}", map_type)));
        }

        let mut db = self.ctx.lock();
        let mut node = QosMapNode::new(map_type, entries);
        let id = npu.qos_map.map_create(&node).inspect_err(|e| {
            audit_log!(AuditRecord::new(AuditCategory::ResourceCreate, "QosMapOrch", "create_map")
                .with_object_type("qos_map")
                .with_details(json!({ "type": map_type }))
                .with_error(e.to_string()));
        })?;
        node.map_id = id;
        db.maps.insert(id, node)?;

        self.stats.maps_created = self.stats.maps_created.saturating_add(1);
        audit_log!(AuditRecord::new(AuditCategory::ResourceCreate, "QosMapOrch", "create_map")
            .with_outcome(AuditOutcome::Success)
            .with_object_id(id.to_string())
            .with_object_type("qos_map")
            .with_details(json!({ "type": map_type })));
        Ok(id)
    }

    /// Removes a map no port uses.
    pub fn remove(&mut self, id: QosMapOid) -> QosResult<()> {
        let mut db = self.ctx.lock();
        let ports = db.map(id)?.ports.len();
        if ports > 0 {
            audit_log!(AuditRecord::new(AuditCategory::ResourceDelete, "QosMapOrch", "remove_map")
                .with_outcome(AuditOutcome::Denied)
                .with_object_id(id.to_string())
                .with_object_type("qos_map")
                .with_error(format!("{} ports", ports)));
            return Err(QosError::object_in_use(format!("map {} is used by {} ports", id, ports)));
        }

        self.ctx.npu().qos_map.map_remove(id)?;
        db.maps.remove(&id);

        self.stats.maps_removed = self.stats.maps_removed.saturating_add(1);
        audit_log!(AuditRecord::new(AuditCategory::ResourceDelete, "QosMapOrch", "remove_map")
            .with_outcome(AuditOutcome::Success)
            .with_object_id(id.to_string())
            .with_object_type("qos_map"));
        Ok(())
    }

    /// Replaces the entry list and pushes the map to every port using it.
    pub fn set_attribute(&mut self, id: QosMapOid, attr: QosMapAttr) -> QosResult<()> {
        let mut guard = self.ctx.lock();
        let db = &mut *guard;
        let npu = self.ctx.npu();

        let entries = match &attr {
            QosMapAttr::MapToValueList(list) => list,
            QosMapAttr::Type(_) => {
                return Err(QosError::invalid_parameter("map type cannot be changed after create"))
            }
        };
        let old = db.map(id)?.clone();
        validate_entries(old.map_type, entries)?;
        if old.entries == *entries {
            return Ok(());
        }

        let mut updated = old.clone();
        updated.entries = entries.clone();
        npu.qos_map.map_attribute_set(&updated, &attr)?;
        db.map_mut(id)?.entries = entries.clone();

        if let Err(e) = map_port_list_update(npu, db, id) {
            let restore = QosMapAttr::MapToValueList(old.entries.clone());
            if let Err(r) = npu.qos_map.map_attribute_set(&old, &restore) {
                error_log!("QosMapOrch", map = %id, error = %r, "failed to restore map entries");
            }
            db.map_mut(id)?.entries = old.entries;
            audit_log!(AuditRecord::new(AuditCategory::ResourceModify, "QosMapOrch", "set_attribute")
                .with_object_id(id.to_string())
                .with_object_type("qos_map")
                .with_details(json!({ "ports": old.ports.len() }))
                .with_error(e.to_string()));
            return Err(e);
        }

        self.stats.maps_updated = self.stats.maps_updated.saturating_add(1);
        debug_log!("QosMapOrch", map = %id, entries = entries.len(), ports = old.ports.len(), "map updated");
        Ok(())
    }

    pub fn get_attribute(&self, id: QosMapOid, ids: &[QosMapAttrId]) -> QosResult<Vec<QosMapAttr>> {
        let db = self.ctx.lock();
        let node = db.map(id)?;
        Ok(ids
            .iter()
            .map(|a| match a {
                QosMapAttrId::Type => QosMapAttr::Type(node.map_type),
                QosMapAttrId::MapToValueList => QosMapAttr::MapToValueList(node.entries.clone()),
            })
            .collect())
    }

    /// Installs `map` in the `map_type` slot of `port`; null withdraws.
    pub fn bind_port(&mut self, port: PortOid, map_type: QosMapType, map: QosMapOid) -> QosResult<()> {
        let mut db = self.ctx.lock();
        map_set(self.ctx.npu(), &mut db, port, map_type, map)?;
        self.stats.port_binds = self.stats.port_binds.saturating_add(1);
        Ok(())
    }

    /// Ports currently using `map`.
    pub fn ports(&self, id: QosMapOid) -> QosResult<Vec<PortOid>> {
        Ok(self.ctx.lock().map(id)?.ports.iter().collect())
    }

    pub fn tc_for_pg(&self, port: PortOid, pg_index: u8) -> QosResult<u8> {
        get_tc_from_pg(&self.ctx.lock(), port, pg_index)
    }
}
