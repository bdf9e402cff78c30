//! WredOrch implementation.

use std::sync::Arc;

use serde_json::json;
use sonic_sai::{BufferPoolOid, PortOid, WredOid};
use sonic_types::QueueType;

use super::link::{self, WredLinkKind, WredLinkTarget};
use super::types::{WredAttr, WredAttrId, WredConfig, WredNode};
use crate::audit::{AuditCategory, AuditOutcome, AuditRecord};
use crate::buffer::{port_wred_queue_ids, wred_queue_ids};
use crate::context::QosContext;
use crate::db::QosDb;
use crate::error::{QosError, QosResult};
use crate::npu::NpuApiTable;
use crate::{audit_log, debug_log, error_log, warn_log};

/// WRED orchestrator statistics.
#[derive(Debug, Clone, Default)]
pub struct WredOrchStats {
    pub profiles_created: u64,
    pub profiles_removed: u64,
    pub attributes_set: u64,
    pub links_cached: u64,
    pub cache_flushes: u64,
}

// A pool-level link only reaches hardware once some queue draws from the
// pool; until then it is kept in software.
fn needs_cache(db: &QosDb, target: WredLinkTarget) -> QosResult<bool> {
    Ok(match target {
        WredLinkTarget::Queue(_) => false,
        WredLinkTarget::BufferPool(pool) => wred_queue_ids(db, pool)?.is_empty(),
        WredLinkTarget::PortPool(pp) => {
            let node = db.port_pool(pp)?;
            port_wred_queue_ids(db, node.port_id, node.pool_id).is_empty()
        }
    })
}

/// Links `wred` to `target`, replacing its current profile. A null `wred`
/// removes the current link. Writing the profile already linked is a
/// no-op.
pub(crate) fn wred_apply(
    npu: &NpuApiTable,
    db: &mut QosDb,
    target: WredLinkTarget,
    wred: WredOid,
) -> QosResult<()> {
    let current = *link::slot(db, target)?;
    let old = current.wred_id;
    if old == wred {
        return Ok(());
    }

    if wred.is_null() {
        if !current.sw_cached {
            npu.wred.wred_link_reset(target)?;
        }
        return link::remove(db, old, target);
    }

    if !db.wreds.contains(&wred) {
        return Err(QosError::InvalidObjectId(wred.as_raw()));
    }
    if let WredLinkTarget::Queue(q) = target {
        let queue_type = db.queue(q)?.queue_type;
        if queue_type != QueueType::Unicast {
            return Err(QosError::invalid_attr_value(format!(
                "WRED needs a unicast queue, {} is {}",
                q, queue_type
            )));
        }
    }

    if needs_cache(db, target)? {
        if !old.is_null() && !current.sw_cached {
            npu.wred.wred_link_reset(target)?;
        }
        link::remove(db, old, target)?;
        link::insert(db, wred, target)?;
        link::mark_cached(db, target)?;
        debug_log!("WredOrch", target = target.as_raw(), wred = %wred, "WRED link cached");
        return Ok(());
    }

    npu.wred.wred_link_set(target, db.wred(wred)?)?;
    link::remove(db, old, target)?;
    link::insert(db, wred, target)
}

/// Pushes cached WRED links of `pool` and of `port`'s view of it to
/// hardware once queues draw from them. Failures are logged and the link
/// stays cached.
pub(crate) fn flush_cached(npu: &NpuApiTable, db: &mut QosDb, pool: BufferPoolOid, port: PortOid) {
    let mut candidates = vec![WredLinkTarget::BufferPool(pool)];
    if let Some(pp) = db.find_port_pool(port, pool) {
        candidates.push(WredLinkTarget::PortPool(pp));
    }

    for target in candidates {
        let cached = match link::slot(db, target) {
            Ok(s) if s.sw_cached && !s.wred_id.is_null() => s.wred_id,
            _ => continue,
        };
        if needs_cache(db, target).unwrap_or(true) {
            continue;
        }
        if let Err(e) = push_cached(npu, db, target, cached) {
            warn_log!(
                "WredOrch",
                target = target.as_raw(),
                wred = %cached,
                error = %e,
                "failed to apply cached WRED link"
            );
            continue;
        }
        debug_log!("WredOrch", target = target.as_raw(), wred = %cached, "cached WRED link applied");
    }
}

fn push_cached(npu: &NpuApiTable, db: &mut QosDb, target: WredLinkTarget, wred: WredOid) -> QosResult<()> {
    npu.wred.wred_link_set(target, db.wred(wred)?)?;
    link::unmark_cached(db, target)
}

/// WRED profile orchestrator.
pub struct WredOrch {
    ctx: Arc<QosContext>,
    stats: WredOrchStats,
}

impl std::fmt::Debug for WredOrch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WredOrch").field("stats", &self.stats).finish()
    }
}

impl WredOrch {
    pub fn new(ctx: Arc<QosContext>) -> Self {
        Self {
            ctx,
            stats: WredOrchStats::default(),
        }
    }

    pub fn stats(&self) -> &WredOrchStats {
        &self.stats
    }

    pub fn create(&mut self, attrs: &[WredAttr]) -> QosResult<WredOid> {
        let mut config = WredConfig::default();
        for (i, attr) in attrs.iter().enumerate() {
            config.apply(attr).map_err(|e| e.at_index(i))?;
        }
        config.validate()?;

        let mut db = self.ctx.lock();
        let id = self.ctx.npu().wred.wred_create(&config).inspect_err(|e| {
            audit_log!(AuditRecord::new(AuditCategory::ResourceCreate, "WredOrch", "create_wred")
                .with_object_type("wred")
                .with_error(e.to_string()));
        })?;
        db.wreds.insert(id, WredNode::new(id, config))?;

        self.stats.profiles_created = self.stats.profiles_created.saturating_add(1);
        audit_log!(AuditRecord::new(AuditCategory::ResourceCreate, "WredOrch", "create_wred")
            .with_outcome(AuditOutcome::Success)
            .with_object_id(id.to_string())
            .with_object_type("wred"));
        Ok(id)
    }

    /// Removes a WRED profile no queue or pool links to.
    pub fn remove(&mut self, id: WredOid) -> QosResult<()> {
        let mut db = self.ctx.lock();
        let links = db.wred(id)?.links.len();
        if links > 0 {
            audit_log!(AuditRecord::new(AuditCategory::ResourceDelete, "WredOrch", "remove_wred")
                .with_outcome(AuditOutcome::Denied)
                .with_object_id(id.to_string())
                .with_object_type("wred")
                .with_error(format!("{} links", links)));
            return Err(QosError::object_in_use(format!("WRED {} has {} links", id, links)));
        }

        self.ctx.npu().wred.wred_remove(id)?;
        db.wreds.remove(&id);

        self.stats.profiles_removed = self.stats.profiles_removed.saturating_add(1);
        audit_log!(AuditRecord::new(AuditCategory::ResourceDelete, "WredOrch", "remove_wred")
            .with_outcome(AuditOutcome::Success)
            .with_object_id(id.to_string())
            .with_object_type("wred"));
        Ok(())
    }

    /// Changes one parameter and re-programs every link already in
    /// hardware. Cached links pick the change up when they are flushed.
    pub fn set_attribute(&mut self, id: WredOid, attr: WredAttr) -> QosResult<()> {
        let mut db = self.ctx.lock();
        let npu = self.ctx.npu();

        let old_node = db.wred(id)?.clone();
        let mut new_node = old_node.clone();
        new_node.config.apply(&attr)?;
        new_node.config.validate()?;
        if new_node.config == old_node.config {
            return Ok(());
        }

        npu.wred.wred_attribute_set(id, &attr)?;

        let mut targets = Vec::new();
        for kind in WredLinkKind::ALL {
            for target in old_node.links.targets(kind) {
                if !link::is_cached(&db, target)? {
                    targets.push(target);
                }
            }
        }

        let reapplied = crate::rollback::apply_all(
            "WredOrch",
            &targets,
            |t| npu.wred.wred_link_set(t, &new_node),
            |t| npu.wred.wred_link_set(t, &old_node),
        );
        if let Err(e) = reapplied {
            let previous = old_node.config.get(attr.id());
            if let Err(restore) = npu.wred.wred_attribute_set(id, &previous) {
                error_log!("WredOrch", wred = %id, error = %restore, "failed to restore WRED attribute");
            }
            audit_log!(AuditRecord::new(AuditCategory::ResourceModify, "WredOrch", "set_attribute")
                .with_object_id(id.to_string())
                .with_object_type("wred")
                .with_details(json!({ "links": targets.len() }))
                .with_error(e.to_string()));
            return Err(e.into());
        }

        db.wred_mut(id)?.config = new_node.config;
        self.stats.attributes_set = self.stats.attributes_set.saturating_add(1);
        debug_log!("WredOrch", wred = %id, attr = ?attr, links = targets.len(), "WRED profile updated");
        Ok(())
    }

    pub fn get_attribute(&self, id: WredOid, ids: &[WredAttrId]) -> QosResult<Vec<WredAttr>> {
        let db = self.ctx.lock();
        let config = db.wred(id)?.config;
        Ok(ids.iter().map(|&a| config.get(a)).collect())
    }

    /// Links `wred` to a queue, port pool or buffer pool; null unlinks.
    pub fn link(&mut self, target: WredLinkTarget, wred: WredOid) -> QosResult<()> {
        let mut db = self.ctx.lock();
        wred_apply(self.ctx.npu(), &mut db, target, wred)?;
        if !wred.is_null() && link::is_cached(&db, target)? {
            self.stats.links_cached = self.stats.links_cached.saturating_add(1);
        }
        Ok(())
    }

    /// Every target currently linked to `id`, of all kinds.
    pub fn links(&self, id: WredOid) -> QosResult<Vec<WredLinkTarget>> {
        let db = self.ctx.lock();
        let node = db.wred(id)?;
        Ok(WredLinkKind::ALL
            .into_iter()
            .flat_map(|k| node.links.targets(k))
            .collect())
    }

    /// Whether `target`'s link is still only recorded in software.
    pub fn is_cached(&self, target: WredLinkTarget) -> QosResult<bool> {
        link::is_cached(&self.ctx.lock(), target)
    }

    /// Pushes any cached link of `pool` for `port` to hardware.
    pub fn flush(&mut self, pool: BufferPoolOid, port: PortOid) {
        let mut db = self.ctx.lock();
        flush_cached(self.ctx.npu(), &mut db, pool, port);
        self.stats.cache_flushes = self.stats.cache_flushes.saturating_add(1);
    }
}
