//! SchedulerOrch implementation.

use std::sync::Arc;

use sonic_sai::SchedulerOid;

use super::reapply::reapply;
use super::types::{SchedulerAttr, SchedulerAttrId, SchedulerConfig, SchedulerNode, SchedulerTarget};
use crate::audit::{AuditCategory, AuditOutcome, AuditRecord};
use crate::context::QosContext;
use crate::db::QosDb;
use crate::error::{QosError, QosResult};
use crate::npu::NpuApiTable;
use crate::{audit_log, debug_log, error_log};

/// Scheduler orchestrator statistics.
#[derive(Debug, Clone, Default)]
pub struct SchedulerOrchStats {
    pub schedulers_created: u64,
    pub schedulers_removed: u64,
    pub attributes_set: u64,
    pub reapply_failures: u64,
}

/// Creates a scheduler in the backend and stores it.
pub(crate) fn insert_scheduler(
    npu: &NpuApiTable,
    db: &mut QosDb,
    config: SchedulerConfig,
) -> QosResult<SchedulerOid> {
    let id = npu.scheduler.scheduler_create(&config)?;
    db.schedulers.insert(id, SchedulerNode::new(id, config))?;
    Ok(id)
}

fn current(db: &QosDb, target: SchedulerTarget) -> QosResult<SchedulerOid> {
    Ok(match target {
        SchedulerTarget::Queue(q) => db.queue(q)?.scheduler_id,
        SchedulerTarget::Group(g) => db.sched_group(g)?.scheduler_id,
        SchedulerTarget::Port(p) => db.port(p)?.scheduler_id,
    })
}

fn set_current(db: &mut QosDb, target: SchedulerTarget, id: SchedulerOid) -> QosResult<()> {
    match target {
        SchedulerTarget::Queue(q) => db.queue_mut(q)?.scheduler_id = id,
        SchedulerTarget::Group(g) => db.sched_group_mut(g)?.scheduler_id = id,
        SchedulerTarget::Port(p) => db.port_mut(p)?.scheduler_id = id,
    }
    Ok(())
}

fn link(node: &mut SchedulerNode, target: SchedulerTarget) -> QosResult<()> {
    match target {
        SchedulerTarget::Queue(q) => node.queues.link_back(q)?,
        SchedulerTarget::Group(g) => node.groups.link_back(g)?,
        SchedulerTarget::Port(p) => node.ports.link_back(p)?,
    }
    Ok(())
}

fn unlink(node: &mut SchedulerNode, target: SchedulerTarget) -> QosResult<()> {
    match target {
        SchedulerTarget::Queue(q) => node.queues.unlink(&q)?,
        SchedulerTarget::Group(g) => node.groups.unlink(&g)?,
        SchedulerTarget::Port(p) => node.ports.unlink(&p)?,
    }
    Ok(())
}

/// Applies scheduler `new` to `target`; a null `new` removes the current
/// one. Writing the scheduler already applied is a no-op.
pub(crate) fn scheduler_apply(
    npu: &NpuApiTable,
    db: &mut QosDb,
    target: SchedulerTarget,
    new: SchedulerOid,
) -> QosResult<()> {
    let old = current(db, target)?;
    if old == new {
        return Ok(());
    }
    if !new.is_null() && !db.schedulers.contains(&new) {
        return Err(QosError::InvalidObjectId(new.as_raw()));
    }

    npu.scheduler
        .scheduler_set(target, db.schedulers.get(&old), db.schedulers.get(&new))?;

    if !old.is_null() {
        unlink(db.scheduler_mut(old)?, target)?;
    }
    if !new.is_null() {
        link(db.scheduler_mut(new)?, target)?;
    }
    set_current(db, target, new)
}

/// Drops `target` from its scheduler's user list without a backend call.
///
/// Used when the object itself is about to be removed.
pub(crate) fn scheduler_unlink(db: &mut QosDb, target: SchedulerTarget) -> QosResult<()> {
    let old = current(db, target)?;
    if old.is_null() {
        return Ok(());
    }
    unlink(db.scheduler_mut(old)?, target)?;
    set_current(db, target, SchedulerOid::NULL)
}

/// Scheduler profile orchestrator.
pub struct SchedulerOrch {
    ctx: Arc<QosContext>,
    stats: SchedulerOrchStats,
}

impl std::fmt::Debug for SchedulerOrch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchedulerOrch")
            .field("stats", &self.stats)
            .finish()
    }
}

impl SchedulerOrch {
    pub fn new(ctx: Arc<QosContext>) -> Self {
        Self {
            ctx,
            stats: SchedulerOrchStats::default(),
        }
    }

    pub fn stats(&self) -> &SchedulerOrchStats {
        &self.stats
    }

    pub fn create(&mut self, attrs: &[SchedulerAttr]) -> QosResult<SchedulerOid> {
        let mut config = SchedulerConfig::default();
        for (i, attr) in attrs.iter().enumerate() {
            config.apply(attr).map_err(|e| e.at_index(i))?;
        }

        let mut db = self.ctx.lock();
        let id = insert_scheduler(self.ctx.npu(), &mut db, config).inspect_err(|e| {
            audit_log!(AuditRecord::new(AuditCategory::ResourceCreate, "SchedulerOrch", "create_scheduler")
                .with_object_type("scheduler")
                .with_error(e.to_string()));
        })?;

        self.stats.schedulers_created = self.stats.schedulers_created.saturating_add(1);
        audit_log!(AuditRecord::new(AuditCategory::ResourceCreate, "SchedulerOrch", "create_scheduler")
            .with_outcome(AuditOutcome::Success)
            .with_object_id(id.to_string())
            .with_object_type("scheduler"));
        Ok(id)
    }

    /// Removes an unreferenced scheduler. The switch default scheduler
    /// can never be removed.
    pub fn remove(&mut self, id: SchedulerOid) -> QosResult<()> {
        let mut db = self.ctx.lock();
        let node = db.scheduler(id)?;
        if id == self.ctx.default_scheduler() {
            return Err(QosError::object_in_use("switch default scheduler"));
        }
        if node.is_referenced() {
            audit_log!(AuditRecord::new(AuditCategory::ResourceDelete, "SchedulerOrch", "remove_scheduler")
                .with_outcome(AuditOutcome::Denied)
                .with_object_id(id.to_string())
                .with_error(format!("{} users", node.ref_count())));
            return Err(QosError::object_in_use(format!(
                "scheduler {} has {} users",
                id,
                node.ref_count()
            )));
        }

        self.ctx.npu().scheduler.scheduler_remove(id)?;
        db.schedulers.remove(&id);

        self.stats.schedulers_removed = self.stats.schedulers_removed.saturating_add(1);
        audit_log!(AuditRecord::new(AuditCategory::ResourceDelete, "SchedulerOrch", "remove_scheduler")
            .with_outcome(AuditOutcome::Success)
            .with_object_id(id.to_string())
            .with_object_type("scheduler"));
        Ok(())
    }

    /// Changes one parameter and re-programs every user of the profile.
    ///
    /// If any user fails, the users already re-programmed and the profile
    /// itself are restored and the profile keeps its old parameters.
    pub fn set_attribute(&mut self, id: SchedulerOid, attr: SchedulerAttr) -> QosResult<()> {
        let mut db = self.ctx.lock();
        let npu = self.ctx.npu();

        let old_node = db.scheduler(id)?.clone();
        let mut new_node = old_node.clone();
        new_node.config.apply(&attr)?;
        if new_node.config == old_node.config {
            return Ok(());
        }

        npu.scheduler.scheduler_attribute_set(id, &attr)?;

        if let Err(e) = reapply(npu, &old_node, &new_node) {
            self.stats.reapply_failures = self.stats.reapply_failures.saturating_add(1);
            let previous = old_node.config.get(attr.id());
            if let Err(restore) = npu.scheduler.scheduler_attribute_set(id, &previous) {
                error_log!(
                    "SchedulerOrch",
                    scheduler = %id,
                    error = %restore,
                    "failed to restore scheduler attribute"
                );
            }
            return Err(e.into());
        }

        db.scheduler_mut(id)?.config = new_node.config;
        self.stats.attributes_set = self.stats.attributes_set.saturating_add(1);
        debug_log!(
            "SchedulerOrch",
            scheduler = %id,
            attr = ?attr,
            users = old_node.ref_count(),
            "scheduler updated"
        );
        audit_log!(AuditRecord::new(AuditCategory::ResourceModify, "SchedulerOrch", "set_attribute")
            .with_outcome(AuditOutcome::Success)
            .with_object_id(id.to_string())
            .with_object_type("scheduler"));
        Ok(())
    }

    pub fn get_attribute(&self, id: SchedulerOid, ids: &[SchedulerAttrId]) -> QosResult<Vec<SchedulerAttr>> {
        let db = self.ctx.lock();
        let config = db.scheduler(id)?.config;
        Ok(ids.iter().map(|&a| config.get(a)).collect())
    }

    /// Number of queues, groups and ports using the scheduler.
    pub fn ref_count(&self, id: SchedulerOid) -> QosResult<usize> {
        Ok(self.ctx.lock().scheduler(id)?.ref_count())
    }
}
