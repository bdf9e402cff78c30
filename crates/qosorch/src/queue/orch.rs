//! QueueOrch implementation.

use std::sync::Arc;

use serde_json::json;
use sonic_sai::{BufferProfileOid, PortOid, QueueOid, SchedulerGroupOid, SchedulerOid, WredOid};
use sonic_types::QueueType;

use super::types::{QueueAttr, QueueAttrId, QueueNode, QueueStat};
use crate::audit::{AuditCategory, AuditOutcome, AuditRecord};
use crate::buffer::{profile_apply, BufferTarget};
use crate::context::QosContext;
use crate::db::QosDb;
use crate::error::{QosError, QosResult};
use crate::sched_group::hierarchy::{self, HierarchyChild};
use crate::sched_group::app_modify_parent;
use crate::scheduler::{scheduler_apply, scheduler_unlink, SchedulerTarget};
use crate::wred::{wred_apply, WredLinkTarget};
use crate::{audit_log, debug_log, warn_log};

/// Queue orchestrator statistics.
#[derive(Debug, Clone, Default)]
pub struct QueueOrchStats {
    pub queues_created: u64,
    pub queues_removed: u64,
    pub create_failures: u64,
    pub reparents: u64,
}

/// Creates queue `index` of `port` in the backend and links it into the
/// port's queue list. No parent, scheduler or profile is applied.
pub(crate) fn create_queue_node(
    ctx: &QosContext,
    db: &mut QosDb,
    port: PortOid,
    queue_type: QueueType,
    index: u32,
) -> QosResult<QueueOid> {
    let is_cpu = db
        .ports
        .get(&port)
        .ok_or(QosError::InvalidObjectId(port.as_raw()))?
        .is_cpu;
    let limit = if is_cpu {
        ctx.config().cpu_port_queues
    } else {
        ctx.config().port_queue_count(queue_type)
    };
    if index >= limit {
        return Err(QosError::invalid_attr_value(format!(
            "{} queue index {} outside 0..{} on port {}",
            queue_type, index, limit, port
        )));
    }
    if let Some(existing) = db.find_port_queue(port, queue_type, index) {
        return Err(QosError::AlreadyExists(format!(
            "port {} already has {} queue {} as {}",
            port, queue_type, index, existing
        )));
    }

    let mut node = QueueNode::new(port, queue_type);
    node.queue_index = index;
    let q = ctx.npu().queue.queue_create(&node)?;
    node.queue_id = q;
    db.queues.insert(q, node)?;
    db.port_mut(port)?.queues.link_back(q)?;

    debug_log!("QueueOrch", queue = %q, port = %port, queue_type = %queue_type, index, "queue created");
    Ok(q)
}

/// Removes a queue and every reference it holds.
///
/// The buffer profile and WRED link are released first, then the
/// scheduler (the switch default is only unlinked), then the queue is
/// detached from its parent and removed.
pub(crate) fn remove_queue_node(ctx: &QosContext, db: &mut QosDb, q: QueueOid) -> QosResult<()> {
    let npu = ctx.npu();
    profile_apply(npu, db, BufferTarget::Queue(q), BufferProfileOid::NULL)?;
    wred_apply(npu, db, WredLinkTarget::Queue(q), WredOid::NULL)?;
    if db.queue(q)?.scheduler_id == ctx.default_scheduler() {
        scheduler_unlink(db, SchedulerTarget::Queue(q))?;
    } else {
        scheduler_apply(npu, db, SchedulerTarget::Queue(q), SchedulerOid::NULL)?;
    }
    hierarchy::detach(npu, db, HierarchyChild::Queue(q))?;

    npu.queue.queue_remove(db.queue(q)?)?;

    let port = db.queue(q)?.port_id;
    db.port_mut(port)?.queues.unlink(&q)?;
    db.queues.remove(&q);
    Ok(())
}

/// Optional references a queue gets at create.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct QueueConfig {
    pub parent: SchedulerGroupOid,
    pub scheduler: SchedulerOid,
    pub wred: WredOid,
    pub buffer_profile: BufferProfileOid,
}

/// Applies `config` to a freshly created queue. A null scheduler means
/// the switch default.
pub(crate) fn configure_queue(ctx: &QosContext, db: &mut QosDb, q: QueueOid, config: QueueConfig) -> QosResult<()> {
    let npu = ctx.npu();
    if !config.parent.is_null() {
        hierarchy::attach(npu, db, HierarchyChild::Queue(q), config.parent)?;
    }
    let scheduler = if config.scheduler.is_null() {
        ctx.default_scheduler()
    } else {
        config.scheduler
    };
    scheduler_apply(npu, db, SchedulerTarget::Queue(q), scheduler)?;
    wred_apply(npu, db, WredLinkTarget::Queue(q), config.wred)?;
    profile_apply(npu, db, BufferTarget::Queue(q), config.buffer_profile)
}

#[derive(Default)]
struct CreateRequest {
    queue_type: Option<QueueType>,
    port: Option<PortOid>,
    index: Option<u32>,
    config: QueueConfig,
}

impl CreateRequest {
    fn parse(attrs: &[QueueAttr]) -> Self {
        let mut req = CreateRequest::default();
        for attr in attrs {
            match *attr {
                QueueAttr::Type(t) => req.queue_type = Some(t),
                QueueAttr::Port(p) => req.port = Some(p),
                QueueAttr::Index(i) => req.index = Some(i),
                QueueAttr::ParentSchedulerNode(p) => req.config.parent = p,
                QueueAttr::SchedulerProfile(s) => req.config.scheduler = s,
                QueueAttr::WredProfile(w) => req.config.wred = w,
                QueueAttr::BufferProfile(b) => req.config.buffer_profile = b,
            }
        }
        req
    }
}

/// Queue orchestrator.
pub struct QueueOrch {
    ctx: Arc<QosContext>,
    stats: QueueOrchStats,
}

impl std::fmt::Debug for QueueOrch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueOrch")
            .field("stats", &self.stats)
            .finish()
    }
}

impl QueueOrch {
    pub fn new(ctx: Arc<QosContext>) -> Self {
        Self {
            ctx,
            stats: QueueOrchStats::default(),
        }
    }

    pub fn stats(&self) -> &QueueOrchStats {
        &self.stats
    }

    /// Creates a queue. Type, port and index are mandatory.
    ///
    /// Every step after the backend create is undone if a later one
    /// fails, so a failed create leaves no trace in the graph.
    pub fn create(&mut self, attrs: &[QueueAttr]) -> QosResult<QueueOid> {
        let req = CreateRequest::parse(attrs);
        let queue_type = req
            .queue_type
            .ok_or_else(|| QosError::invalid_parameter("missing queue type"))?;
        let port = req
            .port
            .ok_or_else(|| QosError::invalid_parameter("missing queue port"))?;
        let index = req
            .index
            .ok_or_else(|| QosError::invalid_parameter("missing queue index"))?;

        let mut guard = self.ctx.lock();
        let db = &mut *guard;

        let q = create_queue_node(&self.ctx, db, port, queue_type, index).inspect_err(|e| {
            self.stats.create_failures = self.stats.create_failures.saturating_add(1);
            audit_log!(AuditRecord::new(AuditCategory::ResourceCreate, "QueueOrch", "create_queue")
                .with_object_type("queue")
                .with_details(json!({ "port": port, "type": queue_type, "index": index }))
                .with_error(e.to_string()));
        })?;

        if let Err(e) = configure_queue(&self.ctx, db, q, req.config) {
            if let Err(cleanup) = remove_queue_node(&self.ctx, db, q) {
                warn_log!("QueueOrch", queue = %q, error = %cleanup, "cleanup after failed create");
            }
            self.stats.create_failures = self.stats.create_failures.saturating_add(1);
            audit_log!(AuditRecord::new(AuditCategory::ResourceCreate, "QueueOrch", "create_queue")
                .with_object_id(q.to_string())
                .with_object_type("queue")
                .with_error(e.to_string()));
            return Err(e);
        }

        self.stats.queues_created = self.stats.queues_created.saturating_add(1);
        audit_log!(AuditRecord::new(AuditCategory::ResourceCreate, "QueueOrch", "create_queue")
            .with_outcome(AuditOutcome::Success)
            .with_object_id(q.to_string())
            .with_object_type("queue")
            .with_details(json!({
                "port": port,
                "type": queue_type,
                "index": index,
                "parent": req.config.parent,
            })));
        Ok(q)
    }

    pub fn remove(&mut self, q: QueueOid) -> QosResult<()> {
        let mut guard = self.ctx.lock();
        remove_queue_node(&self.ctx, &mut guard, q).inspect_err(|e| {
            audit_log!(AuditRecord::new(AuditCategory::ResourceDelete, "QueueOrch", "remove_queue")
                .with_object_id(q.to_string())
                .with_object_type("queue")
                .with_error(e.to_string()));
        })?;

        self.stats.queues_removed = self.stats.queues_removed.saturating_add(1);
        audit_log!(AuditRecord::new(AuditCategory::ResourceDelete, "QueueOrch", "remove_queue")
            .with_outcome(AuditOutcome::Success)
            .with_object_id(q.to_string())
            .with_object_type("queue"));
        Ok(())
    }

    /// Changes the parent, scheduler, WRED profile or buffer profile of a
    /// queue. Writing the value already held is a no-op.
    pub fn set_attribute(&mut self, q: QueueOid, attr: QueueAttr) -> QosResult<()> {
        let mut guard = self.ctx.lock();
        let db = &mut *guard;
        let npu = self.ctx.npu();
        db.queue(q)?;

        match attr {
            QueueAttr::ParentSchedulerNode(parent) => {
                let old = db.queue(q)?.parent_id;
                if old == parent {
                    return Ok(());
                }
                app_modify_parent(&self.ctx, db, HierarchyChild::Queue(q), parent).inspect_err(|e| {
                    audit_log!(AuditRecord::new(AuditCategory::HierarchyChange, "QueueOrch", "modify_parent")
                        .with_object_id(q.to_string())
                        .with_object_type("queue")
                        .with_error(e.to_string()));
                })?;
                self.stats.reparents = self.stats.reparents.saturating_add(1);
                audit_log!(AuditRecord::new(AuditCategory::HierarchyChange, "QueueOrch", "modify_parent")
                    .with_outcome(AuditOutcome::Success)
                    .with_object_id(q.to_string())
                    .with_object_type("queue")
                    .with_details(json!({ "old_parent": old, "new_parent": parent })));
                Ok(())
            }
            QueueAttr::SchedulerProfile(s) => scheduler_apply(npu, db, SchedulerTarget::Queue(q), s),
            QueueAttr::WredProfile(w) => wred_apply(npu, db, WredLinkTarget::Queue(q), w),
            QueueAttr::BufferProfile(b) => profile_apply(npu, db, BufferTarget::Queue(q), b),
            other => Err(QosError::invalid_parameter(format!(
                "{:?} cannot be changed after create",
                other.id()
            ))),
        }
    }

    pub fn get_attribute(&self, q: QueueOid, ids: &[QueueAttrId]) -> QosResult<Vec<QueueAttr>> {
        let db = self.ctx.lock();
        let node = db.queue(q)?;
        Ok(ids
            .iter()
            .map(|a| match a {
                QueueAttrId::Type => QueueAttr::Type(node.queue_type),
                QueueAttrId::Port => QueueAttr::Port(node.port_id),
                QueueAttrId::Index => QueueAttr::Index(node.queue_index),
                QueueAttrId::ParentSchedulerNode => QueueAttr::ParentSchedulerNode(node.parent_id),
                QueueAttrId::WredProfile => QueueAttr::WredProfile(node.wred_id()),
                QueueAttrId::BufferProfile => QueueAttr::BufferProfile(node.buffer_profile_id),
                QueueAttrId::SchedulerProfile => QueueAttr::SchedulerProfile(node.scheduler_id),
            })
            .collect())
    }

    pub fn get_stats(&self, q: QueueOid, counters: &[QueueStat]) -> QosResult<Vec<u64>> {
        let db = self.ctx.lock();
        db.queue(q)?;
        Ok(self.ctx.npu().queue.queue_stats_get(q, counters)?)
    }

    pub fn clear_stats(&self, q: QueueOid, counters: &[QueueStat]) -> QosResult<()> {
        let db = self.ctx.lock();
        db.queue(q)?;
        Ok(self.ctx.npu().queue.queue_stats_clear(q, counters)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QosSwitchConfig;
    use crate::npu::NpuApiTable;
    use crate::port::PortQosNode;
    use crate::sched_group::{SchedGroupAttr, SchedGroupOrch};
    use crate::vm::VmQosNpu;
    use pretty_assertions::assert_eq;

    fn create_test_orch(config: QosSwitchConfig) -> (QueueOrch, PortOid) {
        let npu = NpuApiTable::from_backend(Arc::new(VmQosNpu::new(&config)));
        let ctx = QosContext::new(config, npu).unwrap();
        let port = PortOid::from_npu_id(1);
        ctx.lock().ports.insert(port, PortQosNode::new(port, false, 3)).unwrap();
        (QueueOrch::new(ctx), port)
    }

    fn uc_queue(orch: &mut QueueOrch, port: PortOid, index: u32) -> QueueOid {
        orch.create(&[
            QueueAttr::Type(QueueType::Unicast),
            QueueAttr::Port(port),
            QueueAttr::Index(index),
        ])
        .unwrap()
    }

    #[test]
    fn test_create_gets_default_scheduler() {
        let (mut orch, port) = create_test_orch(QosSwitchConfig::default());
        let q = uc_queue(&mut orch, port, 0);
        assert_eq!(
            orch.get_attribute(q, &[QueueAttrId::SchedulerProfile, QueueAttrId::Index])
                .unwrap(),
            vec![
                QueueAttr::SchedulerProfile(orch.ctx.default_scheduler()),
                QueueAttr::Index(0)
            ]
        );
    }

    #[test]
    fn test_index_out_of_range() {
        let (mut orch, port) = create_test_orch(QosSwitchConfig::default());
        let err = orch
            .create(&[
                QueueAttr::Type(QueueType::Unicast),
                QueueAttr::Port(port),
                QueueAttr::Index(8),
            ])
            .unwrap_err();
        assert!(matches!(err, QosError::InvalidAttrValue(_)));
        assert_eq!(orch.stats().create_failures, 1);
    }

    #[test]
    fn test_duplicate_index_rejected() {
        let (mut orch, port) = create_test_orch(QosSwitchConfig::default());
        uc_queue(&mut orch, port, 3);
        let err = orch
            .create(&[
                QueueAttr::Type(QueueType::Unicast),
                QueueAttr::Port(port),
                QueueAttr::Index(3),
            ])
            .unwrap_err();
        assert!(matches!(err, QosError::AlreadyExists(_)));
    }

    #[test]
    fn test_failed_configure_leaves_no_trace() {
        let (mut orch, port) = create_test_orch(QosSwitchConfig::default());
        let before = orch.ctx.snapshot();
        let err = orch
            .create(&[
                QueueAttr::Type(QueueType::Unicast),
                QueueAttr::Port(port),
                QueueAttr::Index(0),
                QueueAttr::WredProfile(WredOid::from_npu_id(99)),
            ])
            .unwrap_err();
        assert!(matches!(err, QosError::InvalidObjectId(_)));
        assert_eq!(orch.ctx.snapshot(), before);
    }

    #[test]
    fn test_reparent_and_remove() {
        let (mut orch, port) = create_test_orch(QosSwitchConfig::default());
        let mut groups = SchedGroupOrch::new(orch.ctx.clone());
        let a = groups
            .create(&[
                SchedGroupAttr::Port(port),
                SchedGroupAttr::Level(1),
                SchedGroupAttr::MaxChilds(4),
            ])
            .unwrap();
        let q = uc_queue(&mut orch, port, 0);

        orch.set_attribute(q, QueueAttr::ParentSchedulerNode(a)).unwrap();
        assert!(orch.ctx.lock().port(port).unwrap().is_app_hqos_init);
        assert!(matches!(groups.remove(a), Err(QosError::ObjectInUse(_))));

        orch.remove(q).unwrap();
        groups.remove(a).unwrap();
        let default = orch.ctx.default_scheduler();
        assert!(orch.ctx.lock().scheduler(default).unwrap().queues.is_empty());
    }

    #[test]
    fn test_create_only_attr_rejected_on_set() {
        let (mut orch, port) = create_test_orch(QosSwitchConfig::default());
        let q = uc_queue(&mut orch, port, 0);
        assert!(matches!(
            orch.set_attribute(q, QueueAttr::Index(2)),
            Err(QosError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_stats_zero_on_vm() {
        let (mut orch, port) = create_test_orch(QosSwitchConfig::default());
        let q = uc_queue(&mut orch, port, 0);
        assert_eq!(orch.get_stats(q, &[QueueStat::Packets, QueueStat::Bytes]).unwrap(), vec![0, 0]);
        orch.clear_stats(q, &[QueueStat::Packets]).unwrap();
    }
}
