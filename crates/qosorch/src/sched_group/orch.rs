//! SchedGroupOrch implementation.

use std::sync::Arc;

use sonic_sai::{PortOid, SchedulerGroupOid, SchedulerOid};
use sonic_types::SchedulingType;

use super::hierarchy::{self, HierarchyChild};
use super::types::{SchedGroupAttr, SchedGroupAttrId, SchedGroupNode};
use crate::audit::{AuditCategory, AuditOutcome, AuditRecord};
use crate::context::QosContext;
use crate::db::QosDb;
use crate::error::{QosError, QosResult};
use crate::scheduler::{scheduler_apply, SchedulerTarget};
use crate::{audit_log, debug_log, info_log, warn_log};

/// Scheduler group orchestrator statistics.
#[derive(Debug, Clone, Default)]
pub struct SchedGroupOrchStats {
    pub groups_created: u64,
    pub groups_removed: u64,
    pub reparents: u64,
    pub reparents_rejected: u64,
}

/// Creates an unattached group on `port` at `level` and links it into the
/// port's per-level list.
pub(crate) fn create_group_node(
    ctx: &QosContext,
    db: &mut QosDb,
    port: PortOid,
    level: u32,
    max_childs: u32,
    sched_mode: SchedulingType,
) -> QosResult<SchedulerGroupOid> {
    let limit = ctx.config().max_childs_per_hierarchy_node;
    if max_childs == 0 || max_childs > limit {
        return Err(QosError::invalid_attr_value(format!(
            "max_childs {} outside 1..={}",
            max_childs, limit
        )));
    }
    let levels = db
        .ports
        .get(&port)
        .ok_or(QosError::InvalidObjectId(port.as_raw()))?
        .sched_groups
        .len();
    if level as usize >= levels {
        return Err(QosError::invalid_attr_value(format!(
            "level {} but port {} has {} hierarchy levels",
            level, port, levels
        )));
    }

    let mut node = SchedGroupNode::new(port, level, max_childs);
    node.sched_mode = sched_mode;
    let sg = ctx.npu().sched_group.sched_group_create(&node)?;
    node.sg_id = sg;

    db.sched_groups.insert(sg, node)?;
    db.port_mut(port)?.sched_groups[level as usize].link_back(sg)?;

    debug_log!("SchedGroupOrch", group = %sg, port = %port, level, max_childs, "scheduler group created");
    Ok(sg)
}

/// Removes a childless group: drops its scheduler, detaches it from its
/// parent and frees it in the backend.
pub(crate) fn remove_group_node(ctx: &QosContext, db: &mut QosDb, sg: SchedulerGroupOid) -> QosResult<()> {
    let node = db.sched_group(sg)?;
    if node.child_count > 0 {
        return Err(QosError::object_in_use(format!(
            "scheduler group {} has {} children",
            sg, node.child_count
        )));
    }

    let npu = ctx.npu();
    scheduler_apply(npu, db, SchedulerTarget::Group(sg), SchedulerOid::NULL)?;
    hierarchy::detach(npu, db, HierarchyChild::Group(sg))?;

    npu.sched_group.sched_group_remove(db.sched_group(sg)?)?;

    let (port, level) = {
        let node = db.sched_group(sg)?;
        (node.port_id, node.level as usize)
    };
    if let Some(list) = db.port_mut(port)?.sched_groups.get_mut(level) {
        list.unlink(&sg)?;
    }
    db.sched_groups.remove(&sg);
    Ok(())
}

/// Re-parents a queue or group on behalf of the application.
///
/// Refused on switches with a fixed hierarchy. The first successful
/// re-parenting marks the port's hierarchy as application-managed.
pub(crate) fn app_modify_parent(
    ctx: &QosContext,
    db: &mut QosDb,
    child: HierarchyChild,
    new_parent: SchedulerGroupOid,
) -> QosResult<()> {
    if ctx.config().hierarchy_fixed {
        return Err(QosError::not_supported("hierarchy is fixed on this switch"));
    }
    if !new_parent.is_null() && !db.sched_groups.contains(&new_parent) {
        return Err(QosError::InvalidObjectId(new_parent.as_raw()));
    }

    let port = match child {
        HierarchyChild::Queue(q) => db.queue(q)?.port_id,
        HierarchyChild::Group(g) => db.sched_group(g)?.port_id,
    };
    hierarchy::modify_parent(ctx.npu(), db, child, new_parent)?;

    let port_node = db.port_mut(port)?;
    if !port_node.is_app_hqos_init {
        port_node.is_app_hqos_init = true;
        info_log!("SchedGroupOrch", port = %port, "hierarchy now managed by application");
    }
    Ok(())
}

#[derive(Default)]
struct CreateRequest {
    port: Option<PortOid>,
    level: Option<u32>,
    max_childs: Option<u32>,
    scheduler: SchedulerOid,
    parent: SchedulerGroupOid,
}

impl CreateRequest {
    fn parse(attrs: &[SchedGroupAttr]) -> QosResult<Self> {
        let mut req = CreateRequest::default();
        for (i, attr) in attrs.iter().enumerate() {
            match attr {
                SchedGroupAttr::Port(p) => req.port = Some(*p),
                SchedGroupAttr::Level(l) => req.level = Some(*l),
                SchedGroupAttr::MaxChilds(m) => req.max_childs = Some(*m),
                SchedGroupAttr::SchedulerProfile(s) => req.scheduler = *s,
                SchedGroupAttr::ParentNode(p) => req.parent = *p,
                SchedGroupAttr::ChildCount(_) | SchedGroupAttr::ChildList(_) => {
                    return Err(QosError::invalid_parameter("read-only attribute").at_index(i));
                }
            }
        }
        Ok(req)
    }
}

/// Scheduler group orchestrator.
pub struct SchedGroupOrch {
    ctx: Arc<QosContext>,
    stats: SchedGroupOrchStats,
}

impl std::fmt::Debug for SchedGroupOrch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchedGroupOrch")
            .field("stats", &self.stats)
            .finish()
    }
}

impl SchedGroupOrch {
    pub fn new(ctx: Arc<QosContext>) -> Self {
        Self {
            ctx,
            stats: SchedGroupOrchStats::default(),
        }
    }

    pub fn stats(&self) -> &SchedGroupOrchStats {
        &self.stats
    }

    /// Creates a scheduler group. Port, level and max_childs are
    /// mandatory; a scheduler profile and a parent are optional.
    pub fn create(&mut self, attrs: &[SchedGroupAttr]) -> QosResult<SchedulerGroupOid> {
        let req = CreateRequest::parse(attrs)?;
        let port = req
            .port
            .ok_or_else(|| QosError::invalid_parameter("missing scheduler group port"))?;
        let level = req
            .level
            .ok_or_else(|| QosError::invalid_parameter("missing scheduler group level"))?;
        let max_childs = req
            .max_childs
            .ok_or_else(|| QosError::invalid_parameter("missing scheduler group max_childs"))?;

        let mut guard = self.ctx.lock();
        let db = &mut *guard;

        let sg = create_group_node(&self.ctx, db, port, level, max_childs, SchedulingType::default())
            .inspect_err(|e| {
                audit_log!(AuditRecord::new(AuditCategory::ResourceCreate, "SchedGroupOrch", "create_sched_group")
                    .with_object_type("scheduler_group")
                    .with_error(e.to_string()));
            })?;

        let configured = scheduler_apply(self.ctx.npu(), db, SchedulerTarget::Group(sg), req.scheduler)
            .and_then(|_| {
                if req.parent.is_null() {
                    Ok(())
                } else {
                    hierarchy::attach(self.ctx.npu(), db, HierarchyChild::Group(sg), req.parent).map(|_| ())
                }
            });
        if let Err(e) = configured {
            if let Err(cleanup) = remove_group_node(&self.ctx, db, sg) {
                warn_log!("SchedGroupOrch", group = %sg, error = %cleanup, "cleanup after failed create");
            }
            audit_log!(AuditRecord::new(AuditCategory::ResourceCreate, "SchedGroupOrch", "create_sched_group")
                .with_object_id(sg.to_string())
                .with_object_type("scheduler_group")
                .with_error(e.to_string()));
            return Err(e);
        }

        self.stats.groups_created = self.stats.groups_created.saturating_add(1);
        audit_log!(AuditRecord::new(AuditCategory::ResourceCreate, "SchedGroupOrch", "create_sched_group")
            .with_outcome(AuditOutcome::Success)
            .with_object_id(sg.to_string())
            .with_object_type("scheduler_group")
            .with_details(serde_json::json!({
                "port": port,
                "level": level,
                "max_childs": max_childs,
                "parent": req.parent,
            })));
        Ok(sg)
    }

    /// Removes a scheduler group; fails with `ObjectInUse` while it still
    /// has children.
    pub fn remove(&mut self, sg: SchedulerGroupOid) -> QosResult<()> {
        let mut guard = self.ctx.lock();
        remove_group_node(&self.ctx, &mut guard, sg).inspect_err(|e| {
            audit_log!(AuditRecord::new(AuditCategory::ResourceDelete, "SchedGroupOrch", "remove_sched_group")
                .with_object_id(sg.to_string())
                .with_object_type("scheduler_group")
                .with_error(e.to_string()));
        })?;

        self.stats.groups_removed = self.stats.groups_removed.saturating_add(1);
        audit_log!(AuditRecord::new(AuditCategory::ResourceDelete, "SchedGroupOrch", "remove_sched_group")
            .with_outcome(AuditOutcome::Success)
            .with_object_id(sg.to_string())
            .with_object_type("scheduler_group"));
        Ok(())
    }

    pub fn set_attribute(&mut self, sg: SchedulerGroupOid, attr: SchedGroupAttr) -> QosResult<()> {
        let mut guard = self.ctx.lock();
        let db = &mut *guard;
        db.sched_group(sg)?;

        match attr {
            SchedGroupAttr::SchedulerProfile(s) => {
                scheduler_apply(self.ctx.npu(), db, SchedulerTarget::Group(sg), s)
            }
            SchedGroupAttr::ParentNode(parent) => {
                let old = db.sched_group(sg)?.parent_id;
                if let Err(e) = app_modify_parent(&self.ctx, db, HierarchyChild::Group(sg), parent) {
                    self.stats.reparents_rejected = self.stats.reparents_rejected.saturating_add(1);
                    audit_log!(AuditRecord::new(AuditCategory::HierarchyChange, "SchedGroupOrch", "modify_parent")
                        .with_object_id(sg.to_string())
                        .with_object_type("scheduler_group")
                        .with_error(e.to_string()));
                    return Err(e);
                }
                self.stats.reparents = self.stats.reparents.saturating_add(1);
                audit_log!(AuditRecord::new(AuditCategory::HierarchyChange, "SchedGroupOrch", "modify_parent")
                    .with_outcome(AuditOutcome::Success)
                    .with_object_id(sg.to_string())
                    .with_object_type("scheduler_group")
                    .with_details(serde_json::json!({ "old_parent": old, "new_parent": parent })));
                Ok(())
            }
            other => Err(QosError::invalid_parameter(format!(
                "{:?} cannot be changed after create",
                other.id()
            ))),
        }
    }

    pub fn get_attribute(&self, sg: SchedulerGroupOid, ids: &[SchedGroupAttrId]) -> QosResult<Vec<SchedGroupAttr>> {
        let db = self.ctx.lock();
        let node = db.sched_group(sg)?;
        Ok(ids
            .iter()
            .map(|id| match id {
                SchedGroupAttrId::ChildCount => SchedGroupAttr::ChildCount(node.child_count),
                SchedGroupAttrId::ChildList => SchedGroupAttr::ChildList(node.children.to_vec()),
                SchedGroupAttrId::Port => SchedGroupAttr::Port(node.port_id),
                SchedGroupAttrId::Level => SchedGroupAttr::Level(node.level),
                SchedGroupAttrId::MaxChilds => SchedGroupAttr::MaxChilds(node.max_childs),
                SchedGroupAttrId::SchedulerProfile => SchedGroupAttr::SchedulerProfile(node.scheduler_id),
                SchedGroupAttrId::ParentNode => SchedGroupAttr::ParentNode(node.parent_id),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QosSwitchConfig;
    use crate::npu::NpuApiTable;
    use crate::port::PortQosNode;
    use crate::vm::VmQosNpu;
    use pretty_assertions::assert_eq;

    fn create_test_orch(config: QosSwitchConfig) -> (SchedGroupOrch, PortOid) {
        let npu = NpuApiTable::from_backend(Arc::new(VmQosNpu::new(&config)));
        let ctx = QosContext::new(config, npu).unwrap();
        let port = PortOid::from_npu_id(1);
        ctx.lock().ports.insert(port, PortQosNode::new(port, false, 3)).unwrap();
        (SchedGroupOrch::new(ctx), port)
    }

    fn group(orch: &mut SchedGroupOrch, port: PortOid, level: u32, parent: SchedulerGroupOid) -> SchedulerGroupOid {
        orch.create(&[
            SchedGroupAttr::Port(port),
            SchedGroupAttr::Level(level),
            SchedGroupAttr::MaxChilds(4),
            SchedGroupAttr::ParentNode(parent),
        ])
        .unwrap()
    }

    #[test]
    fn test_create_under_parent() {
        let (mut orch, port) = create_test_orch(QosSwitchConfig::default());
        let root = group(&mut orch, port, 0, SchedulerGroupOid::NULL);
        let leaf = group(&mut orch, port, 1, root);

        let attrs = orch
            .get_attribute(root, &[SchedGroupAttrId::ChildCount, SchedGroupAttrId::ChildList])
            .unwrap();
        assert_eq!(
            attrs,
            vec![
                SchedGroupAttr::ChildCount(1),
                SchedGroupAttr::ChildList(vec![HierarchyChild::Group(leaf)])
            ]
        );
        assert_eq!(
            orch.get_attribute(leaf, &[SchedGroupAttrId::ParentNode]).unwrap(),
            vec![SchedGroupAttr::ParentNode(root)]
        );
    }

    #[test]
    fn test_create_missing_port_attr() {
        let (mut orch, _) = create_test_orch(QosSwitchConfig::default());
        let err = orch
            .create(&[SchedGroupAttr::Level(0), SchedGroupAttr::MaxChilds(2)])
            .unwrap_err();
        assert!(matches!(err, QosError::InvalidParameter(_)));
    }

    #[test]
    fn test_read_only_attr_rejected_with_index() {
        let (mut orch, port) = create_test_orch(QosSwitchConfig::default());
        let err = orch
            .create(&[SchedGroupAttr::Port(port), SchedGroupAttr::ChildCount(3)])
            .unwrap_err();
        assert!(matches!(err, QosError::Attribute { index: 1, .. }));
    }

    #[test]
    fn test_failed_parent_attach_rolls_back_create() {
        let (mut orch, port) = create_test_orch(QosSwitchConfig::default());
        let leaf = group(&mut orch, port, 1, SchedulerGroupOid::NULL);
        let before = orch.ctx.snapshot();

        // parent at a deeper level than the child
        let err = orch
            .create(&[
                SchedGroupAttr::Port(port),
                SchedGroupAttr::Level(0),
                SchedGroupAttr::MaxChilds(2),
                SchedGroupAttr::ParentNode(leaf),
            ])
            .unwrap_err();
        assert!(matches!(err, QosError::InvalidParameter(_)));
        assert_eq!(orch.ctx.snapshot(), before);
    }

    #[test]
    fn test_remove_with_children_in_use() {
        let (mut orch, port) = create_test_orch(QosSwitchConfig::default());
        let root = group(&mut orch, port, 0, SchedulerGroupOid::NULL);
        let leaf = group(&mut orch, port, 1, root);

        assert!(matches!(orch.remove(root), Err(QosError::ObjectInUse(_))));
        orch.remove(leaf).unwrap();
        orch.remove(root).unwrap();
        assert_eq!(orch.stats().groups_removed, 2);
        assert!(orch.ctx.lock().port(port).unwrap().sched_groups.iter().all(|l| l.is_empty()));
    }

    #[test]
    fn test_reparent_marks_port() {
        let (mut orch, port) = create_test_orch(QosSwitchConfig::default());
        let a = group(&mut orch, port, 0, SchedulerGroupOid::NULL);
        let b = group(&mut orch, port, 0, SchedulerGroupOid::NULL);
        let leaf = group(&mut orch, port, 1, a);

        orch.set_attribute(leaf, SchedGroupAttr::ParentNode(b)).unwrap();
        let db = orch.ctx.snapshot();
        assert_eq!(db.sched_group(a).unwrap().child_count, 0);
        assert_eq!(db.sched_group(b).unwrap().child_count, 1);
        assert!(db.port(port).unwrap().is_app_hqos_init);
    }

    #[test]
    fn test_reparent_refused_on_fixed_hierarchy() {
        let (mut orch, port) = create_test_orch(QosSwitchConfig {
            hierarchy_fixed: true,
            ..Default::default()
        });
        let a = group(&mut orch, port, 0, SchedulerGroupOid::NULL);
        let b = group(&mut orch, port, 0, SchedulerGroupOid::NULL);
        let leaf = group(&mut orch, port, 1, a);

        assert!(matches!(
            orch.set_attribute(leaf, SchedGroupAttr::ParentNode(b)),
            Err(QosError::NotSupported(_))
        ));
        assert_eq!(orch.stats().reparents_rejected, 1);
    }

    #[test]
    fn test_create_only_attr_not_settable() {
        let (mut orch, port) = create_test_orch(QosSwitchConfig::default());
        let sg = group(&mut orch, port, 0, SchedulerGroupOid::NULL);
        assert!(orch.set_attribute(sg, SchedGroupAttr::Level(1)).is_err());
    }
}
