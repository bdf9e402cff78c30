//! PortQosOrch implementation.

use std::sync::Arc;

use serde_json::json;
use sonic_sai::{
    BufferProfileOid, PolicerOid, PortOid, QueueOid, SchedulerGroupOid, SchedulerOid,
};
use sonic_types::{QosMapType, QueueType, StormType};

use super::types::{PortQosAttr, PortQosAttrId, PortQosNode};
use crate::audit::{AuditCategory, AuditOutcome, AuditRecord};
use crate::buffer::{create_pg_node, profile_apply, remove_pg_node, remove_port_pool_node, BufferTarget};
use crate::context::QosContext;
use crate::db::QosDb;
use crate::error::{QosError, QosResult};
use crate::policer::policer_port_set;
use crate::qos_map::{map_remove, map_set};
use crate::queue::{configure_queue, create_queue_node, remove_queue_node, QueueConfig};
use crate::sched_group::{materialize, remove_group_node};
use crate::scheduler::{scheduler_apply, SchedulerTarget};
use crate::{audit_log, debug_log, info_log, warn_log};

/// Port QoS orchestrator statistics.
#[derive(Debug, Clone, Default)]
pub struct PortQosOrchStats {
    pub ports_initialized: u64,
    pub ports_deinitialized: u64,
    pub init_failures: u64,
}

// Queues a port starts with, as (type, count).
fn port_queue_plan(ctx: &QosContext, is_cpu: bool) -> Vec<(QueueType, u32)> {
    let config = ctx.config();
    if is_cpu {
        vec![(QueueType::All, config.cpu_port_queues)]
    } else if config.separate_uc_mc {
        vec![
            (QueueType::Unicast, config.max_uc_queues),
            (QueueType::Multicast, config.max_mc_queues),
        ]
    } else {
        vec![(QueueType::All, config.max_queues)]
    }
}

fn build_port(ctx: &QosContext, db: &mut QosDb, port: PortOid, is_cpu: bool) -> QosResult<()> {
    for (queue_type, count) in port_queue_plan(ctx, is_cpu) {
        for index in 0..count {
            create_queue_node(ctx, db, port, queue_type, index)?;
        }
    }
    if !is_cpu {
        for index in 0..ctx.config().num_pg {
            create_pg_node(ctx.npu(), db, port, index)?;
        }
    }

    let template = if is_cpu {
        ctx.cpu_template()
    } else {
        ctx.port_template()
    };
    materialize(ctx, db, port, template)?;

    let queues: Vec<QueueOid> = db.port(port)?.queues.iter().collect();
    for q in queues {
        configure_queue(ctx, db, q, QueueConfig::default())?;
    }
    Ok(())
}

// Releases everything hanging off the port, leaving an empty node.
fn clear_port(ctx: &QosContext, db: &mut QosDb, port: PortOid) -> QosResult<()> {
    let npu = ctx.npu();

    for map_type in QosMapType::ALL {
        map_remove(npu, db, port, map_type)?;
    }
    for storm_type in StormType::ALL {
        policer_port_set(npu, db, port, storm_type, PolicerOid::NULL)?;
    }
    scheduler_apply(npu, db, SchedulerTarget::Port(port), SchedulerOid::NULL)?;
    profile_apply(npu, db, BufferTarget::Port(port), BufferProfileOid::NULL)?;

    let queues: Vec<QueueOid> = db.port(port)?.queues.iter().collect();
    for q in queues {
        remove_queue_node(ctx, db, q)?;
    }

    // children sit one level below their parent
    let levels: Vec<Vec<SchedulerGroupOid>> = db
        .port(port)?
        .sched_groups
        .iter()
        .map(|l| l.iter().collect())
        .collect();
    for groups in levels.into_iter().rev() {
        for sg in groups {
            remove_group_node(ctx, db, sg)?;
        }
    }

    let pgs: Vec<_> = db.port(port)?.pgs.iter().collect();
    for pg in pgs {
        remove_pg_node(npu, db, pg)?;
    }
    let port_pools: Vec<_> = db.port(port)?.port_pools.iter().collect();
    for pp in port_pools {
        remove_port_pool_node(npu, db, pp)?;
    }
    Ok(())
}

/// Per-port QoS orchestrator: bring-up, teardown and the port's own
/// scheduler, map, policer and buffer profile slots.
pub struct PortQosOrch {
    ctx: Arc<QosContext>,
    stats: PortQosOrchStats,
}

impl std::fmt::Debug for PortQosOrch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortQosOrch")
            .field("stats", &self.stats)
            .finish()
    }
}

impl PortQosOrch {
    pub fn new(ctx: Arc<QosContext>) -> Self {
        Self {
            ctx,
            stats: PortQosOrchStats::default(),
        }
    }

    pub fn stats(&self) -> &PortQosOrchStats {
        &self.stats
    }

    /// Brings up QoS on `port`: its queues, priority groups (front-panel
    /// ports only) and scheduler hierarchy, with the switch default
    /// scheduler on every queue.
    ///
    /// A failure tears down whatever was built and leaves no port state.
    pub fn port_init(&mut self, port: PortOid, is_cpu: bool) -> QosResult<()> {
        let mut guard = self.ctx.lock();
        let db = &mut *guard;
        let npu = self.ctx.npu();
        let correlation = format!("port_init:{}", port);

        if db.ports.contains(&port) {
            return Err(QosError::AlreadyExists(format!("QoS already initialized on port {}", port)));
        }

        npu.port.qos_port_init(port)?;
        let levels = self.ctx.config().max_hierarchy_levels as usize;
        db.ports.insert(port, PortQosNode::new(port, is_cpu, levels))?;

        if let Err(e) = build_port(&self.ctx, db, port, is_cpu) {
            if let Err(cleanup) = self.discard_port(db, port) {
                warn_log!("PortQosOrch", port = %port, error = %cleanup, "cleanup after failed init");
            }
            self.stats.init_failures = self.stats.init_failures.saturating_add(1);
            audit_log!(AuditRecord::new(AuditCategory::PortLifecycle, "PortQosOrch", "port_init")
                .with_object_id(port.to_string())
                .with_object_type("port")
                .with_correlation_id(correlation)
                .with_error(e.to_string()));
            return Err(e);
        }

        let node = db.port(port)?;
        info_log!(
            "PortQosOrch",
            port = %port,
            cpu = is_cpu,
            queues = node.queues.len(),
            groups = node.sched_group_count(),
            pgs = node.pgs.len(),
            "port QoS initialized"
        );
        audit_log!(AuditRecord::new(AuditCategory::PortLifecycle, "PortQosOrch", "port_init")
            .with_outcome(AuditOutcome::Success)
            .with_object_id(port.to_string())
            .with_object_type("port")
            .with_correlation_id(correlation)
            .with_details(json!({
                "cpu": is_cpu,
                "queues": node.queues.len(),
                "sched_groups": node.sched_group_count(),
                "pgs": node.pgs.len(),
            })));
        self.stats.ports_initialized = self.stats.ports_initialized.saturating_add(1);
        Ok(())
    }

    fn discard_port(&self, db: &mut QosDb, port: PortOid) -> QosResult<()> {
        clear_port(&self.ctx, db, port)?;
        self.ctx.npu().port.qos_port_deinit(port)?;
        db.ports.remove(&port);
        Ok(())
    }

    /// Tears QoS down on `port` in reverse bring-up order: slots, queues,
    /// scheduler groups bottom-up, priority groups and port pools.
    pub fn port_deinit(&mut self, port: PortOid) -> QosResult<()> {
        let mut guard = self.ctx.lock();
        let db = &mut *guard;
        db.port(port)?;

        self.discard_port(db, port).inspect_err(|e| {
            audit_log!(AuditRecord::new(AuditCategory::PortLifecycle, "PortQosOrch", "port_deinit")
                .with_object_id(port.to_string())
                .with_object_type("port")
                .with_error(e.to_string()));
        })?;

        self.stats.ports_deinitialized = self.stats.ports_deinitialized.saturating_add(1);
        audit_log!(AuditRecord::new(AuditCategory::PortLifecycle, "PortQosOrch", "port_deinit")
            .with_outcome(AuditOutcome::Success)
            .with_object_id(port.to_string())
            .with_object_type("port"));
        Ok(())
    }

    pub fn set_attribute(&mut self, port: PortOid, attr: PortQosAttr) -> QosResult<()> {
        let mut guard = self.ctx.lock();
        let db = &mut *guard;
        let npu = self.ctx.npu();
        db.port(port)?;

        match attr {
            PortQosAttr::SchedulerProfile(s) => scheduler_apply(npu, db, SchedulerTarget::Port(port), s),
            PortQosAttr::QosMap(map_type, map) => map_set(npu, db, port, map_type, map),
            PortQosAttr::Policer(storm_type, policer) => policer_port_set(npu, db, port, storm_type, policer),
            PortQosAttr::BufferProfile(b) => profile_apply(npu, db, BufferTarget::Port(port), b),
            PortQosAttr::QueueList(_) | PortQosAttr::SchedulerGroupList(_) | PortQosAttr::PgList(_) => {
                Err(QosError::invalid_parameter("read-only attribute"))
            }
        }?;
        debug_log!("PortQosOrch", port = %port, attr = ?attr, "port attribute set");
        Ok(())
    }

    pub fn get_attribute(&self, port: PortOid, ids: &[PortQosAttrId]) -> QosResult<Vec<PortQosAttr>> {
        let db = self.ctx.lock();
        let node = db.port(port)?;
        Ok(ids
            .iter()
            .map(|a| match *a {
                PortQosAttrId::QueueList => PortQosAttr::QueueList(node.queues.iter().collect()),
                PortQosAttrId::SchedulerGroupList => {
                    PortQosAttr::SchedulerGroupList(node.sched_groups.iter().flat_map(|l| l.iter()).collect())
                }
                PortQosAttrId::PgList => PortQosAttr::PgList(node.pgs.iter().collect()),
                PortQosAttrId::SchedulerProfile => PortQosAttr::SchedulerProfile(node.scheduler_id),
                PortQosAttrId::QosMap(t) => PortQosAttr::QosMap(t, node.map(t)),
                PortQosAttrId::Policer(s) => PortQosAttr::Policer(s, node.policer(s)),
                PortQosAttrId::BufferProfile => PortQosAttr::BufferProfile(node.buffer_profile_id),
            })
            .collect())
    }

    /// Ports with QoS initialized.
    pub fn ports(&self) -> Vec<PortOid> {
        self.ctx.lock().ports.keys().copied().collect()
    }
}
