//! The QoS object graph.
//!
//! One ordered store per entity type. Relationships live on the nodes as
//! `IdList`s of handles; nothing here talks to the backend. The whole graph
//! is `Clone + PartialEq`, so a snapshot taken before an operation can be
//! compared with the state after a failed one.

use serde_json::json;
use sonic_orch_common::ObjectStore;
use sonic_sai::{
    BufferPoolOid, BufferProfileOid, IngressPriorityGroupOid, PolicerOid, PortOid, PortPoolOid,
    QosMapOid, QueueOid, SchedulerGroupOid, SchedulerOid, WredOid,
};
use sonic_types::QueueType;

use crate::buffer::{BufferPoolNode, BufferProfileNode, PortPoolNode, PriorityGroupNode};
use crate::error::{QosError, QosResult};
use crate::policer::PolicerNode;
use crate::port::PortQosNode;
use crate::qos_map::QosMapNode;
use crate::queue::QueueNode;
use crate::sched_group::SchedGroupNode;
use crate::scheduler::SchedulerNode;
use crate::wred::WredNode;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QosDb {
    pub ports: ObjectStore<PortOid, PortQosNode>,
    pub queues: ObjectStore<QueueOid, QueueNode>,
    pub sched_groups: ObjectStore<SchedulerGroupOid, SchedGroupNode>,
    pub schedulers: ObjectStore<SchedulerOid, SchedulerNode>,
    pub policers: ObjectStore<PolicerOid, PolicerNode>,
    pub maps: ObjectStore<QosMapOid, QosMapNode>,
    pub wreds: ObjectStore<WredOid, WredNode>,
    pub pools: ObjectStore<BufferPoolOid, BufferPoolNode>,
    pub profiles: ObjectStore<BufferProfileOid, BufferProfileNode>,
    pub pgs: ObjectStore<IngressPriorityGroupOid, PriorityGroupNode>,
    pub port_pools: ObjectStore<PortPoolOid, PortPoolNode>,
}

macro_rules! node_accessors {
    ($($store:ident, $get:ident, $get_mut:ident, $oid:ty, $node:ty, $kind:literal;)*) => {
        $(
            pub fn $get(&self, id: $oid) -> QosResult<&$node> {
                self.$store
                    .get(&id)
                    .ok_or(QosError::NotFound { kind: $kind, id: id.as_raw() })
            }

            pub fn $get_mut(&mut self, id: $oid) -> QosResult<&mut $node> {
                self.$store
                    .get_mut(&id)
                    .ok_or(QosError::NotFound { kind: $kind, id: id.as_raw() })
            }
        )*
    };
}

impl QosDb {
    pub fn new() -> Self {
        Self::default()
    }

    node_accessors! {
        ports, port, port_mut, PortOid, PortQosNode, "port";
        queues, queue, queue_mut, QueueOid, QueueNode, "queue";
        sched_groups, sched_group, sched_group_mut, SchedulerGroupOid, SchedGroupNode, "scheduler group";
        schedulers, scheduler, scheduler_mut, SchedulerOid, SchedulerNode, "scheduler";
        policers, policer, policer_mut, PolicerOid, PolicerNode, "policer";
        maps, map, map_mut, QosMapOid, QosMapNode, "qos map";
        wreds, wred, wred_mut, WredOid, WredNode, "wred";
        pools, pool, pool_mut, BufferPoolOid, BufferPoolNode, "buffer pool";
        profiles, profile, profile_mut, BufferProfileOid, BufferProfileNode, "buffer profile";
        pgs, pg, pg_mut, IngressPriorityGroupOid, PriorityGroupNode, "priority group";
        port_pools, port_pool, port_pool_mut, PortPoolOid, PortPoolNode, "port pool";
    }

    /// Finds the queue of `port` with the given type and index.
    pub fn find_port_queue(&self, port: PortOid, queue_type: QueueType, index: u32) -> Option<QueueOid> {
        let node = self.ports.get(&port)?;
        node.queues.iter().find(|q| {
            self.queues
                .get(q)
                .is_some_and(|n| n.queue_type == queue_type && n.queue_index == index)
        })
    }

    /// Returns the port pool of `port` built on `pool`.
    pub fn find_port_pool(&self, port: PortOid, pool: BufferPoolOid) -> Option<PortPoolOid> {
        let node = self.ports.get(&port)?;
        node.port_pools
            .iter()
            .find(|pp| self.port_pools.get(pp).is_some_and(|n| n.pool_id == pool))
    }

    /// Object counts plus per-port and per-pool detail, for dumps.
    pub fn summary(&self) -> serde_json::Value {
        let ports: Vec<serde_json::Value> = self
            .ports
            .values()
            .map(|p| {
                json!({
                    "port": p.port_id,
                    "cpu": p.is_cpu,
                    "queues": p.queues.len(),
                    "sched_groups": p.sched_groups.iter().map(|l| l.len()).collect::<Vec<_>>(),
                    "pgs": p.pgs.len(),
                    "app_hqos": p.is_app_hqos_init,
                })
            })
            .collect();
        let pools: Vec<serde_json::Value> = self
            .pools
            .values()
            .map(|p| {
                json!({
                    "pool": p.pool_id,
                    "type": p.pool_type,
                    "size": p.size,
                    "shared_size": p.shared_size,
                    "xoff_size": p.xoff_size,
                    "profiles": p.profiles.len(),
                })
            })
            .collect();

        json!({
            "counts": {
                "ports": self.ports.len(),
                "queues": self.queues.len(),
                "sched_groups": self.sched_groups.len(),
                "schedulers": self.schedulers.len(),
                "policers": self.policers.len(),
                "maps": self.maps.len(),
                "wreds": self.wreds.len(),
                "buffer_pools": self.pools.len(),
                "buffer_profiles": self.profiles.len(),
                "pgs": self.pgs.len(),
                "port_pools": self.port_pools.len(),
            },
            "ports": ports,
            "pools": pools,
        })
    }
}
