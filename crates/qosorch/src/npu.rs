//! Hardware-facing backend contract.
//!
//! The QoS core never talks to hardware directly. Each entity table has a
//! trait here, and a backend implements all of them; [`NpuApiTable`]
//! bundles the implementations installed when the context is built.
//! Backends return [`SaiResult`] and keep no QoS graph state of their own.

use std::fmt;
use std::sync::Arc;

use sonic_sai::{
    BufferPoolOid, BufferProfileOid, IngressPriorityGroupOid, PolicerOid, PortOid, PortPoolOid,
    QosMapOid, QueueOid, SaiResult, SchedulerGroupOid, SchedulerOid, WredOid,
};
use sonic_types::{QosMapType, StormType};

use crate::buffer::{
    BufferPoolNode, BufferPoolStat, BufferProfileAttr, BufferProfileNode, BufferTarget, PgStat,
    PortPoolNode, PriorityGroupNode,
};
use crate::policer::{PolicerAttr, PolicerConfig};
use crate::qos_map::{QosMapAttr, QosMapNode};
use crate::queue::{QueueNode, QueueStat};
use crate::sched_group::SchedGroupNode;
use crate::scheduler::{SchedulerAttr, SchedulerConfig, SchedulerNode, SchedulerTarget};
use crate::wred::{WredAttr, WredConfig, WredLinkTarget, WredNode};

pub trait QueueNpuApi: Send + Sync {
    fn queue_create(&self, queue: &QueueNode) -> SaiResult<QueueOid>;
    fn queue_remove(&self, queue: &QueueNode) -> SaiResult<()>;
    fn queue_attach_to_parent(
        &self,
        queue: QueueOid,
        parent: SchedulerGroupOid,
        child_index: u32,
    ) -> SaiResult<()>;
    fn queue_detach_from_parent(&self, queue: QueueOid, parent: SchedulerGroupOid) -> SaiResult<()>;
    fn queue_modify_parent(
        &self,
        queue: QueueOid,
        new_parent: SchedulerGroupOid,
        child_index: u32,
    ) -> SaiResult<()>;
    fn queue_stats_get(&self, queue: QueueOid, counters: &[QueueStat]) -> SaiResult<Vec<u64>>;
    fn queue_stats_clear(&self, queue: QueueOid, counters: &[QueueStat]) -> SaiResult<()>;
}

pub trait SchedGroupNpuApi: Send + Sync {
    fn sched_group_create(&self, group: &SchedGroupNode) -> SaiResult<SchedulerGroupOid>;
    fn sched_group_remove(&self, group: &SchedGroupNode) -> SaiResult<()>;
    fn sched_group_attach_to_parent(
        &self,
        group: SchedulerGroupOid,
        parent: SchedulerGroupOid,
        child_index: u32,
    ) -> SaiResult<()>;
    fn sched_group_detach_from_parent(
        &self,
        group: SchedulerGroupOid,
        parent: SchedulerGroupOid,
    ) -> SaiResult<()>;
    fn sched_group_modify_parent(
        &self,
        group: SchedulerGroupOid,
        new_parent: SchedulerGroupOid,
        child_index: u32,
    ) -> SaiResult<()>;
}

pub trait SchedulerNpuApi: Send + Sync {
    fn scheduler_create(&self, config: &SchedulerConfig) -> SaiResult<SchedulerOid>;
    fn scheduler_remove(&self, scheduler: SchedulerOid) -> SaiResult<()>;
    fn scheduler_attribute_set(&self, scheduler: SchedulerOid, attr: &SchedulerAttr) -> SaiResult<()>;

    /// Moves `target` from `old` to `new`. Either side may be `None`.
    fn scheduler_set(
        &self,
        target: SchedulerTarget,
        old: Option<&SchedulerNode>,
        new: Option<&SchedulerNode>,
    ) -> SaiResult<()>;
}

pub trait BufferNpuApi: Send + Sync {
    fn buffer_pool_create(&self, pool: &BufferPoolNode) -> SaiResult<BufferPoolOid>;
    fn buffer_pool_remove(&self, pool: &BufferPoolNode) -> SaiResult<()>;
    fn buffer_pool_size_set(&self, pool: &BufferPoolNode, new_size: u64) -> SaiResult<()>;
    fn buffer_pool_stats_get(&self, pool: BufferPoolOid, counters: &[BufferPoolStat]) -> SaiResult<Vec<u64>>;
    fn buffer_pool_stats_clear(&self, pool: BufferPoolOid, counters: &[BufferPoolStat]) -> SaiResult<()>;

    fn buffer_profile_create(&self, profile: &BufferProfileNode) -> SaiResult<BufferProfileOid>;
    fn buffer_profile_remove(&self, profile: &BufferProfileNode) -> SaiResult<()>;
    fn buffer_profile_attribute_set(
        &self,
        profile: &BufferProfileNode,
        attr: &BufferProfileAttr,
    ) -> SaiResult<()>;

    /// Hardware-side admission check for `add_size` more bytes in `pool`.
    fn check_buffer_size(&self, pool: BufferPoolOid, profile: &BufferProfileNode, add_size: u64) -> SaiResult<()>;

    /// Programs `new` on `target` in place of `old`.
    fn apply_buffer_profile(
        &self,
        target: BufferTarget,
        old: Option<&BufferProfileNode>,
        new: Option<&BufferProfileNode>,
    ) -> SaiResult<()>;

    fn pg_create(&self, port: PortOid, index: u32) -> SaiResult<IngressPriorityGroupOid>;
    fn pg_remove(&self, pg: &PriorityGroupNode) -> SaiResult<()>;
    fn pg_stats_get(&self, pg: IngressPriorityGroupOid, counters: &[PgStat]) -> SaiResult<Vec<u64>>;
    fn pg_stats_clear(&self, pg: IngressPriorityGroupOid, counters: &[PgStat]) -> SaiResult<()>;

    fn port_pool_create(&self, port_pool: &PortPoolNode) -> SaiResult<PortPoolOid>;
    fn port_pool_remove(&self, port_pool: &PortPoolNode) -> SaiResult<()>;
}

pub trait WredNpuApi: Send + Sync {
    fn wred_create(&self, config: &WredConfig) -> SaiResult<WredOid>;
    fn wred_remove(&self, wred: WredOid) -> SaiResult<()>;
    fn wred_attribute_set(&self, wred: WredOid, attr: &WredAttr) -> SaiResult<()>;
    fn wred_link_set(&self, target: WredLinkTarget, wred: &WredNode) -> SaiResult<()>;
    fn wred_link_reset(&self, target: WredLinkTarget) -> SaiResult<()>;
}

pub trait QosMapNpuApi: Send + Sync {
    fn map_create(&self, map: &QosMapNode) -> SaiResult<QosMapOid>;
    fn map_remove(&self, map: QosMapOid) -> SaiResult<()>;
    fn map_attribute_set(&self, map: &QosMapNode, attr: &QosMapAttr) -> SaiResult<()>;

    /// Installs (`enable`) or withdraws `map` in the `map_type` slot of
    /// `port`. A null `map` with `enable` restores the default mapping.
    fn port_map_set(&self, port: PortOid, map: QosMapOid, map_type: QosMapType, enable: bool) -> SaiResult<()>;

    fn is_map_type_supported(&self, map_type: QosMapType) -> bool;
}

pub trait PolicerNpuApi: Send + Sync {
    fn policer_create(&self, config: &PolicerConfig) -> SaiResult<PolicerOid>;
    fn policer_remove(&self, policer: PolicerOid) -> SaiResult<()>;
    fn policer_attribute_set(&self, policer: PolicerOid, attr: &PolicerAttr) -> SaiResult<()>;

    /// Binds `policer` to the `storm_type` slot of `port`; null unbinds.
    fn storm_control_port_set(&self, port: PortOid, storm_type: StormType, policer: PolicerOid) -> SaiResult<()>;
}

pub trait PortQosNpuApi: Send + Sync {
    fn qos_port_init(&self, port: PortOid) -> SaiResult<()>;
    fn qos_port_deinit(&self, port: PortOid) -> SaiResult<()>;
}

/// Every backend trait implemented at once.
pub trait QosNpu:
    QueueNpuApi
    + SchedGroupNpuApi
    + SchedulerNpuApi
    + BufferNpuApi
    + WredNpuApi
    + QosMapNpuApi
    + PolicerNpuApi
    + PortQosNpuApi
{
}

impl<T> QosNpu for T where
    T: QueueNpuApi
        + SchedGroupNpuApi
        + SchedulerNpuApi
        + BufferNpuApi
        + WredNpuApi
        + QosMapNpuApi
        + PolicerNpuApi
        + PortQosNpuApi
{
}

/// The backend tables the core dispatches through.
#[derive(Clone)]
pub struct NpuApiTable {
    pub queue: Arc<dyn QueueNpuApi>,
    pub sched_group: Arc<dyn SchedGroupNpuApi>,
    pub scheduler: Arc<dyn SchedulerNpuApi>,
    pub buffer: Arc<dyn BufferNpuApi>,
    pub wred: Arc<dyn WredNpuApi>,
    pub qos_map: Arc<dyn QosMapNpuApi>,
    pub policer: Arc<dyn PolicerNpuApi>,
    pub port: Arc<dyn PortQosNpuApi>,
}

impl NpuApiTable {
    /// Installs one backend for every table.
    pub fn from_backend<T: QosNpu + 'static>(backend: Arc<T>) -> Self {
        Self {
            queue: backend.clone(),
            sched_group: backend.clone(),
            scheduler: backend.clone(),
            buffer: backend.clone(),
            wred: backend.clone(),
            qos_map: backend.clone(),
            policer: backend.clone(),
            port: backend,
        }
    }
}

impl fmt::Debug for NpuApiTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NpuApiTable").finish_non_exhaustive()
    }
}
