//! Simulation backend.
//!
//! [`VmQosNpu`] implements every backend table without hardware. Object
//! ids come from fixed-size first-fit bitmaps, buffer pools draw on a
//! per-direction byte budget of `max_buffer_size_kb`, and every counter
//! reads zero. It keeps no QoS graph state; hierarchy, scheduler and
//! profile programming calls simply succeed.

mod state;

use std::sync::{Mutex, MutexGuard};

use sonic_sai::uoid::{pg_npu_id_create, pool_npu_id_create, pool_spid_get};
use sonic_sai::{
    BufferPoolOid, BufferProfileOid, IngressPriorityGroupOid, PolicerOid, PortOid, PortPoolOid,
    QosMapOid, QueueOid, SaiError, SaiResult, SchedulerGroupOid, SchedulerOid, WredOid,
};
use sonic_types::{BufferPoolType, QosMapType, StormType};

use self::state::{alloc, free, VmState};
use crate::buffer::{
    BufferPoolNode, BufferPoolStat, BufferProfileAttr, BufferProfileNode, BufferTarget, PgStat,
    PortPoolNode, PriorityGroupNode,
};
use crate::config::QosSwitchConfig;
use crate::npu::{
    BufferNpuApi, PolicerNpuApi, PortQosNpuApi, QosMapNpuApi, QueueNpuApi, SchedGroupNpuApi,
    SchedulerNpuApi, WredNpuApi,
};
use crate::policer::{PolicerAttr, PolicerConfig};
use crate::qos_map::{QosMapAttr, QosMapNode};
use crate::queue::{QueueNode, QueueStat};
use crate::sched_group::SchedGroupNode;
use crate::scheduler::{SchedulerAttr, SchedulerConfig, SchedulerNode, SchedulerTarget};
use crate::debug_log;
use crate::wred::{WredAttr, WredConfig, WredLinkTarget, WredNode};

/// Map types the simulated switch can program.
const SUPPORTED_MAPS: [QosMapType; 9] = [
    QosMapType::Dot1pToTc,
    QosMapType::Dot1pToColor,
    QosMapType::DscpToTc,
    QosMapType::DscpToColor,
    QosMapType::TcToQueue,
    QosMapType::TcToPriorityGroup,
    QosMapType::PfcPriorityToQueue,
    QosMapType::TcAndColorToDot1p,
    QosMapType::TcAndColorToDscp,
];

/// Software-only QoS backend.
pub struct VmQosNpu {
    state: Mutex<VmState>,
}

impl VmQosNpu {
    pub fn new(config: &QosSwitchConfig) -> Self {
        Self {
            state: Mutex::new(VmState::new(config)),
        }
    }

    fn state(&self) -> MutexGuard<'_, VmState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Bytes of `pool_type` buffer memory not held by any pool.
    pub fn free_buffer_bytes(&self, pool_type: BufferPoolType) -> u64 {
        self.state().pools(pool_type).free_bytes
    }
}

impl std::fmt::Debug for VmQosNpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VmQosNpu").finish_non_exhaustive()
    }
}

impl QueueNpuApi for VmQosNpu {
    fn queue_create(&self, queue: &QueueNode) -> SaiResult<QueueOid> {
        let id = alloc(&mut self.state().queues, "queue")?;
        debug_log!("VmQosNpu", port = %queue.port_id, index = queue.queue_index, id, "queue allocated");
        Ok(QueueOid::from_npu_id(id as u64))
    }

    fn queue_remove(&self, queue: &QueueNode) -> SaiResult<()> {
        free(&mut self.state().queues, queue.queue_id.npu_id(), "queue")
    }

    fn queue_attach_to_parent(&self, _queue: QueueOid, _parent: SchedulerGroupOid, _child_index: u32) -> SaiResult<()> {
        Ok(())
    }

    fn queue_detach_from_parent(&self, _queue: QueueOid, _parent: SchedulerGroupOid) -> SaiResult<()> {
        Ok(())
    }

    fn queue_modify_parent(&self, _queue: QueueOid, _new_parent: SchedulerGroupOid, _child_index: u32) -> SaiResult<()> {
        Ok(())
    }

    fn queue_stats_get(&self, _queue: QueueOid, counters: &[QueueStat]) -> SaiResult<Vec<u64>> {
        Ok(vec![0; counters.len()])
    }

    fn queue_stats_clear(&self, _queue: QueueOid, _counters: &[QueueStat]) -> SaiResult<()> {
        Ok(())
    }
}

impl SchedGroupNpuApi for VmQosNpu {
    fn sched_group_create(&self, _group: &SchedGroupNode) -> SaiResult<SchedulerGroupOid> {
        let id = alloc(&mut self.state().sched_groups, "scheduler group")?;
        Ok(SchedulerGroupOid::from_npu_id(id as u64))
    }

    fn sched_group_remove(&self, group: &SchedGroupNode) -> SaiResult<()> {
        free(&mut self.state().sched_groups, group.sg_id.npu_id(), "scheduler group")
    }

    fn sched_group_attach_to_parent(
        &self,
        _group: SchedulerGroupOid,
        _parent: SchedulerGroupOid,
        _child_index: u32,
    ) -> SaiResult<()> {
        Ok(())
    }

    fn sched_group_detach_from_parent(&self, _group: SchedulerGroupOid, _parent: SchedulerGroupOid) -> SaiResult<()> {
        Ok(())
    }

    fn sched_group_modify_parent(
        &self,
        _group: SchedulerGroupOid,
        _new_parent: SchedulerGroupOid,
        _child_index: u32,
    ) -> SaiResult<()> {
        Ok(())
    }
}

impl SchedulerNpuApi for VmQosNpu {
    fn scheduler_create(&self, _config: &SchedulerConfig) -> SaiResult<SchedulerOid> {
        let id = alloc(&mut self.state().schedulers, "scheduler")?;
        Ok(SchedulerOid::from_npu_id(id as u64))
    }

    fn scheduler_remove(&self, scheduler: SchedulerOid) -> SaiResult<()> {
        free(&mut self.state().schedulers, scheduler.npu_id(), "scheduler")
    }

    fn scheduler_attribute_set(&self, _scheduler: SchedulerOid, _attr: &SchedulerAttr) -> SaiResult<()> {
        Ok(())
    }

    fn scheduler_set(
        &self,
        _target: SchedulerTarget,
        _old: Option<&SchedulerNode>,
        _new: Option<&SchedulerNode>,
    ) -> SaiResult<()> {
        Ok(())
    }
}

impl BufferNpuApi for VmQosNpu {
    fn buffer_pool_create(&self, pool: &BufferPoolNode) -> SaiResult<BufferPoolOid> {
        let spid = self.state().pools(pool.pool_type).create(pool.shared_size)?;
        let npu_id = pool_npu_id_create(pool.pool_type.as_u32(), spid);
        debug_log!("VmQosNpu", pool_type = %pool.pool_type, spid, shared_size = pool.shared_size, "pool allocated");
        Ok(BufferPoolOid::from_npu_id(npu_id))
    }

    fn buffer_pool_remove(&self, pool: &BufferPoolNode) -> SaiResult<()> {
        let spid = pool_spid_get(pool.pool_id.npu_id());
        self.state().pools(pool.pool_type).remove(spid)
    }

    fn buffer_pool_size_set(&self, pool: &BufferPoolNode, new_size: u64) -> SaiResult<()> {
        let new_shared = new_size
            .checked_add(pool.shared_size)
            .and_then(|total| total.checked_sub(pool.size))
            .ok_or_else(|| SaiError::insufficient_resources("pool smaller than its reservations"))?;
        let spid = pool_spid_get(pool.pool_id.npu_id());
        self.state()
            .pools(pool.pool_type)
            .update(spid, pool.shared_size, new_shared)
    }

    fn buffer_pool_stats_get(&self, _pool: BufferPoolOid, counters: &[BufferPoolStat]) -> SaiResult<Vec<u64>> {
        Ok(vec![0; counters.len()])
    }

    fn buffer_pool_stats_clear(&self, _pool: BufferPoolOid, _counters: &[BufferPoolStat]) -> SaiResult<()> {
        Ok(())
    }

    fn buffer_profile_create(&self, _profile: &BufferProfileNode) -> SaiResult<BufferProfileOid> {
        let id = alloc(&mut self.state().profiles, "buffer profile")?;
        Ok(BufferProfileOid::from_npu_id(id as u64))
    }

    fn buffer_profile_remove(&self, profile: &BufferProfileNode) -> SaiResult<()> {
        free(&mut self.state().profiles, profile.profile_id.npu_id(), "buffer profile")
    }

    fn buffer_profile_attribute_set(&self, _profile: &BufferProfileNode, _attr: &BufferProfileAttr) -> SaiResult<()> {
        Ok(())
    }

    fn check_buffer_size(&self, _pool: BufferPoolOid, _profile: &BufferProfileNode, _add_size: u64) -> SaiResult<()> {
        Ok(())
    }

    fn apply_buffer_profile(
        &self,
        _target: BufferTarget,
        _old: Option<&BufferProfileNode>,
        _new: Option<&BufferProfileNode>,
    ) -> SaiResult<()> {
        Ok(())
    }

    fn pg_create(&self, port: PortOid, index: u32) -> SaiResult<IngressPriorityGroupOid> {
        let local = u32::try_from(port.npu_id())
            .map_err(|_| SaiError::invalid_parameter(format!("port {} has no local number", port)))?;
        Ok(IngressPriorityGroupOid::from_npu_id(pg_npu_id_create(local, index)))
    }

    fn pg_remove(&self, _pg: &PriorityGroupNode) -> SaiResult<()> {
        Ok(())
    }

    fn pg_stats_get(&self, _pg: IngressPriorityGroupOid, counters: &[PgStat]) -> SaiResult<Vec<u64>> {
        Ok(vec![0; counters.len()])
    }

    fn pg_stats_clear(&self, _pg: IngressPriorityGroupOid, _counters: &[PgStat]) -> SaiResult<()> {
        Ok(())
    }

    fn port_pool_create(&self, _port_pool: &PortPoolNode) -> SaiResult<PortPoolOid> {
        let id = alloc(&mut self.state().port_pools, "port pool")?;
        Ok(PortPoolOid::from_npu_id(id as u64))
    }

    fn port_pool_remove(&self, port_pool: &PortPoolNode) -> SaiResult<()> {
        free(&mut self.state().port_pools, port_pool.port_pool_id.npu_id(), "port pool")
    }
}

impl WredNpuApi for VmQosNpu {
    fn wred_create(&self, _config: &WredConfig) -> SaiResult<WredOid> {
        let id = alloc(&mut self.state().wreds, "wred")?;
        Ok(WredOid::from_npu_id(id as u64))
    }

    fn wred_remove(&self, wred: WredOid) -> SaiResult<()> {
        free(&mut self.state().wreds, wred.npu_id(), "wred")
    }

    fn wred_attribute_set(&self, _wred: WredOid, _attr: &WredAttr) -> SaiResult<()> {
        Ok(())
    }

    fn wred_link_set(&self, _target: WredLinkTarget, _wred: &WredNode) -> SaiResult<()> {
        Ok(())
    }

    fn wred_link_reset(&self, _target: WredLinkTarget) -> SaiResult<()> {
        Ok(())
    }
}

impl QosMapNpuApi for VmQosNpu {
    fn map_create(&self, map: &QosMapNode) -> SaiResult<QosMapOid> {
        if !self.is_map_type_supported(map.map_type) {
            return Err(SaiError::not_supported(format!("map type {}", map.map_type)));
        }
        let id = alloc(&mut self.state().maps, "qos map")?;
        Ok(QosMapOid::from_npu_id(id as u64))
    }

    fn map_remove(&self, map: QosMapOid) -> SaiResult<()> {
        free(&mut self.state().maps, map.npu_id(), "qos map")
    }

    fn map_attribute_set(&self, _map: &QosMapNode, _attr: &QosMapAttr) -> SaiResult<()> {
        Ok(())
    }

    fn port_map_set(&self, _port: PortOid, _map: QosMapOid, _map_type: QosMapType, _enable: bool) -> SaiResult<()> {
        Ok(())
    }

    fn is_map_type_supported(&self, map_type: QosMapType) -> bool {
        SUPPORTED_MAPS.contains(&map_type)
    }
}

impl PolicerNpuApi for VmQosNpu {
    fn policer_create(&self, _config: &PolicerConfig) -> SaiResult<PolicerOid> {
        let id = alloc(&mut self.state().policers, "policer")?;
        Ok(PolicerOid::from_npu_id(id as u64))
    }

    fn policer_remove(&self, policer: PolicerOid) -> SaiResult<()> {
        free(&mut self.state().policers, policer.npu_id(), "policer")
    }

    fn policer_attribute_set(&self, _policer: PolicerOid, _attr: &PolicerAttr) -> SaiResult<()> {
        Ok(())
    }

    fn storm_control_port_set(&self, _port: PortOid, _storm_type: StormType, _policer: PolicerOid) -> SaiResult<()> {
        Ok(())
    }
}

impl PortQosNpuApi for VmQosNpu {
    fn qos_port_init(&self, _port: PortOid) -> SaiResult<()> {
        Ok(())
    }

    fn qos_port_deinit(&self, _port: PortOid) -> SaiResult<()> {
        Ok(())
    }
}
