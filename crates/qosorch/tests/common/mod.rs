//! Shared fixtures for the QoS scenario tests.
//!
//! The harness runs the engine over the VM backend. The queue, scheduler,
//! buffer, WRED and QoS map tables are wrapped so tests can see the calls
//! the engine makes and make a chosen call fail.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use sonic_qosorch::buffer::{
    BufferPoolNode, BufferPoolStat, BufferProfileAttr, BufferProfileNode, BufferTarget, PgStat,
    PortPoolNode, PriorityGroupNode,
};
use sonic_qosorch::npu::{BufferNpuApi, QosMapNpuApi, QueueNpuApi, SchedulerNpuApi, WredNpuApi};
use sonic_qosorch::qos_map::{QosMapAttr, QosMapNode};
use sonic_qosorch::queue::{QueueNode, QueueStat};
use sonic_qosorch::scheduler::{SchedulerAttr, SchedulerConfig, SchedulerNode, SchedulerTarget};
use sonic_qosorch::wred::{WredAttr, WredConfig, WredLinkTarget, WredNode};
use sonic_qosorch::{
    BufferPoolOid, BufferProfileOid, IngressPriorityGroupOid, NpuApiTable, PortOid, PortPoolOid,
    PortQosOrch, QosContext, QosMapOid, QosMapType, QosSwitchConfig, QueueOid, SaiError, SaiResult,
    SchedulerGroupOid, SchedulerOid, VmQosNpu, WredOid,
};

/// Fails one call after letting a chosen number through.
#[derive(Default)]
pub struct FailPoint {
    fail_in: Mutex<Option<usize>>,
}

impl FailPoint {
    /// Lets `n` more calls through, then fails one.
    pub fn fail_after(&self, n: usize) {
        *self.fail_in.lock().unwrap() = Some(n);
    }

    fn hit(&self, call: &str) -> SaiResult<()> {
        let mut fail_in = self.fail_in.lock().unwrap();
        match *fail_in {
            Some(0) => {
                *fail_in = None;
                Err(SaiError::invalid_parameter(format!("injected {} failure", call)))
            }
            Some(n) => {
                *fail_in = Some(n - 1);
                Ok(())
            }
            None => Ok(()),
        }
    }
}

/// One `port_map_set` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortMapCall {
    pub port: PortOid,
    pub map: QosMapOid,
    pub map_type: QosMapType,
    pub enable: bool,
}

/// QoS map table that logs `port_map_set` and otherwise defers to the VM.
pub struct RecordingMapNpu {
    inner: Arc<VmQosNpu>,
    calls: Mutex<Vec<PortMapCall>>,
}

impl RecordingMapNpu {
    pub fn new(inner: Arc<VmQosNpu>) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<PortMapCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }
}

impl QosMapNpuApi for RecordingMapNpu {
    fn map_create(&self, map: &QosMapNode) -> SaiResult<QosMapOid> {
        self.inner.map_create(map)
    }

    fn map_remove(&self, map: QosMapOid) -> SaiResult<()> {
        self.inner.map_remove(map)
    }

    fn map_attribute_set(&self, map: &QosMapNode, attr: &QosMapAttr) -> SaiResult<()> {
        self.inner.map_attribute_set(map, attr)
    }

    fn port_map_set(&self, port: PortOid, map: QosMapOid, map_type: QosMapType, enable: bool) -> SaiResult<()> {
        self.calls.lock().unwrap().push(PortMapCall {
            port,
            map,
            map_type,
            enable,
        });
        self.inner.port_map_set(port, map, map_type, enable)
    }

    fn is_map_type_supported(&self, map_type: QosMapType) -> bool {
        self.inner.is_map_type_supported(map_type)
    }
}

/// One `scheduler_set` call: the target and the weight pushed to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerSetCall {
    pub target: SchedulerTarget,
    pub weight: Option<u32>,
}

/// Scheduler table that logs `scheduler_set` and can fail one call.
/// A failed call is not logged.
pub struct FaultySchedulerNpu {
    inner: Arc<VmQosNpu>,
    calls: Mutex<Vec<SchedulerSetCall>>,
    pub fault: FailPoint,
}

impl FaultySchedulerNpu {
    pub fn new(inner: Arc<VmQosNpu>) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
            fault: FailPoint::default(),
        }
    }

    pub fn fail_after(&self, n: usize) {
        self.fault.fail_after(n);
    }

    pub fn calls(&self) -> Vec<SchedulerSetCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }
}

impl SchedulerNpuApi for FaultySchedulerNpu {
    fn scheduler_create(&self, config: &SchedulerConfig) -> SaiResult<SchedulerOid> {
        self.inner.scheduler_create(config)
    }

    fn scheduler_remove(&self, scheduler: SchedulerOid) -> SaiResult<()> {
        self.inner.scheduler_remove(scheduler)
    }

    fn scheduler_attribute_set(&self, scheduler: SchedulerOid, attr: &SchedulerAttr) -> SaiResult<()> {
        self.inner.scheduler_attribute_set(scheduler, attr)
    }

    fn scheduler_set(
        &self,
        target: SchedulerTarget,
        old: Option<&SchedulerNode>,
        new: Option<&SchedulerNode>,
    ) -> SaiResult<()> {
        self.fault.hit("scheduler_set")?;
        self.calls.lock().unwrap().push(SchedulerSetCall {
            target,
            weight: new.map(|n| n.config.weight),
        });
        self.inner.scheduler_set(target, old, new)
    }
}

/// Queue table whose attach and modify-parent calls can fail.
pub struct FaultyQueueNpu {
    inner: Arc<VmQosNpu>,
    pub fault: FailPoint,
}

impl FaultyQueueNpu {
    pub fn new(inner: Arc<VmQosNpu>) -> Self {
        Self {
            inner,
            fault: FailPoint::default(),
        }
    }

    /// Lets `n` more parent changes through, then fails one.
    pub fn fail_after(&self, n: usize) {
        self.fault.fail_after(n);
    }
}

impl QueueNpuApi for FaultyQueueNpu {
    fn queue_create(&self, queue: &QueueNode) -> SaiResult<QueueOid> {
        self.inner.queue_create(queue)
    }

    fn queue_remove(&self, queue: &QueueNode) -> SaiResult<()> {
        self.inner.queue_remove(queue)
    }

    fn queue_attach_to_parent(&self, queue: QueueOid, parent: SchedulerGroupOid, child_index: u32) -> SaiResult<()> {
        self.fault.hit("queue_attach_to_parent")?;
        self.inner.queue_attach_to_parent(queue, parent, child_index)
    }

    fn queue_detach_from_parent(&self, queue: QueueOid, parent: SchedulerGroupOid) -> SaiResult<()> {
        self.inner.queue_detach_from_parent(queue, parent)
    }

    fn queue_modify_parent(&self, queue: QueueOid, new_parent: SchedulerGroupOid, child_index: u32) -> SaiResult<()> {
        self.fault.hit("queue_modify_parent")?;
        self.inner.queue_modify_parent(queue, new_parent, child_index)
    }

    fn queue_stats_get(&self, queue: QueueOid, counters: &[QueueStat]) -> SaiResult<Vec<u64>> {
        self.inner.queue_stats_get(queue, counters)
    }

    fn queue_stats_clear(&self, queue: QueueOid, counters: &[QueueStat]) -> SaiResult<()> {
        self.inner.queue_stats_clear(queue, counters)
    }
}

/// One `apply_buffer_profile` call: the target and the size of the
/// profile pushed to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileApplyCall {
    pub target: BufferTarget,
    pub size: Option<u64>,
}

/// Buffer table that logs `apply_buffer_profile` and can fail one call.
/// A failed call is not logged.
pub struct FaultyBufferNpu {
    inner: Arc<VmQosNpu>,
    calls: Mutex<Vec<ProfileApplyCall>>,
    pub fault: FailPoint,
}

impl FaultyBufferNpu {
    pub fn new(inner: Arc<VmQosNpu>) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
            fault: FailPoint::default(),
        }
    }

    pub fn fail_after(&self, n: usize) {
        self.fault.fail_after(n);
    }

    pub fn calls(&self) -> Vec<ProfileApplyCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }
}

impl BufferNpuApi for FaultyBufferNpu {
    fn buffer_pool_create(&self, pool: &BufferPoolNode) -> SaiResult<BufferPoolOid> {
        self.inner.buffer_pool_create(pool)
    }

    fn buffer_pool_remove(&self, pool: &BufferPoolNode) -> SaiResult<()> {
        self.inner.buffer_pool_remove(pool)
    }

    fn buffer_pool_size_set(&self, pool: &BufferPoolNode, new_size: u64) -> SaiResult<()> {
        self.inner.buffer_pool_size_set(pool, new_size)
    }

    fn buffer_pool_stats_get(&self, pool: BufferPoolOid, counters: &[BufferPoolStat]) -> SaiResult<Vec<u64>> {
        self.inner.buffer_pool_stats_get(pool, counters)
    }

    fn buffer_pool_stats_clear(&self, pool: BufferPoolOid, counters: &[BufferPoolStat]) -> SaiResult<()> {
        self.inner.buffer_pool_stats_clear(pool, counters)
    }

    fn buffer_profile_create(&self, profile: &BufferProfileNode) -> SaiResult<BufferProfileOid> {
        self.inner.buffer_profile_create(profile)
    }

    fn buffer_profile_remove(&self, profile: &BufferProfileNode) -> SaiResult<()> {
        self.inner.buffer_profile_remove(profile)
    }

    fn buffer_profile_attribute_set(&self, profile: &BufferProfileNode, attr: &BufferProfileAttr) -> SaiResult<()> {
        self.inner.buffer_profile_attribute_set(profile, attr)
    }

    fn check_buffer_size(&self, pool: BufferPoolOid, profile: &BufferProfileNode, add_size: u64) -> SaiResult<()> {
        self.inner.check_buffer_size(pool, profile, add_size)
    }

    fn apply_buffer_profile(
        &self,
        target: BufferTarget,
        old: Option<&BufferProfileNode>,
        new: Option<&BufferProfileNode>,
    ) -> SaiResult<()> {
        self.fault.hit("apply_buffer_profile")?;
        self.calls.lock().unwrap().push(ProfileApplyCall {
            target,
            size: new.map(|n| n.size),
        });
        self.inner.apply_buffer_profile(target, old, new)
    }

    fn pg_create(&self, port: PortOid, index: u32) -> SaiResult<IngressPriorityGroupOid> {
        self.inner.pg_create(port, index)
    }

    fn pg_remove(&self, pg: &PriorityGroupNode) -> SaiResult<()> {
        self.inner.pg_remove(pg)
    }

    fn pg_stats_get(&self, pg: IngressPriorityGroupOid, counters: &[PgStat]) -> SaiResult<Vec<u64>> {
        self.inner.pg_stats_get(pg, counters)
    }

    fn pg_stats_clear(&self, pg: IngressPriorityGroupOid, counters: &[PgStat]) -> SaiResult<()> {
        self.inner.pg_stats_clear(pg, counters)
    }

    fn port_pool_create(&self, port_pool: &PortPoolNode) -> SaiResult<PortPoolOid> {
        self.inner.port_pool_create(port_pool)
    }

    fn port_pool_remove(&self, port_pool: &PortPoolNode) -> SaiResult<()> {
        self.inner.port_pool_remove(port_pool)
    }
}

/// One `wred_link_set` call: the target and the weight pushed to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WredLinkCall {
    pub target: WredLinkTarget,
    pub weight: u8,
}

/// WRED table that logs `wred_link_set` and can fail one call.
/// A failed call is not logged.
pub struct FaultyWredNpu {
    inner: Arc<VmQosNpu>,
    calls: Mutex<Vec<WredLinkCall>>,
    pub fault: FailPoint,
}

impl FaultyWredNpu {
    pub fn new(inner: Arc<VmQosNpu>) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
            fault: FailPoint::default(),
        }
    }

    pub fn fail_after(&self, n: usize) {
        self.fault.fail_after(n);
    }

    pub fn calls(&self) -> Vec<WredLinkCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }
}

impl WredNpuApi for FaultyWredNpu {
    fn wred_create(&self, config: &WredConfig) -> SaiResult<WredOid> {
        self.inner.wred_create(config)
    }

    fn wred_remove(&self, wred: WredOid) -> SaiResult<()> {
        self.inner.wred_remove(wred)
    }

    fn wred_attribute_set(&self, wred: WredOid, attr: &WredAttr) -> SaiResult<()> {
        self.inner.wred_attribute_set(wred, attr)
    }

    fn wred_link_set(&self, target: WredLinkTarget, wred: &WredNode) -> SaiResult<()> {
        self.fault.hit("wred_link_set")?;
        self.calls.lock().unwrap().push(WredLinkCall {
            target,
            weight: wred.config.weight,
        });
        self.inner.wred_link_set(target, wred)
    }

    fn wred_link_reset(&self, target: WredLinkTarget) -> SaiResult<()> {
        self.inner.wred_link_reset(target)
    }
}

pub struct Harness {
    pub ctx: Arc<QosContext>,
    pub vm: Arc<VmQosNpu>,
    pub maps: Arc<RecordingMapNpu>,
    pub schedulers: Arc<FaultySchedulerNpu>,
    pub queues: Arc<FaultyQueueNpu>,
    pub buffers: Arc<FaultyBufferNpu>,
    pub wreds: Arc<FaultyWredNpu>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(QosSwitchConfig::default())
    }

    pub fn with_config(config: QosSwitchConfig) -> Self {
        let vm = Arc::new(VmQosNpu::new(&config));
        let maps = Arc::new(RecordingMapNpu::new(vm.clone()));
        let schedulers = Arc::new(FaultySchedulerNpu::new(vm.clone()));
        let queues = Arc::new(FaultyQueueNpu::new(vm.clone()));
        let buffers = Arc::new(FaultyBufferNpu::new(vm.clone()));
        let wreds = Arc::new(FaultyWredNpu::new(vm.clone()));

        let mut npu = NpuApiTable::from_backend(vm.clone());
        npu.qos_map = maps.clone();
        npu.scheduler = schedulers.clone();
        npu.queue = queues.clone();
        npu.buffer = buffers.clone();
        npu.wred = wreds.clone();

        Self {
            ctx: QosContext::new(config, npu).unwrap(),
            vm,
            maps,
            schedulers,
            queues,
            buffers,
            wreds,
        }
    }

    /// Brings up front-panel port `n`.
    pub fn port(&self, n: u64) -> PortOid {
        let port = PortOid::from_npu_id(n);
        PortQosOrch::new(self.ctx.clone()).port_init(port, false).unwrap();
        port
    }
}
