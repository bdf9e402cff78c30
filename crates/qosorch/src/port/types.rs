//! Port QoS node and attributes.

use serde::Serialize;
use sonic_orch_common::IdList;
use sonic_sai::{
    BufferProfileOid, IngressPriorityGroupOid, PolicerOid, PortOid, PortPoolOid, QosMapOid, QueueOid,
    SchedulerGroupOid, SchedulerOid,
};
use sonic_types::{QosMapType, StormType};

/// QoS state of one port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortQosNode {
    pub port_id: PortOid,
    pub is_cpu: bool,
    /// Indexed by [`StormType::slot`].
    pub policers: [PolicerOid; StormType::COUNT],
    /// Indexed by [`QosMapType::slot`].
    pub maps: [QosMapOid; QosMapType::COUNT],
    pub buffer_profile_id: BufferProfileOid,
    pub scheduler_id: SchedulerOid,
    #[serde(skip)]
    pub queues: IdList<QueueOid>,
    /// Scheduler groups, one list per hierarchy level.
    #[serde(skip)]
    pub sched_groups: Vec<IdList<SchedulerGroupOid>>,
    #[serde(skip)]
    pub pgs: IdList<IngressPriorityGroupOid>,
    #[serde(skip)]
    pub port_pools: IdList<PortPoolOid>,
    /// Set once the application re-parents a node of this port.
    pub is_app_hqos_init: bool,
}

impl PortQosNode {
    pub fn new(port_id: PortOid, is_cpu: bool, levels: usize) -> Self {
        Self {
            port_id,
            is_cpu,
            policers: [PolicerOid::NULL; StormType::COUNT],
            maps: [QosMapOid::NULL; QosMapType::COUNT],
            buffer_profile_id: BufferProfileOid::NULL,
            scheduler_id: SchedulerOid::NULL,
            queues: IdList::new(),
            sched_groups: vec![IdList::new(); levels],
            pgs: IdList::new(),
            port_pools: IdList::new(),
            is_app_hqos_init: false,
        }
    }

    pub fn map(&self, map_type: QosMapType) -> QosMapOid {
        self.maps[map_type.slot()]
    }

    pub fn policer(&self, storm_type: StormType) -> PolicerOid {
        self.policers[storm_type.slot()]
    }

    pub fn sched_group_count(&self) -> usize {
        self.sched_groups.iter().map(|l| l.len()).sum()
    }
}

/// Port QoS attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortQosAttr {
    /// Read only.
    QueueList(Vec<QueueOid>),
    /// Read only.
    SchedulerGroupList(Vec<SchedulerGroupOid>),
    /// Read only.
    PgList(Vec<IngressPriorityGroupOid>),
    SchedulerProfile(SchedulerOid),
    QosMap(QosMapType, QosMapOid),
    Policer(StormType, PolicerOid),
    BufferProfile(BufferProfileOid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortQosAttrId {
    QueueList,
    SchedulerGroupList,
    PgList,
    SchedulerProfile,
    QosMap(QosMapType),
    Policer(StormType),
    BufferProfile,
}
