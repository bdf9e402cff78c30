//! Queue node and attributes.

use serde::Serialize;
use sonic_sai::{BufferProfileOid, PortOid, QueueOid, SchedulerGroupOid, SchedulerOid, WredOid};
use sonic_types::QueueType;

use crate::consts::{CHILD_INDEX_INVALID, QUEUE_INDEX_INVALID};
use crate::wred::WredLinkSlot;

/// An egress queue of a port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueNode {
    pub queue_id: QueueOid,
    pub port_id: PortOid,
    pub queue_type: QueueType,
    pub queue_index: u32,
    /// Scheduler group this queue hangs under, or null.
    pub parent_id: SchedulerGroupOid,
    /// Slot in the parent's child bitmap.
    pub child_index: u32,
    pub scheduler_id: SchedulerOid,
    pub buffer_profile_id: BufferProfileOid,
    pub wred: WredLinkSlot,
}

impl QueueNode {
    /// Creates an unattached node. The handle is filled in once the
    /// backend has created the queue.
    pub fn new(port_id: PortOid, queue_type: QueueType) -> Self {
        Self {
            queue_id: QueueOid::NULL,
            port_id,
            queue_type,
            queue_index: QUEUE_INDEX_INVALID,
            parent_id: SchedulerGroupOid::NULL,
            child_index: CHILD_INDEX_INVALID,
            scheduler_id: SchedulerOid::NULL,
            buffer_profile_id: BufferProfileOid::NULL,
            wred: WredLinkSlot::default(),
        }
    }

    pub fn wred_id(&self) -> WredOid {
        self.wred.wred_id
    }
}

/// Queue attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueAttr {
    /// Create only.
    Type(QueueType),
    /// Create only.
    Port(PortOid),
    /// Create only.
    Index(u32),
    ParentSchedulerNode(SchedulerGroupOid),
    WredProfile(WredOid),
    BufferProfile(BufferProfileOid),
    SchedulerProfile(SchedulerOid),
}

impl QueueAttr {
    pub fn id(&self) -> QueueAttrId {
        match self {
            QueueAttr::Type(_) => QueueAttrId::Type,
            QueueAttr::Port(_) => QueueAttrId::Port,
            QueueAttr::Index(_) => QueueAttrId::Index,
            QueueAttr::ParentSchedulerNode(_) => QueueAttrId::ParentSchedulerNode,
            QueueAttr::WredProfile(_) => QueueAttrId::WredProfile,
            QueueAttr::BufferProfile(_) => QueueAttrId::BufferProfile,
            QueueAttr::SchedulerProfile(_) => QueueAttrId::SchedulerProfile,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueAttrId {
    Type,
    Port,
    Index,
    ParentSchedulerNode,
    WredProfile,
    BufferProfile,
    SchedulerProfile,
}

/// Queue counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueStat {
    Packets,
    Bytes,
    DroppedPackets,
    DroppedBytes,
    CurrOccupancyBytes,
    WatermarkBytes,
}
