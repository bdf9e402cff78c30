//! Scheduler group node and attributes.

use serde::Serialize;
use sonic_orch_common::{IdBitmap, IdList};
use sonic_sai::{PortOid, SchedulerGroupOid, SchedulerOid};
use sonic_types::SchedulingType;

use super::hierarchy::HierarchyChild;
use crate::consts::CHILD_INDEX_INVALID;

/// A node of a port's scheduler hierarchy.
///
/// `child_count` always equals the number of set bits in
/// `child_index_bitmap` and the length of `children`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchedGroupNode {
    pub sg_id: SchedulerGroupOid,
    pub port_id: PortOid,
    pub parent_id: SchedulerGroupOid,
    pub level: u32,
    pub max_childs: u32,
    /// Slot in the parent's child bitmap.
    pub child_index: u32,
    pub child_count: u32,
    #[serde(skip)]
    pub child_index_bitmap: IdBitmap,
    #[serde(skip)]
    pub children: IdList<HierarchyChild>,
    pub scheduler_id: SchedulerOid,
    /// Scheduling discipline the port template asked for.
    pub sched_mode: SchedulingType,
    pub dummy_child: bool,
}

impl SchedGroupNode {
    pub fn new(port_id: PortOid, level: u32, max_childs: u32) -> Self {
        Self {
            sg_id: SchedulerGroupOid::NULL,
            port_id,
            parent_id: SchedulerGroupOid::NULL,
            level,
            max_childs,
            child_index: CHILD_INDEX_INVALID,
            child_count: 0,
            child_index_bitmap: IdBitmap::new(max_childs),
            children: IdList::new(),
            scheduler_id: SchedulerOid::NULL,
            sched_mode: SchedulingType::default(),
            dummy_child: false,
        }
    }

    pub fn is_full(&self) -> bool {
        self.child_count >= self.max_childs
    }
}

/// Scheduler group attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedGroupAttr {
    /// Read only.
    ChildCount(u32),
    /// Read only.
    ChildList(Vec<HierarchyChild>),
    /// Create only.
    Port(PortOid),
    /// Create only.
    Level(u32),
    /// Create only.
    MaxChilds(u32),
    SchedulerProfile(SchedulerOid),
    ParentNode(SchedulerGroupOid),
}

impl SchedGroupAttr {
    pub fn id(&self) -> SchedGroupAttrId {
        match self {
            SchedGroupAttr::ChildCount(_) => SchedGroupAttrId::ChildCount,
            SchedGroupAttr::ChildList(_) => SchedGroupAttrId::ChildList,
            SchedGroupAttr::Port(_) => SchedGroupAttrId::Port,
            SchedGroupAttr::Level(_) => SchedGroupAttrId::Level,
            SchedGroupAttr::MaxChilds(_) => SchedGroupAttrId::MaxChilds,
            SchedGroupAttr::SchedulerProfile(_) => SchedGroupAttrId::SchedulerProfile,
            SchedGroupAttr::ParentNode(_) => SchedGroupAttrId::ParentNode,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchedGroupAttrId {
    ChildCount,
    ChildList,
    Port,
    Level,
    MaxChilds,
    SchedulerProfile,
    ParentNode,
}
