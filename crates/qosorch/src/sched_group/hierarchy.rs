//! Parent/child wiring of the scheduler hierarchy.
//!
//! Children of a scheduler group are either queues or lower-level groups.
//! Each child occupies one slot of the parent's child bitmap; the slot is
//! taken before the backend call and given back if the call fails, so a
//! hardware failure never leaves the graph half-updated.

use std::fmt;

use serde::Serialize;
use sonic_sai::uoid::object_type_get;
use sonic_sai::{PortOid, QueueOid, RawSaiObjectId, SaiObjectType, SchedulerGroupOid};

use crate::consts::CHILD_INDEX_INVALID;
use crate::db::QosDb;
use crate::error::{QosError, QosResult};
use crate::npu::NpuApiTable;

/// A node that can hang under a scheduler group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum HierarchyChild {
    Queue(QueueOid),
    Group(SchedulerGroupOid),
}

impl HierarchyChild {
    /// Classifies a raw handle.
    pub fn from_raw(raw: RawSaiObjectId) -> QosResult<Self> {
        match object_type_get(raw) {
            Some(SaiObjectType::Queue) => Ok(HierarchyChild::Queue(QueueOid::from_raw_unchecked(raw))),
            Some(SaiObjectType::SchedulerGroup) => {
                Ok(HierarchyChild::Group(SchedulerGroupOid::from_raw_unchecked(raw)))
            }
            _ => Err(QosError::InvalidObjectType(raw)),
        }
    }

    pub fn as_raw(&self) -> RawSaiObjectId {
        match self {
            HierarchyChild::Queue(q) => q.as_raw(),
            HierarchyChild::Group(g) => g.as_raw(),
        }
    }
}

impl fmt::Display for HierarchyChild {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HierarchyChild::Queue(q) => write!(f, "queue {}", q),
            HierarchyChild::Group(g) => write!(f, "group {}", g),
        }
    }
}

// Fields of the child node the hierarchy code reads and writes.
struct ChildView {
    port_id: PortOid,
    parent_id: SchedulerGroupOid,
    level: Option<u32>,
}

fn child_view(db: &QosDb, child: HierarchyChild) -> QosResult<ChildView> {
    match child {
        HierarchyChild::Queue(q) => {
            let node = db.queue(q)?;
            Ok(ChildView {
                port_id: node.port_id,
                parent_id: node.parent_id,
                level: None,
            })
        }
        HierarchyChild::Group(g) => {
            let node = db.sched_group(g)?;
            Ok(ChildView {
                port_id: node.port_id,
                parent_id: node.parent_id,
                level: Some(node.level),
            })
        }
    }
}

fn set_child_parent(
    db: &mut QosDb,
    child: HierarchyChild,
    parent: SchedulerGroupOid,
    child_index: u32,
) -> QosResult<()> {
    match child {
        HierarchyChild::Queue(q) => {
            let node = db.queue_mut(q)?;
            node.parent_id = parent;
            node.child_index = child_index;
        }
        HierarchyChild::Group(g) => {
            let node = db.sched_group_mut(g)?;
            node.parent_id = parent;
            node.child_index = child_index;
        }
    }
    Ok(())
}

fn child_index_of(db: &QosDb, child: HierarchyChild) -> QosResult<u32> {
    match child {
        HierarchyChild::Queue(q) => Ok(db.queue(q)?.child_index),
        HierarchyChild::Group(g) => Ok(db.sched_group(g)?.child_index),
    }
}

/// Checks that `child` may be placed under `parent`.
///
/// Both must belong to the same port, the parent must have a free child
/// slot, and a group may only hang under a group of a lower level.
pub(crate) fn validate_child_parent(
    db: &QosDb,
    child: HierarchyChild,
    parent: SchedulerGroupOid,
) -> QosResult<()> {
    let view = child_view(db, child)?;
    let parent_node = db
        .sched_groups
        .get(&parent)
        .ok_or(QosError::InvalidObjectId(parent.as_raw()))?;

    if view.port_id != parent_node.port_id {
        return Err(QosError::invalid_parameter(format!(
            "{} is on port {}, parent {} is on port {}",
            child, view.port_id, parent, parent_node.port_id
        )));
    }
    if parent_node.is_full() {
        return Err(QosError::invalid_parameter(format!(
            "parent {} already has {} children",
            parent, parent_node.max_childs
        )));
    }
    if let (HierarchyChild::Group(g), Some(level)) = (child, view.level) {
        if g == parent || level <= parent_node.level {
            return Err(QosError::invalid_parameter(format!(
                "group {} at level {} cannot hang under level {}",
                g, level, parent_node.level
            )));
        }
    }
    Ok(())
}

fn commit_attach(
    db: &mut QosDb,
    child: HierarchyChild,
    parent: SchedulerGroupOid,
    child_index: u32,
) -> QosResult<()> {
    let parent_node = db.sched_group_mut(parent)?;
    parent_node.children.link_back(child)?;
    parent_node.child_count += 1;
    set_child_parent(db, child, parent, child_index)
}

fn commit_detach(db: &mut QosDb, child: HierarchyChild, parent: SchedulerGroupOid) -> QosResult<()> {
    let child_index = child_index_of(db, child)?;
    let parent_node = db.sched_group_mut(parent)?;
    parent_node.children.unlink(&child)?;
    parent_node.child_index_bitmap.free(child_index)?;
    parent_node.child_count -= 1;
    set_child_parent(db, child, SchedulerGroupOid::NULL, CHILD_INDEX_INVALID)
}

fn take_slot(db: &mut QosDb, parent: SchedulerGroupOid) -> QosResult<u32> {
    Ok(db.sched_group_mut(parent)?.child_index_bitmap.alloc()?)
}

fn release_slot(db: &mut QosDb, parent: SchedulerGroupOid, index: u32) {
    if let Some(node) = db.sched_groups.get_mut(&parent) {
        let _ = node.child_index_bitmap.free(index);
    }
}

/// Places a parentless `child` under `parent`.
///
/// Returns the child index taken in the parent.
pub(crate) fn attach(
    npu: &NpuApiTable,
    db: &mut QosDb,
    child: HierarchyChild,
    parent: SchedulerGroupOid,
) -> QosResult<u32> {
    let view = child_view(db, child)?;
    if !view.parent_id.is_null() {
        return Err(QosError::invalid_parameter(format!(
            "{} already has parent {}",
            child, view.parent_id
        )));
    }
    validate_child_parent(db, child, parent)?;

    let index = take_slot(db, parent)?;
    let result = match child {
        HierarchyChild::Queue(q) => npu.queue.queue_attach_to_parent(q, parent, index),
        HierarchyChild::Group(g) => npu.sched_group.sched_group_attach_to_parent(g, parent, index),
    };
    if let Err(e) = result {
        release_slot(db, parent, index);
        return Err(e.into());
    }

    commit_attach(db, child, parent, index)?;
    Ok(index)
}

/// Detaches `child` from its parent. A parentless child is left alone.
pub(crate) fn detach(npu: &NpuApiTable, db: &mut QosDb, child: HierarchyChild) -> QosResult<()> {
    let parent = child_view(db, child)?.parent_id;
    if parent.is_null() {
        return Ok(());
    }

    match child {
        HierarchyChild::Queue(q) => npu.queue.queue_detach_from_parent(q, parent)?,
        HierarchyChild::Group(g) => npu.sched_group.sched_group_detach_from_parent(g, parent)?,
    }
    commit_detach(db, child, parent)
}

/// Moves `child` under `new_parent`; a null `new_parent` detaches it.
///
/// The new parent is validated before anything is touched, so a rejected
/// move leaves the child under its old parent.
pub(crate) fn modify_parent(
    npu: &NpuApiTable,
    db: &mut QosDb,
    child: HierarchyChild,
    new_parent: SchedulerGroupOid,
) -> QosResult<()> {
    let old_parent = child_view(db, child)?.parent_id;
    if old_parent == new_parent {
        return Ok(());
    }
    if old_parent.is_null() {
        return attach(npu, db, child, new_parent).map(|_| ());
    }
    if new_parent.is_null() {
        return detach(npu, db, child);
    }

    validate_child_parent(db, child, new_parent)?;
    let index = take_slot(db, new_parent)?;
    let result = match child {
        HierarchyChild::Queue(q) => npu.queue.queue_modify_parent(q, new_parent, index),
        HierarchyChild::Group(g) => npu.sched_group.sched_group_modify_parent(g, new_parent, index),
    };
    if let Err(e) = result {
        release_slot(db, new_parent, index);
        return Err(e.into());
    }

    commit_detach(db, child, old_parent)?;
    commit_attach(db, child, new_parent, index)
}
