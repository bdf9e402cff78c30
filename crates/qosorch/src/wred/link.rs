//! WRED link bookkeeping.
//!
//! A WRED profile can be linked to queues, port pools and buffer pools.
//! All three are handled through [`WredLinkTarget`] so the walk, insert,
//! remove and software-cache operations exist once instead of once per
//! target type.

use serde::Serialize;
use sonic_orch_common::IdList;
use sonic_sai::uoid::object_type_get;
use sonic_sai::{BufferPoolOid, PortPoolOid, QueueOid, RawSaiObjectId, SaiObjectType, WredOid};

use crate::db::QosDb;
use crate::error::{QosError, QosResult};

/// Kind of a WRED link target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WredLinkKind {
    Queue,
    PortPool,
    BufferPool,
}

impl WredLinkKind {
    pub const ALL: [WredLinkKind; 3] = [
        WredLinkKind::Queue,
        WredLinkKind::PortPool,
        WredLinkKind::BufferPool,
    ];
}

/// An object a WRED profile can be linked to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WredLinkTarget {
    Queue(QueueOid),
    PortPool(PortPoolOid),
    BufferPool(BufferPoolOid),
}

impl WredLinkTarget {
    /// Classifies a raw handle.
    pub fn from_raw(raw: RawSaiObjectId) -> QosResult<Self> {
        match object_type_get(raw) {
            Some(SaiObjectType::Queue) => Ok(WredLinkTarget::Queue(QueueOid::from_raw_unchecked(raw))),
            Some(SaiObjectType::PortPool) => {
                Ok(WredLinkTarget::PortPool(PortPoolOid::from_raw_unchecked(raw)))
            }
            Some(SaiObjectType::BufferPool) => {
                Ok(WredLinkTarget::BufferPool(BufferPoolOid::from_raw_unchecked(raw)))
            }
            _ => Err(QosError::InvalidObjectType(raw)),
        }
    }

    pub fn kind(&self) -> WredLinkKind {
        match self {
            WredLinkTarget::Queue(_) => WredLinkKind::Queue,
            WredLinkTarget::PortPool(_) => WredLinkKind::PortPool,
            WredLinkTarget::BufferPool(_) => WredLinkKind::BufferPool,
        }
    }

    pub fn as_raw(&self) -> RawSaiObjectId {
        match self {
            WredLinkTarget::Queue(q) => q.as_raw(),
            WredLinkTarget::PortPool(p) => p.as_raw(),
            WredLinkTarget::BufferPool(b) => b.as_raw(),
        }
    }
}

/// WRED reference held by a link target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WredLinkSlot {
    pub wred_id: WredOid,
    /// The link is recorded but not yet pushed to hardware.
    pub sw_cached: bool,
}

/// Link lists of one WRED profile, one per target kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WredLinks {
    queues: IdList<QueueOid>,
    port_pools: IdList<PortPoolOid>,
    buffer_pools: IdList<BufferPoolOid>,
}

impl WredLinks {
    pub fn link(&mut self, target: WredLinkTarget) -> QosResult<()> {
        match target {
            WredLinkTarget::Queue(q) => self.queues.link_back(q)?,
            WredLinkTarget::PortPool(p) => self.port_pools.link_back(p)?,
            WredLinkTarget::BufferPool(b) => self.buffer_pools.link_back(b)?,
        }
        Ok(())
    }

    pub fn unlink(&mut self, target: WredLinkTarget) -> QosResult<()> {
        match target {
            WredLinkTarget::Queue(q) => self.queues.unlink(&q)?,
            WredLinkTarget::PortPool(p) => self.port_pools.unlink(&p)?,
            WredLinkTarget::BufferPool(b) => self.buffer_pools.unlink(&b)?,
        }
        Ok(())
    }

    /// First linked target of `kind`.
    pub fn first(&self, kind: WredLinkKind) -> Option<WredLinkTarget> {
        match kind {
            WredLinkKind::Queue => self.queues.first().map(WredLinkTarget::Queue),
            WredLinkKind::PortPool => self.port_pools.first().map(WredLinkTarget::PortPool),
            WredLinkKind::BufferPool => self.buffer_pools.first().map(WredLinkTarget::BufferPool),
        }
    }

    /// Target after `target` in its kind's list.
    pub fn next(&self, target: WredLinkTarget) -> Option<WredLinkTarget> {
        match target {
            WredLinkTarget::Queue(q) => self.queues.next(&q).map(WredLinkTarget::Queue),
            WredLinkTarget::PortPool(p) => self.port_pools.next(&p).map(WredLinkTarget::PortPool),
            WredLinkTarget::BufferPool(b) => {
                self.buffer_pools.next(&b).map(WredLinkTarget::BufferPool)
            }
        }
    }

    /// Every linked target of `kind`, in link order.
    pub fn targets(&self, kind: WredLinkKind) -> Vec<WredLinkTarget> {
        let mut out = Vec::new();
        let mut cur = self.first(kind);
        while let Some(t) = cur {
            out.push(t);
            cur = self.next(t);
        }
        out
    }

    pub fn len(&self) -> usize {
        self.queues.len() + self.port_pools.len() + self.buffer_pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Returns the WRED slot of `target`.
///
/// A target that does not exist is an invalid parameter.
pub(crate) fn slot(db: &QosDb, target: WredLinkTarget) -> QosResult<&WredLinkSlot> {
    let missing = || QosError::invalid_parameter(format!("WRED link target {:#x} not found", target.as_raw()));
    match target {
        WredLinkTarget::Queue(q) => db.queues.get(&q).map(|n| &n.wred).ok_or_else(missing),
        WredLinkTarget::PortPool(p) => db.port_pools.get(&p).map(|n| &n.wred).ok_or_else(missing),
        WredLinkTarget::BufferPool(b) => db.pools.get(&b).map(|n| &n.wred).ok_or_else(missing),
    }
}

fn slot_mut(db: &mut QosDb, target: WredLinkTarget) -> QosResult<&mut WredLinkSlot> {
    let missing = || QosError::invalid_parameter(format!("WRED link target {:#x} not found", target.as_raw()));
    match target {
        WredLinkTarget::Queue(q) => db.queues.get_mut(&q).map(|n| &mut n.wred).ok_or_else(missing),
        WredLinkTarget::PortPool(p) => {
            db.port_pools.get_mut(&p).map(|n| &mut n.wred).ok_or_else(missing)
        }
        WredLinkTarget::BufferPool(b) => db.pools.get_mut(&b).map(|n| &mut n.wred).ok_or_else(missing),
    }
}

/// Records that `target` uses `wred`. A null `wred` is a no-op.
pub(crate) fn insert(db: &mut QosDb, wred: WredOid, target: WredLinkTarget) -> QosResult<()> {
    if wred.is_null() {
        return Ok(());
    }
    slot(db, target)?;
    db.wreds
        .get_mut(&wred)
        .ok_or(QosError::InvalidObjectId(wred.as_raw()))?
        .links
        .link(target)?;
    slot_mut(db, target)?.wred_id = wred;
    Ok(())
}

/// Drops the link between `target` and `wred`. A null `wred` is a no-op.
pub(crate) fn remove(db: &mut QosDb, wred: WredOid, target: WredLinkTarget) -> QosResult<()> {
    if wred.is_null() {
        return Ok(());
    }
    slot(db, target)?;
    db.wreds
        .get_mut(&wred)
        .ok_or(QosError::InvalidObjectId(wred.as_raw()))?
        .links
        .unlink(target)?;
    let s = slot_mut(db, target)?;
    s.wred_id = WredOid::NULL;
    s.sw_cached = false;
    Ok(())
}

pub(crate) fn is_cached(db: &QosDb, target: WredLinkTarget) -> QosResult<bool> {
    Ok(slot(db, target)?.sw_cached)
}

pub(crate) fn mark_cached(db: &mut QosDb, target: WredLinkTarget) -> QosResult<()> {
    slot_mut(db, target)?.sw_cached = true;
    Ok(())
}

pub(crate) fn unmark_cached(db: &mut QosDb, target: WredLinkTarget) -> QosResult<()> {
    slot_mut(db, target)?.sw_cached = false;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sonic_sai::PortOid;

    #[test]
    fn test_target_classification() {
        let pool = BufferPoolOid::from_npu_id(2);
        assert_eq!(
            WredLinkTarget::from_raw(pool.as_raw()).unwrap(),
            WredLinkTarget::BufferPool(pool)
        );
        let port = PortOid::from_npu_id(2);
        assert_eq!(
            WredLinkTarget::from_raw(port.as_raw()),
            Err(QosError::InvalidObjectType(port.as_raw()))
        );
    }

    #[test]
    fn test_walk_is_per_kind() {
        let mut links = WredLinks::default();
        let q1 = WredLinkTarget::Queue(QueueOid::from_npu_id(1));
        let q2 = WredLinkTarget::Queue(QueueOid::from_npu_id(2));
        let bp = WredLinkTarget::BufferPool(BufferPoolOid::from_npu_id(1));
        links.link(q1).unwrap();
        links.link(bp).unwrap();
        links.link(q2).unwrap();

        assert_eq!(links.first(WredLinkKind::Queue), Some(q1));
        assert_eq!(links.next(q1), Some(q2));
        assert_eq!(links.next(q2), None);
        assert_eq!(links.targets(WredLinkKind::BufferPool), vec![bp]);
        assert_eq!(links.first(WredLinkKind::PortPool), None);
        assert_eq!(links.len(), 3);
    }

    #[test]
    fn test_double_link_rejected() {
        let mut links = WredLinks::default();
        let q = WredLinkTarget::Queue(QueueOid::from_npu_id(1));
        links.link(q).unwrap();
        assert!(links.link(q).is_err());
        links.unlink(q).unwrap();
        assert!(links.unlink(q).is_err());
        assert!(links.is_empty());
    }
}
