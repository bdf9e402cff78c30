//! Buffer capacity bookkeeping.
//!
//! A pool's `shared_size` is the capacity still free for reservations. It
//! starts at `size - xoff_size`; each committed profile application takes
//! `profile.size + reserved_xoff_get(profile)` from it and gives the same
//! amount back when the profile is removed from the target.

use sonic_sai::{BufferPoolOid, IngressPriorityGroupOid, PortOid, QueueOid};
use sonic_types::{BufferPoolType, ThresholdMode};

use super::types::{BufferPoolNode, BufferProfileNode};
use crate::db::QosDb;
use crate::error::{QosError, QosResult};

/// Headroom a profile reserves on top of its size.
///
/// When the pool has a shared headroom (`xoff_size > 0`) the profile's
/// `xoff_th` is already covered by it and nothing extra is reserved.
pub fn reserved_xoff_get(db: &QosDb, profile: &BufferProfileNode) -> u64 {
    match db.pools.get(&profile.pool_id) {
        Some(pool) if pool.xoff_size > 0 => 0,
        _ => profile.xoff_th,
    }
}

/// Bytes one application of `profile` holds in its pool.
pub fn reservation(db: &QosDb, profile: &BufferProfileNode) -> u64 {
    profile.size.saturating_add(reserved_xoff_get(db, profile))
}

/// Checks that `needed` bytes fit in the pool once `credit` bytes (a
/// reservation about to be released) are given back.
pub fn admit(pool: &BufferPoolNode, needed: u64, credit: u64) -> QosResult<()> {
    let available = pool.shared_size.saturating_add(credit);
    if needed > available {
        return Err(QosError::insufficient_resources(format!(
            "buffer pool {} has {} bytes free, {} requested",
            pool.pool_id, available, needed
        )));
    }
    Ok(())
}

pub(crate) fn reserve(db: &mut QosDb, pool: BufferPoolOid, bytes: u64) -> QosResult<()> {
    let node = db.pool_mut(pool)?;
    node.shared_size = node.shared_size.checked_sub(bytes).ok_or_else(|| {
        QosError::insufficient_resources(format!(
            "buffer pool {} has {} bytes free, {} requested",
            pool, node.shared_size, bytes
        ))
    })?;
    Ok(())
}

pub(crate) fn release(db: &mut QosDb, pool: BufferPoolOid, bytes: u64) -> QosResult<()> {
    let node = db.pool_mut(pool)?;
    node.shared_size = node.shared_size.saturating_add(bytes);
    Ok(())
}

/// Free capacity of a pool after its size changes from `old_size` to
/// `new_size`, keeping the committed reservations.
pub fn resized_shared_size(old_size: u64, old_shared: u64, new_size: u64) -> QosResult<u64> {
    (new_size as i128 + old_shared as i128 - old_size as i128)
        .try_into()
        .map_err(|_| {
            QosError::insufficient_resources(format!(
                "pool size {} is below the {} bytes already reserved",
                new_size,
                old_size.saturating_sub(old_shared)
            ))
        })
}

/// Threshold mode in effect for `profile`: its own override, else the mode
/// of its pool.
pub fn threshold_mode(db: &QosDb, profile: &BufferProfileNode) -> ThresholdMode {
    profile.threshold_mode.unwrap_or_else(|| {
        db.pools
            .get(&profile.pool_id)
            .map(|p| p.threshold_mode)
            .unwrap_or_default()
    })
}

fn pool_of_type(db: &QosDb, pool: BufferPoolOid, pool_type: BufferPoolType) -> QosResult<&BufferPoolNode> {
    let node = db
        .pools
        .get(&pool)
        .ok_or(QosError::InvalidObjectId(pool.as_raw()))?;
    if node.pool_type != pool_type {
        return Err(QosError::invalid_parameter(format!(
            "buffer pool {} is {}, expected {}",
            pool, node.pool_type, pool_type
        )));
    }
    Ok(node)
}

/// First PG using any profile of the ingress pool `pool`.
pub fn first_pg_id(db: &QosDb, pool: BufferPoolOid) -> QosResult<Option<IngressPriorityGroupOid>> {
    let node = pool_of_type(db, pool, BufferPoolType::Ingress)?;
    Ok(node
        .profiles
        .iter()
        .filter_map(|p| db.profiles.get(&p))
        .find_map(|p| p.pgs.first()))
}

/// First queue using any profile of the egress pool `pool`.
pub fn first_queue_id(db: &QosDb, pool: BufferPoolOid) -> QosResult<Option<QueueOid>> {
    let node = pool_of_type(db, pool, BufferPoolType::Egress)?;
    Ok(node
        .profiles
        .iter()
        .filter_map(|p| db.profiles.get(&p))
        .find_map(|p| p.queues.first()))
}

fn pool_queues<'a>(db: &'a QosDb, pool: &'a BufferPoolNode) -> impl Iterator<Item = QueueOid> + 'a {
    pool.profiles
        .iter()
        .filter_map(move |p| db.profiles.get(&p))
        .flat_map(|p| p.queues.iter())
        .filter(move |q| {
            db.queues.get(q).is_some_and(|n| {
                n.queue_type.is_unicast() && db.ports.get(&n.port_id).is_some_and(|p| !p.is_cpu)
            })
        })
}

/// Front-panel unicast queues drawing from `pool`. These are the queues
/// a WRED profile on the pool acts on.
pub fn wred_queue_ids(db: &QosDb, pool: BufferPoolOid) -> QosResult<Vec<QueueOid>> {
    let node = db
        .pools
        .get(&pool)
        .ok_or(QosError::InvalidObjectId(pool.as_raw()))?;
    Ok(pool_queues(db, node).collect())
}

/// Like [`wred_queue_ids`], restricted to the queues of `port`.
pub fn port_wred_queue_ids(db: &QosDb, port: PortOid, pool: BufferPoolOid) -> Vec<QueueOid> {
    match db.pools.get(&pool) {
        Some(node) => pool_queues(db, node)
            .filter(|q| db.queues.get(q).is_some_and(|n| n.port_id == port))
            .collect(),
        None => Vec::new(),
    }
}
