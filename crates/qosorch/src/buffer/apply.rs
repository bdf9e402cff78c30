//! Applying a buffer profile to a port, queue or PG.
//!
//! The application is a small transaction: every check runs first, then
//! the backend is asked to program the new profile, and only after it
//! accepts are the pool reservation, the profile lists and the target's
//! reference updated. A rejected or failed application leaves the graph
//! exactly as it was.

use serde_json::json;
use sonic_sai::{BufferProfileOid, SaiError};
use sonic_types::BufferPoolType;

use super::accounting::{admit, release, reservation, reserve};
use super::types::{BufferProfileNode, BufferTarget};
use crate::audit::{AuditCategory, AuditOutcome, AuditRecord};
use crate::db::QosDb;
use crate::error::{QosError, QosResult};
use crate::npu::NpuApiTable;
use crate::wred;
use crate::{audit_log, debug_log};

/// Profile currently applied to `target`.
pub(crate) fn current_profile(db: &QosDb, target: BufferTarget) -> QosResult<BufferProfileOid> {
    Ok(match target {
        BufferTarget::Port(p) => db.port(p)?.buffer_profile_id,
        BufferTarget::Queue(q) => db.queue(q)?.buffer_profile_id,
        BufferTarget::Pg(pg) => db.pg(pg)?.buffer_profile_id,
    })
}

fn set_current(db: &mut QosDb, target: BufferTarget, profile: BufferProfileOid) -> QosResult<()> {
    match target {
        BufferTarget::Port(p) => db.port_mut(p)?.buffer_profile_id = profile,
        BufferTarget::Queue(q) => db.queue_mut(q)?.buffer_profile_id = profile,
        BufferTarget::Pg(pg) => db.pg_mut(pg)?.buffer_profile_id = profile,
    }
    Ok(())
}

fn link(node: &mut BufferProfileNode, target: BufferTarget) -> QosResult<()> {
    match target {
        BufferTarget::Port(p) => node.ports.link_back(p)?,
        BufferTarget::Queue(q) => node.queues.link_back(q)?,
        BufferTarget::Pg(pg) => node.pgs.link_back(pg)?,
    }
    node.ref_count += 1;
    Ok(())
}

fn unlink(node: &mut BufferProfileNode, target: BufferTarget) -> QosResult<()> {
    match target {
        BufferTarget::Port(p) => node.ports.unlink(&p)?,
        BufferTarget::Queue(q) => node.queues.unlink(&q)?,
        BufferTarget::Pg(pg) => node.pgs.unlink(&pg)?,
    }
    node.ref_count = node.ref_count.saturating_sub(1);
    Ok(())
}

// PGs draw from ingress pools, queues from egress pools.
fn check_direction(db: &QosDb, target: BufferTarget, profile: &BufferProfileNode) -> QosResult<()> {
    let pool_type = db.pool(profile.pool_id)?.pool_type;
    let expected = match target {
        BufferTarget::Pg(_) => BufferPoolType::Ingress,
        BufferTarget::Queue(_) => BufferPoolType::Egress,
        BufferTarget::Port(_) => return Ok(()),
    };
    if pool_type != expected {
        return Err(QosError::invalid_attr_value(format!(
            "profile {} draws from an {} pool, {} {:#x} needs {}",
            profile.profile_id,
            pool_type,
            target.kind(),
            target.as_raw(),
            expected
        )));
    }
    Ok(())
}

/// Applies profile `new` to `target`, replacing whatever it had. A null
/// `new` removes the current profile.
///
/// After a queue starts drawing from an egress pool, WRED profiles that
/// were parked in software on that pool are pushed to hardware.
pub(crate) fn profile_apply(
    npu: &NpuApiTable,
    db: &mut QosDb,
    target: BufferTarget,
    new: BufferProfileOid,
) -> QosResult<()> {
    let old = current_profile(db, target)?;
    if old == new {
        return Ok(());
    }

    let old_node = if old.is_null() { None } else { Some(db.profile(old)?.clone()) };
    let new_node = if new.is_null() {
        None
    } else {
        Some(
            db.profiles
                .get(&new)
                .ok_or(QosError::InvalidObjectId(new.as_raw()))?
                .clone(),
        )
    };

    let old_res = old_node.as_ref().map(|n| (n.pool_id, reservation(db, n)));
    let new_res = new_node.as_ref().map(|n| (n.pool_id, reservation(db, n)));

    if let (Some(node), Some((pool, bytes))) = (&new_node, new_res) {
        check_direction(db, target, node)?;

        let credit = match old_res {
            Some((old_pool, old_bytes)) if old_pool == pool => old_bytes,
            _ => 0,
        };
        if let Err(e) = admit(db.pool(pool)?, bytes, credit) {
            audit_log!(AuditRecord::new(AuditCategory::CapacityCheck, "BufferOrch", "apply_profile")
                .with_outcome(AuditOutcome::Denied)
                .with_object_id(format!("{:#x}", target.as_raw()))
                .with_object_type(target.kind())
                .with_details(json!({
                    "profile": new,
                    "pool": pool,
                    "requested": bytes,
                    "credit": credit,
                    "shared_size": db.pool(pool)?.shared_size,
                }))
                .with_error(e.to_string()));
            return Err(e);
        }
        npu.buffer.check_buffer_size(pool, node, bytes)?;
    }

    npu.buffer
        .apply_buffer_profile(target, old_node.as_ref(), new_node.as_ref())?;

    // commit
    if let Some((pool, bytes)) = old_res {
        release(db, pool, bytes)?;
        unlink(db.profile_mut(old)?, target)?;
    }
    if let Some((pool, bytes)) = new_res {
        reserve(db, pool, bytes)?;
        link(db.profile_mut(new)?, target)?;
    }
    set_current(db, target, new)?;

    debug_log!(
        "BufferOrch",
        target = target.as_raw(),
        old = %old,
        new = %new,
        "buffer profile applied"
    );

    if let (BufferTarget::Queue(q), Some((pool, _))) = (target, new_res) {
        let port = db.queue(q)?.port_id;
        wred::flush_cached(npu, db, pool, port);
    }
    Ok(())
}

/// Pushes `new` to every target of `old` after a profile attribute change.
/// Targets already done are restored if one fails.
pub(crate) fn reapply_profile(
    npu: &NpuApiTable,
    old: &BufferProfileNode,
    new: &BufferProfileNode,
) -> Result<(), SaiError> {
    let targets: Vec<BufferTarget> = old
        .ports
        .iter()
        .map(BufferTarget::Port)
        .chain(old.queues.iter().map(BufferTarget::Queue))
        .chain(old.pgs.iter().map(BufferTarget::Pg))
        .collect();

    crate::rollback::apply_all(
        "BufferOrch",
        &targets,
        |t| npu.buffer.apply_buffer_profile(t, Some(old), Some(new)),
        |t| npu.buffer.apply_buffer_profile(t, Some(new), Some(old)),
    )
}
