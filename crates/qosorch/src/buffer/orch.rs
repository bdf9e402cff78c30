//! BufferOrch implementation.

use std::sync::Arc;

use serde_json::json;
use sonic_sai::{
    BufferPoolOid, BufferProfileOid, IngressPriorityGroupOid, PortOid, PortPoolOid, QueueOid, WredOid,
};
use sonic_types::{BufferPoolType, ThresholdMode};

use super::accounting::{self, admit, release, reservation, reserve, resized_shared_size};
use super::apply::{profile_apply, reapply_profile};
use super::types::{
    BufferPoolAttr, BufferPoolAttrId, BufferPoolNode, BufferPoolStat, BufferProfileAttr,
    BufferProfileAttrId, BufferProfileNode, BufferTarget, PgAttr, PgAttrId, PgStat, PortPoolAttr,
    PortPoolAttrId, PortPoolNode, PriorityGroupNode,
};
use crate::audit::{AuditCategory, AuditOutcome, AuditRecord};
use crate::context::QosContext;
use crate::db::QosDb;
use crate::error::{QosError, QosResult};
use crate::npu::NpuApiTable;
use crate::wred::{wred_apply, WredLinkSlot, WredLinkTarget};
use crate::{audit_log, debug_log, error_log, warn_log};

/// Buffer orchestrator statistics.
#[derive(Debug, Clone, Default)]
pub struct BufferOrchStats {
    pub pools_created: u64,
    pub pools_removed: u64,
    pub profiles_created: u64,
    pub profiles_removed: u64,
    pub profile_applies: u64,
    pub capacity_denials: u64,
    pub reapply_failures: u64,
}

/// Creates PG `index` of `port` with no profile.
pub(crate) fn create_pg_node(
    npu: &NpuApiTable,
    db: &mut QosDb,
    port: PortOid,
    index: u32,
) -> QosResult<IngressPriorityGroupOid> {
    db.port(port)?;
    let pg = npu.buffer.pg_create(port, index)?;
    db.pgs.insert(
        pg,
        PriorityGroupNode {
            pg_id: pg,
            port_id: port,
            index,
            buffer_profile_id: BufferProfileOid::NULL,
        },
    )?;
    db.port_mut(port)?.pgs.link_back(pg)?;
    Ok(pg)
}

/// Releases the PG's profile and removes the PG.
pub(crate) fn remove_pg_node(npu: &NpuApiTable, db: &mut QosDb, pg: IngressPriorityGroupOid) -> QosResult<()> {
    profile_apply(npu, db, BufferTarget::Pg(pg), BufferProfileOid::NULL)?;
    npu.buffer.pg_remove(db.pg(pg)?)?;

    let port = db.pg(pg)?.port_id;
    db.port_mut(port)?.pgs.unlink(&pg)?;
    db.pgs.remove(&pg);
    Ok(())
}

/// Unlinks the port pool's WRED profile and removes it.
pub(crate) fn remove_port_pool_node(npu: &NpuApiTable, db: &mut QosDb, pp: PortPoolOid) -> QosResult<()> {
    wred_apply(npu, db, WredLinkTarget::PortPool(pp), WredOid::NULL)?;
    npu.buffer.port_pool_remove(db.port_pool(pp)?)?;

    let (port, pool) = {
        let node = db.port_pool(pp)?;
        (node.port_id, node.pool_id)
    };
    let pool_node = db.pool_mut(pool)?;
    pool_node.num_ref = pool_node.num_ref.saturating_sub(1);
    db.port_mut(port)?.port_pools.unlink(&pp)?;
    db.port_pools.remove(&pp);
    Ok(())
}

#[derive(Default)]
struct PoolRequest {
    pool_type: Option<BufferPoolType>,
    size: Option<u64>,
    threshold_mode: ThresholdMode,
    xoff_size: u64,
    wred: WredOid,
}

impl PoolRequest {
    fn parse(attrs: &[BufferPoolAttr]) -> QosResult<Self> {
        let mut req = PoolRequest::default();
        for (i, attr) in attrs.iter().enumerate() {
            match *attr {
                BufferPoolAttr::Type(t) => req.pool_type = Some(t),
                BufferPoolAttr::Size(s) => req.size = Some(s),
                BufferPoolAttr::ThresholdMode(m) => req.threshold_mode = m,
                BufferPoolAttr::XoffSize(x) => req.xoff_size = x,
                BufferPoolAttr::WredProfile(w) => req.wred = w,
                BufferPoolAttr::SharedSize(_) => {
                    return Err(QosError::invalid_parameter("shared size is read-only").at_index(i));
                }
            }
        }
        Ok(req)
    }
}

/// Buffer pool, profile, priority group and port pool orchestrator.
pub struct BufferOrch {
    ctx: Arc<QosContext>,
    stats: BufferOrchStats,
}

impl std::fmt::Debug for BufferOrch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferOrch")
            .field("stats", &self.stats)
            .finish()
    }
}

impl BufferOrch {
    pub fn new(ctx: Arc<QosContext>) -> Self {
        Self {
            ctx,
            stats: BufferOrchStats::default(),
        }
    }

    pub fn stats(&self) -> &BufferOrchStats {
        &self.stats
    }

    // --- pools ---

    /// Creates a buffer pool. Type and size are mandatory; the free
    /// capacity starts at `size - xoff_size`.
    pub fn create_pool(&mut self, attrs: &[BufferPoolAttr]) -> QosResult<BufferPoolOid> {
        let req = PoolRequest::parse(attrs)?;
        let pool_type = req
            .pool_type
            .ok_or_else(|| QosError::invalid_parameter("missing buffer pool type"))?;
        let size = req
            .size
            .ok_or_else(|| QosError::invalid_parameter("missing buffer pool size"))?;
        if req.xoff_size > size {
            return Err(QosError::invalid_attr_value(format!(
                "xoff size {} exceeds pool size {}",
                req.xoff_size, size
            )));
        }

        let mut node = BufferPoolNode::new(pool_type, size);
        node.threshold_mode = req.threshold_mode;
        node.xoff_size = req.xoff_size;
        node.shared_size = size - req.xoff_size;

        let mut guard = self.ctx.lock();
        let db = &mut *guard;
        let npu = self.ctx.npu();

        let id = npu.buffer.buffer_pool_create(&node).inspect_err(|e| {
            audit_log!(AuditRecord::new(AuditCategory::ResourceCreate, "BufferOrch", "create_pool")
                .with_object_type("buffer_pool")
                .with_details(json!({ "type": pool_type, "size": size }))
                .with_error(e.to_string()));
        })?;
        node.pool_id = id;
        db.pools.insert(id, node)?;

        if let Err(e) = wred_apply(npu, db, WredLinkTarget::BufferPool(id), req.wred) {
            if let Err(cleanup) = self.discard_pool(db, id) {
                warn_log!("BufferOrch", pool = %id, error = %cleanup, "cleanup after failed create");
            }
            return Err(e);
        }

        self.stats.pools_created = self.stats.pools_created.saturating_add(1);
        audit_log!(AuditRecord::new(AuditCategory::ResourceCreate, "BufferOrch", "create_pool")
            .with_outcome(AuditOutcome::Success)
            .with_object_id(id.to_string())
            .with_object_type("buffer_pool")
            .with_details(json!({
                "type": pool_type,
                "size": size,
                "xoff_size": req.xoff_size,
                "threshold_mode": req.threshold_mode,
            })));
        Ok(id)
    }

    fn discard_pool(&self, db: &mut QosDb, id: BufferPoolOid) -> QosResult<()> {
        self.ctx.npu().buffer.buffer_pool_remove(db.pool(id)?)?;
        db.pools.remove(&id);
        Ok(())
    }

    /// Removes a pool no profile or port pool is built on.
    pub fn remove_pool(&mut self, id: BufferPoolOid) -> QosResult<()> {
        let mut guard = self.ctx.lock();
        let db = &mut *guard;

        let node = db.pool(id)?;
        if !node.profiles.is_empty() || node.num_ref > 0 {
            let err = QosError::object_in_use(format!(
                "buffer pool {} has {} profiles and {} port pools",
                id,
                node.profiles.len(),
                node.num_ref
            ));
            audit_log!(AuditRecord::new(AuditCategory::ResourceDelete, "BufferOrch", "remove_pool")
                .with_outcome(AuditOutcome::Denied)
                .with_object_id(id.to_string())
                .with_object_type("buffer_pool")
                .with_error(err.to_string()));
            return Err(err);
        }

        wred_apply(self.ctx.npu(), db, WredLinkTarget::BufferPool(id), WredOid::NULL)?;
        self.discard_pool(db, id)?;

        self.stats.pools_removed = self.stats.pools_removed.saturating_add(1);
        audit_log!(AuditRecord::new(AuditCategory::ResourceDelete, "BufferOrch", "remove_pool")
            .with_outcome(AuditOutcome::Success)
            .with_object_id(id.to_string())
            .with_object_type("buffer_pool"));
        Ok(())
    }

    /// Resizes a pool or changes its WRED profile.
    ///
    /// A resize keeps every committed reservation; shrinking below what
    /// is reserved fails with `InsufficientResources` and changes nothing.
    pub fn set_pool_attribute(&mut self, id: BufferPoolOid, attr: BufferPoolAttr) -> QosResult<()> {
        let mut guard = self.ctx.lock();
        let db = &mut *guard;
        let npu = self.ctx.npu();

        match attr {
            BufferPoolAttr::Size(new_size) => {
                let node = db.pool(id)?;
                if node.size == new_size {
                    return Ok(());
                }
                let new_shared = match resized_shared_size(node.size, node.shared_size, new_size) {
                    Ok(v) => v,
                    Err(e) => {
                        self.stats.capacity_denials = self.stats.capacity_denials.saturating_add(1);
                        audit_log!(AuditRecord::new(AuditCategory::CapacityCheck, "BufferOrch", "resize_pool")
                            .with_outcome(AuditOutcome::Denied)
                            .with_object_id(id.to_string())
                            .with_object_type("buffer_pool")
                            .with_details(json!({
                                "size": node.size,
                                "shared_size": node.shared_size,
                                "requested": new_size,
                            }))
                            .with_error(e.to_string()));
                        return Err(e);
                    }
                };
                npu.buffer.buffer_pool_size_set(node, new_size)?;

                let node = db.pool_mut(id)?;
                let old_size = node.size;
                node.size = new_size;
                node.shared_size = new_shared;
                debug_log!("BufferOrch", pool = %id, old_size, new_size, shared_size = new_shared, "pool resized");
                audit_log!(AuditRecord::new(AuditCategory::ResourceModify, "BufferOrch", "resize_pool")
                    .with_outcome(AuditOutcome::Success)
                    .with_object_id(id.to_string())
                    .with_object_type("buffer_pool")
                    .with_details(json!({ "old_size": old_size, "new_size": new_size })));
                Ok(())
            }
            BufferPoolAttr::WredProfile(w) => {
                db.pool(id)?;
                wred_apply(npu, db, WredLinkTarget::BufferPool(id), w)
            }
            other => Err(QosError::invalid_parameter(format!(
                "{:?} cannot be changed after create",
                other.id()
            ))),
        }
    }

    pub fn get_pool_attribute(&self, id: BufferPoolOid, ids: &[BufferPoolAttrId]) -> QosResult<Vec<BufferPoolAttr>> {
        let db = self.ctx.lock();
        let node = db.pool(id)?;
        Ok(ids
            .iter()
            .map(|a| match a {
                BufferPoolAttrId::SharedSize => BufferPoolAttr::SharedSize(node.shared_size),
                BufferPoolAttrId::Type => BufferPoolAttr::Type(node.pool_type),
                BufferPoolAttrId::Size => BufferPoolAttr::Size(node.size),
                BufferPoolAttrId::ThresholdMode => BufferPoolAttr::ThresholdMode(node.threshold_mode),
                BufferPoolAttrId::XoffSize => BufferPoolAttr::XoffSize(node.xoff_size),
                BufferPoolAttrId::WredProfile => BufferPoolAttr::WredProfile(node.wred.wred_id),
            })
            .collect())
    }

    pub fn get_pool_stats(&self, id: BufferPoolOid, counters: &[BufferPoolStat]) -> QosResult<Vec<u64>> {
        let db = self.ctx.lock();
        db.pool(id)?;
        Ok(self.ctx.npu().buffer.buffer_pool_stats_get(id, counters)?)
    }

    pub fn clear_pool_stats(&self, id: BufferPoolOid, counters: &[BufferPoolStat]) -> QosResult<()> {
        let db = self.ctx.lock();
        db.pool(id)?;
        Ok(self.ctx.npu().buffer.buffer_pool_stats_clear(id, counters)?)
    }

    // --- profiles ---

    /// Creates a buffer profile on an existing pool. The pool and buffer
    /// size are mandatory. Nothing is reserved until the profile is
    /// applied to a target.
    pub fn create_profile(&mut self, attrs: &[BufferProfileAttr]) -> QosResult<BufferProfileOid> {
        let mut node = BufferProfileNode::new(BufferPoolOid::NULL, 0);
        let mut have_size = false;
        for attr in attrs {
            if let BufferProfileAttr::BufferSize(_) = attr {
                have_size = true;
            }
            node.apply(attr);
        }
        if node.pool_id.is_null() {
            return Err(QosError::invalid_parameter("missing buffer profile pool"));
        }
        if !have_size {
            return Err(QosError::invalid_parameter("missing buffer profile size"));
        }

        let mut guard = self.ctx.lock();
        let db = &mut *guard;
        if !db.pools.contains(&node.pool_id) {
            return Err(QosError::InvalidObjectId(node.pool_id.as_raw()));
        }

        let id = self.ctx.npu().buffer.buffer_profile_create(&node).inspect_err(|e| {
            audit_log!(AuditRecord::new(AuditCategory::ResourceCreate, "BufferOrch", "create_profile")
                .with_object_type("buffer_profile")
                .with_error(e.to_string()));
        })?;
        node.profile_id = id;
        let pool = node.pool_id;
        let size = node.size;
        db.profiles.insert(id, node)?;
        db.pool_mut(pool)?.profiles.link_back(id)?;

        self.stats.profiles_created = self.stats.profiles_created.saturating_add(1);
        audit_log!(AuditRecord::new(AuditCategory::ResourceCreate, "BufferOrch", "create_profile")
            .with_outcome(AuditOutcome::Success)
            .with_object_id(id.to_string())
            .with_object_type("buffer_profile")
            .with_details(json!({ "pool": pool, "size": size })));
        Ok(id)
    }

    /// Removes a profile no port, queue or PG uses.
    pub fn remove_profile(&mut self, id: BufferProfileOid) -> QosResult<()> {
        let mut guard = self.ctx.lock();
        let db = &mut *guard;

        let node = db.profile(id)?;
        if node.ref_count > 0 {
            let err = QosError::object_in_use(format!("buffer profile {} has {} users", id, node.ref_count));
            audit_log!(AuditRecord::new(AuditCategory::ResourceDelete, "BufferOrch", "remove_profile")
                .with_outcome(AuditOutcome::Denied)
                .with_object_id(id.to_string())
                .with_object_type("buffer_profile")
                .with_error(err.to_string()));
            return Err(err);
        }

        self.ctx.npu().buffer.buffer_profile_remove(node)?;
        let pool = node.pool_id;
        db.pool_mut(pool)?.profiles.unlink(&id)?;
        db.profiles.remove(&id);

        self.stats.profiles_removed = self.stats.profiles_removed.saturating_add(1);
        audit_log!(AuditRecord::new(AuditCategory::ResourceDelete, "BufferOrch", "remove_profile")
            .with_outcome(AuditOutcome::Success)
            .with_object_id(id.to_string())
            .with_object_type("buffer_profile"));
        Ok(())
    }

    /// Changes one profile parameter and re-programs every user.
    ///
    /// Growth is admitted against the pool for all users at once. If a
    /// user fails, the users already updated and the profile are restored
    /// and the pool accounting is left untouched.
    pub fn set_profile_attribute(&mut self, id: BufferProfileOid, attr: BufferProfileAttr) -> QosResult<()> {
        if let BufferProfileAttr::PoolId(_) = attr {
            return Err(QosError::invalid_parameter("buffer profile pool cannot be changed"));
        }

        let mut guard = self.ctx.lock();
        let db = &mut *guard;
        let npu = self.ctx.npu();

        let old_node = db.profile(id)?.clone();
        let mut new_node = old_node.clone();
        new_node.apply(&attr);
        if new_node == old_node {
            return Ok(());
        }

        let pool = old_node.pool_id;
        let users = old_node.target_count() as u64;
        let old_total = reservation(db, &old_node).saturating_mul(users);
        let new_total = reservation(db, &new_node).saturating_mul(users);

        if new_total > old_total {
            if let Err(e) = admit(db.pool(pool)?, new_total - old_total, 0) {
                self.stats.capacity_denials = self.stats.capacity_denials.saturating_add(1);
                audit_log!(AuditRecord::new(AuditCategory::CapacityCheck, "BufferOrch", "set_profile")
                    .with_outcome(AuditOutcome::Denied)
                    .with_object_id(id.to_string())
                    .with_object_type("buffer_profile")
                    .with_details(json!({
                        "users": users,
                        "old_reserved": old_total,
                        "new_reserved": new_total,
                    }))
                    .with_error(e.to_string()));
                return Err(e);
            }
        }

        npu.buffer.buffer_profile_attribute_set(&old_node, &attr)?;

        if let Err(e) = reapply_profile(npu, &old_node, &new_node) {
            self.stats.reapply_failures = self.stats.reapply_failures.saturating_add(1);
            let previous = old_node.get(attr.id(), accounting::threshold_mode(db, &old_node));
            if let Err(restore) = npu.buffer.buffer_profile_attribute_set(&new_node, &previous) {
                error_log!("BufferOrch", profile = %id, error = %restore, "failed to restore buffer profile attribute");
            }
            audit_log!(AuditRecord::new(AuditCategory::Reapply, "BufferOrch", "set_profile")
                .with_object_id(id.to_string())
                .with_object_type("buffer_profile")
                .with_details(json!({ "users": users }))
                .with_error(e.to_string()));
            return Err(e.into());
        }

        release(db, pool, old_total)?;
        reserve(db, pool, new_total)?;
        *db.profile_mut(id)? = new_node;

        debug_log!("BufferOrch", profile = %id, attr = ?attr, users, "buffer profile updated");
        audit_log!(AuditRecord::new(AuditCategory::ResourceModify, "BufferOrch", "set_profile")
            .with_outcome(AuditOutcome::Success)
            .with_object_id(id.to_string())
            .with_object_type("buffer_profile")
            .with_details(json!({ "users": users })));
        Ok(())
    }

    pub fn get_profile_attribute(
        &self,
        id: BufferProfileOid,
        ids: &[BufferProfileAttrId],
    ) -> QosResult<Vec<BufferProfileAttr>> {
        let db = self.ctx.lock();
        let node = db.profile(id)?;
        let pool_mode = db.pool(node.pool_id).map(|p| p.threshold_mode).unwrap_or_default();
        Ok(ids.iter().map(|&a| node.get(a, pool_mode)).collect())
    }

    /// Threshold mode in effect for a profile.
    pub fn profile_threshold_mode(&self, id: BufferProfileOid) -> QosResult<ThresholdMode> {
        let db = self.ctx.lock();
        Ok(accounting::threshold_mode(&db, db.profile(id)?))
    }

    // --- priority groups ---

    pub fn set_pg_attribute(&mut self, pg: IngressPriorityGroupOid, attr: PgAttr) -> QosResult<()> {
        let mut guard = self.ctx.lock();
        let db = &mut *guard;
        db.pg(pg)?;

        match attr {
            PgAttr::BufferProfile(profile) => {
                profile_apply(self.ctx.npu(), db, BufferTarget::Pg(pg), profile).inspect_err(|e| {
                    if matches!(e, QosError::InsufficientResources(_)) {
                        self.stats.capacity_denials = self.stats.capacity_denials.saturating_add(1);
                    }
                })?;
                self.stats.profile_applies = self.stats.profile_applies.saturating_add(1);
                Ok(())
            }
            PgAttr::Port(_) | PgAttr::Index(_) => Err(QosError::invalid_parameter(
                "priority group port and index are read-only",
            )),
        }
    }

    pub fn get_pg_attribute(&self, pg: IngressPriorityGroupOid, ids: &[PgAttrId]) -> QosResult<Vec<PgAttr>> {
        let db = self.ctx.lock();
        let node = db.pg(pg)?;
        Ok(ids
            .iter()
            .map(|a| match a {
                PgAttrId::Port => PgAttr::Port(node.port_id),
                PgAttrId::Index => PgAttr::Index(node.index),
                PgAttrId::BufferProfile => PgAttr::BufferProfile(node.buffer_profile_id),
            })
            .collect())
    }

    pub fn get_pg_stats(&self, pg: IngressPriorityGroupOid, counters: &[PgStat]) -> QosResult<Vec<u64>> {
        let db = self.ctx.lock();
        db.pg(pg)?;
        Ok(self.ctx.npu().buffer.pg_stats_get(pg, counters)?)
    }

    pub fn clear_pg_stats(&self, pg: IngressPriorityGroupOid, counters: &[PgStat]) -> QosResult<()> {
        let db = self.ctx.lock();
        db.pg(pg)?;
        Ok(self.ctx.npu().buffer.pg_stats_clear(pg, counters)?)
    }

    /// PGs of `port`, in index order.
    pub fn port_pg_list(&self, port: PortOid) -> QosResult<Vec<IngressPriorityGroupOid>> {
        Ok(self.ctx.lock().port(port)?.pgs.to_vec())
    }

    // --- port pools ---

    /// Creates the view of `pool` on `port`. Only one per pair.
    pub fn create_port_pool(&mut self, attrs: &[PortPoolAttr]) -> QosResult<PortPoolOid> {
        let mut port = None;
        let mut pool = None;
        let mut wred = WredOid::NULL;
        for attr in attrs {
            match *attr {
                PortPoolAttr::Port(p) => port = Some(p),
                PortPoolAttr::BufferPool(b) => pool = Some(b),
                PortPoolAttr::WredProfile(w) => wred = w,
            }
        }
        let port = port.ok_or_else(|| QosError::invalid_parameter("missing port pool port"))?;
        let pool = pool.ok_or_else(|| QosError::invalid_parameter("missing port pool buffer pool"))?;

        let mut guard = self.ctx.lock();
        let db = &mut *guard;
        let npu = self.ctx.npu();

        if !db.ports.contains(&port) {
            return Err(QosError::InvalidObjectId(port.as_raw()));
        }
        if !db.pools.contains(&pool) {
            return Err(QosError::InvalidObjectId(pool.as_raw()));
        }
        if let Some(existing) = db.find_port_pool(port, pool) {
            return Err(QosError::AlreadyExists(format!(
                "port {} already has port pool {} on {}",
                port, existing, pool
            )));
        }

        let mut node = PortPoolNode {
            port_pool_id: PortPoolOid::NULL,
            port_id: port,
            pool_id: pool,
            wred: WredLinkSlot::default(),
        };
        let id = npu.buffer.port_pool_create(&node)?;
        node.port_pool_id = id;
        db.port_pools.insert(id, node)?;
        db.port_mut(port)?.port_pools.link_back(id)?;
        db.pool_mut(pool)?.num_ref += 1;

        if let Err(e) = wred_apply(npu, db, WredLinkTarget::PortPool(id), wred) {
            if let Err(cleanup) = remove_port_pool_node(npu, db, id) {
                warn_log!("BufferOrch", port_pool = %id, error = %cleanup, "cleanup after failed create");
            }
            return Err(e);
        }

        audit_log!(AuditRecord::new(AuditCategory::ResourceCreate, "BufferOrch", "create_port_pool")
            .with_outcome(AuditOutcome::Success)
            .with_object_id(id.to_string())
            .with_object_type("port_pool")
            .with_details(json!({ "port": port, "pool": pool })));
        Ok(id)
    }

    pub fn remove_port_pool(&mut self, id: PortPoolOid) -> QosResult<()> {
        let mut guard = self.ctx.lock();
        remove_port_pool_node(self.ctx.npu(), &mut guard, id)?;
        audit_log!(AuditRecord::new(AuditCategory::ResourceDelete, "BufferOrch", "remove_port_pool")
            .with_outcome(AuditOutcome::Success)
            .with_object_id(id.to_string())
            .with_object_type("port_pool"));
        Ok(())
    }

    pub fn set_port_pool_attribute(&mut self, id: PortPoolOid, attr: PortPoolAttr) -> QosResult<()> {
        let mut guard = self.ctx.lock();
        let db = &mut *guard;
        db.port_pool(id)?;
        match attr {
            PortPoolAttr::WredProfile(w) => wred_apply(self.ctx.npu(), db, WredLinkTarget::PortPool(id), w),
            _ => Err(QosError::invalid_parameter("port pool port and pool are create-only")),
        }
    }

    pub fn get_port_pool_attribute(&self, id: PortPoolOid, ids: &[PortPoolAttrId]) -> QosResult<Vec<PortPoolAttr>> {
        let db = self.ctx.lock();
        let node = db.port_pool(id)?;
        Ok(ids
            .iter()
            .map(|a| match a {
                PortPoolAttrId::Port => PortPoolAttr::Port(node.port_id),
                PortPoolAttrId::BufferPool => PortPoolAttr::BufferPool(node.pool_id),
                PortPoolAttrId::WredProfile => PortPoolAttr::WredProfile(node.wred.wred_id),
            })
            .collect())
    }

    /// Port pool of `port` built on `pool`, if any.
    pub fn port_pool(&self, port: PortOid, pool: BufferPoolOid) -> Option<PortPoolOid> {
        self.ctx.lock().find_port_pool(port, pool)
    }

    // --- queries ---

    pub fn first_pg_id(&self, pool: BufferPoolOid) -> QosResult<Option<IngressPriorityGroupOid>> {
        accounting::first_pg_id(&self.ctx.lock(), pool)
    }

    pub fn first_queue_id(&self, pool: BufferPoolOid) -> QosResult<Option<QueueOid>> {
        accounting::first_queue_id(&self.ctx.lock(), pool)
    }

    /// Unicast front-panel queues a WRED profile on `pool` acts on.
    pub fn wred_queue_ids(&self, pool: BufferPoolOid) -> QosResult<Vec<QueueOid>> {
        accounting::wred_queue_ids(&self.ctx.lock(), pool)
    }
}
