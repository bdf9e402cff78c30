//! Id spaces and buffer capacity of the simulated switch.

use std::collections::BTreeMap;

use sonic_orch_common::{BitmapError, IdBitmap};
use sonic_sai::{SaiError, SaiResult};
use sonic_types::BufferPoolType;

use crate::config::QosSwitchConfig;
use crate::consts::vm;

/// Allocates a free id from `bitmap`, first fit.
pub(super) fn alloc(bitmap: &mut IdBitmap, what: &str) -> SaiResult<u32> {
    bitmap.alloc().map_err(|e| match e {
        BitmapError::Exhausted { .. } => SaiError::insufficient_resources(format!("{} ids", what)),
        other => SaiError::invalid_parameter(other.to_string()),
    })
}

/// Returns `id` to `bitmap`.
pub(super) fn free(bitmap: &mut IdBitmap, id: u64, what: &str) -> SaiResult<()> {
    let id = u32::try_from(id).map_err(|_| SaiError::invalid_parameter(format!("{} id {:#x}", what, id)))?;
    match bitmap.free(id) {
        Ok(true) => Ok(()),
        Ok(false) => Err(SaiError::not_found(format!("{} id {}", what, id))),
        Err(e) => Err(SaiError::invalid_parameter(e.to_string())),
    }
}

/// Buffer memory and pool ids of one direction.
#[derive(Debug)]
pub(super) struct PoolSpace {
    pub ids: IdBitmap,
    /// Bytes not yet handed to any pool.
    pub free_bytes: u64,
    /// Bytes each live pool holds, by pool sequence id.
    pub charged: BTreeMap<u32, u64>,
}

impl PoolSpace {
    fn new(max_pools: u32, bytes: u64) -> Self {
        Self {
            ids: IdBitmap::new(max_pools),
            free_bytes: bytes,
            charged: BTreeMap::new(),
        }
    }

    /// Takes a pool id and `shared` bytes.
    pub fn create(&mut self, shared: u64) -> SaiResult<u32> {
        if self.ids.available() == 0 {
            return Err(SaiError::insufficient_resources("buffer pools"));
        }
        if self.free_bytes < shared {
            return Err(SaiError::insufficient_resources(format!(
                "{} bytes requested, {} free",
                shared, self.free_bytes
            )));
        }
        let spid = alloc(&mut self.ids, "buffer pool")?;
        self.free_bytes -= shared;
        self.charged.insert(spid, shared);
        Ok(spid)
    }

    pub fn remove(&mut self, spid: u32) -> SaiResult<()> {
        free(&mut self.ids, spid as u64, "buffer pool")?;
        let held = self.charged.remove(&spid).unwrap_or(0);
        self.free_bytes += held;
        Ok(())
    }

    /// Resizes a pool whose free capacity moves from `old_shared` to
    /// `new_shared`. Nothing changes when the switch cannot cover it.
    pub fn update(&mut self, spid: u32, old_shared: u64, new_shared: u64) -> SaiResult<()> {
        let budget = self.free_bytes + old_shared;
        if budget < new_shared {
            return Err(SaiError::insufficient_resources(format!(
                "pool needs {} bytes, {} available",
                new_shared, budget
            )));
        }
        self.free_bytes = budget - new_shared;
        let held = self.charged.entry(spid).or_insert(0);
        *held = (*held + new_shared).saturating_sub(old_shared);
        Ok(())
    }
}

/// All simulated allocators.
#[derive(Debug)]
pub(super) struct VmState {
    pub queues: IdBitmap,
    pub schedulers: IdBitmap,
    pub sched_groups: IdBitmap,
    pub profiles: IdBitmap,
    pub port_pools: IdBitmap,
    pub wreds: IdBitmap,
    pub maps: IdBitmap,
    pub policers: IdBitmap,
    pub ingress: PoolSpace,
    pub egress: PoolSpace,
}

impl VmState {
    pub fn new(config: &QosSwitchConfig) -> Self {
        let bytes = config.buffer_size_bytes();
        Self {
            queues: IdBitmap::new(vm::MAX_QUEUES),
            schedulers: IdBitmap::new(vm::MAX_SCHEDULERS),
            sched_groups: IdBitmap::new(vm::MAX_SCHED_GROUPS),
            profiles: IdBitmap::new(vm::MAX_BUFFER_PROFILES),
            port_pools: IdBitmap::new(vm::MAX_PORT_POOLS),
            wreds: IdBitmap::new(vm::MAX_WRED),
            maps: IdBitmap::new(vm::MAX_MAPS),
            policers: IdBitmap::new(vm::MAX_POLICERS),
            ingress: PoolSpace::new(config.max_ingress_pools, bytes),
            egress: PoolSpace::new(config.max_egress_pools, bytes),
        }
    }

    pub fn pools(&mut self, pool_type: BufferPoolType) -> &mut PoolSpace {
        match pool_type {
            BufferPoolType::Ingress => &mut self.ingress,
            BufferPoolType::Egress => &mut self.egress,
        }
    }
}
