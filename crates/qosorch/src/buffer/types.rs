//! Buffer pool, profile, priority group and port pool nodes.

use serde::Serialize;
use sonic_orch_common::{HasRefCount, IdList};
use sonic_sai::{
    BufferPoolOid, BufferProfileOid, IngressPriorityGroupOid, PortOid, PortPoolOid, QueueOid, WredOid,
};
use sonic_types::{BufferPoolType, ThresholdMode};

use crate::wred::WredLinkSlot;

/// A shared buffer pool.
///
/// `shared_size` is the capacity still free for profile reservations;
/// `size - xoff_size - shared_size` is what committed profile
/// applications hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BufferPoolNode {
    pub pool_id: BufferPoolOid,
    pub pool_type: BufferPoolType,
    pub threshold_mode: ThresholdMode,
    pub size: u64,
    pub shared_size: u64,
    pub xoff_size: u64,
    /// Number of port pools built on this pool.
    pub num_ref: u32,
    #[serde(skip)]
    pub profiles: IdList<BufferProfileOid>,
    pub wred: WredLinkSlot,
}

impl BufferPoolNode {
    pub fn new(pool_type: BufferPoolType, size: u64) -> Self {
        Self {
            pool_id: BufferPoolOid::NULL,
            pool_type,
            threshold_mode: ThresholdMode::default(),
            size,
            shared_size: size,
            xoff_size: 0,
            num_ref: 0,
            profiles: IdList::new(),
            wred: WredLinkSlot::default(),
        }
    }

    /// Bytes held by committed reservations.
    pub fn reserved(&self) -> u64 {
        self.size
            .saturating_sub(self.xoff_size)
            .saturating_sub(self.shared_size)
    }
}

/// A buffer profile and the ports, queues and PGs using it.
///
/// The reference count equals the number of targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BufferProfileNode {
    pub profile_id: BufferProfileOid,
    pub pool_id: BufferPoolOid,
    pub size: u64,
    /// Overrides the pool's mode when set.
    pub threshold_mode: Option<ThresholdMode>,
    pub shared_dynamic_th: i8,
    pub shared_static_th: u64,
    pub xoff_th: u64,
    pub xon_th: u64,
    pub xon_offset_th: u64,
    pub ref_count: u32,
    #[serde(skip)]
    pub ports: IdList<PortOid>,
    #[serde(skip)]
    pub queues: IdList<QueueOid>,
    #[serde(skip)]
    pub pgs: IdList<IngressPriorityGroupOid>,
}

impl BufferProfileNode {
    pub fn new(pool_id: BufferPoolOid, size: u64) -> Self {
        Self {
            profile_id: BufferProfileOid::NULL,
            pool_id,
            size,
            threshold_mode: None,
            shared_dynamic_th: 0,
            shared_static_th: 0,
            xoff_th: 0,
            xon_th: 0,
            xon_offset_th: 0,
            ref_count: 0,
            ports: IdList::new(),
            queues: IdList::new(),
            pgs: IdList::new(),
        }
    }

    /// Stores one attribute. The pool handle is only meaningful at create.
    pub fn apply(&mut self, attr: &BufferProfileAttr) {
        match *attr {
            BufferProfileAttr::PoolId(p) => self.pool_id = p,
            BufferProfileAttr::BufferSize(v) => self.size = v,
            BufferProfileAttr::ThresholdMode(m) => self.threshold_mode = Some(m),
            BufferProfileAttr::SharedDynamicTh(v) => self.shared_dynamic_th = v,
            BufferProfileAttr::SharedStaticTh(v) => self.shared_static_th = v,
            BufferProfileAttr::XoffTh(v) => self.xoff_th = v,
            BufferProfileAttr::XonTh(v) => self.xon_th = v,
            BufferProfileAttr::XonOffsetTh(v) => self.xon_offset_th = v,
        }
    }

    /// Returns the value held for `id`. An unset threshold mode reads as
    /// `fallback`, the mode of the profile's pool.
    pub fn get(&self, id: BufferProfileAttrId, fallback: ThresholdMode) -> BufferProfileAttr {
        match id {
            BufferProfileAttrId::PoolId => BufferProfileAttr::PoolId(self.pool_id),
            BufferProfileAttrId::BufferSize => BufferProfileAttr::BufferSize(self.size),
            BufferProfileAttrId::ThresholdMode => {
                BufferProfileAttr::ThresholdMode(self.threshold_mode.unwrap_or(fallback))
            }
            BufferProfileAttrId::SharedDynamicTh => BufferProfileAttr::SharedDynamicTh(self.shared_dynamic_th),
            BufferProfileAttrId::SharedStaticTh => BufferProfileAttr::SharedStaticTh(self.shared_static_th),
            BufferProfileAttrId::XoffTh => BufferProfileAttr::XoffTh(self.xoff_th),
            BufferProfileAttrId::XonTh => BufferProfileAttr::XonTh(self.xon_th),
            BufferProfileAttrId::XonOffsetTh => BufferProfileAttr::XonOffsetTh(self.xon_offset_th),
        }
    }

    /// Number of ports, queues and PGs using the profile.
    pub fn target_count(&self) -> usize {
        self.ports.len() + self.queues.len() + self.pgs.len()
    }
}

impl HasRefCount for BufferProfileNode {
    fn increment_ref(&mut self) -> u32 {
        self.ref_count += 1;
        self.ref_count
    }

    fn decrement_ref(&mut self) -> Option<u32> {
        self.ref_count = self.ref_count.checked_sub(1)?;
        Some(self.ref_count)
    }

    fn ref_count(&self) -> u32 {
        self.ref_count
    }
}

/// An ingress priority group of a port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriorityGroupNode {
    pub pg_id: IngressPriorityGroupOid,
    pub port_id: PortOid,
    pub index: u32,
    pub buffer_profile_id: BufferProfileOid,
}

/// Per-port view of a buffer pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortPoolNode {
    pub port_pool_id: PortPoolOid,
    pub port_id: PortOid,
    pub pool_id: BufferPoolOid,
    pub wred: WredLinkSlot,
}

/// An object a buffer profile can be applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    Port(PortOid),
    Queue(QueueOid),
    Pg(IngressPriorityGroupOid),
}

impl BufferTarget {
    pub fn as_raw(&self) -> u64 {
        match self {
            BufferTarget::Port(p) => p.as_raw(),
            BufferTarget::Queue(q) => q.as_raw(),
            BufferTarget::Pg(pg) => pg.as_raw(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            BufferTarget::Port(_) => "port",
            BufferTarget::Queue(_) => "queue",
            BufferTarget::Pg(_) => "priority group",
        }
    }
}

/// Buffer pool attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferPoolAttr {
    /// Read only.
    SharedSize(u64),
    /// Create only.
    Type(BufferPoolType),
    Size(u64),
    /// Create only.
    ThresholdMode(ThresholdMode),
    XoffSize(u64),
    WredProfile(WredOid),
}

impl BufferPoolAttr {
    pub fn id(&self) -> BufferPoolAttrId {
        match self {
            BufferPoolAttr::SharedSize(_) => BufferPoolAttrId::SharedSize,
            BufferPoolAttr::Type(_) => BufferPoolAttrId::Type,
            BufferPoolAttr::Size(_) => BufferPoolAttrId::Size,
            BufferPoolAttr::ThresholdMode(_) => BufferPoolAttrId::ThresholdMode,
            BufferPoolAttr::XoffSize(_) => BufferPoolAttrId::XoffSize,
            BufferPoolAttr::WredProfile(_) => BufferPoolAttrId::WredProfile,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferPoolAttrId {
    SharedSize,
    Type,
    Size,
    ThresholdMode,
    XoffSize,
    WredProfile,
}

/// Buffer profile attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferProfileAttr {
    PoolId(BufferPoolOid),
    BufferSize(u64),
    ThresholdMode(ThresholdMode),
    SharedDynamicTh(i8),
    SharedStaticTh(u64),
    XoffTh(u64),
    XonTh(u64),
    XonOffsetTh(u64),
}

impl BufferProfileAttr {
    pub fn id(&self) -> BufferProfileAttrId {
        match self {
            BufferProfileAttr::PoolId(_) => BufferProfileAttrId::PoolId,
            BufferProfileAttr::BufferSize(_) => BufferProfileAttrId::BufferSize,
            BufferProfileAttr::ThresholdMode(_) => BufferProfileAttrId::ThresholdMode,
            BufferProfileAttr::SharedDynamicTh(_) => BufferProfileAttrId::SharedDynamicTh,
            BufferProfileAttr::SharedStaticTh(_) => BufferProfileAttrId::SharedStaticTh,
            BufferProfileAttr::XoffTh(_) => BufferProfileAttrId::XoffTh,
            BufferProfileAttr::XonTh(_) => BufferProfileAttrId::XonTh,
            BufferProfileAttr::XonOffsetTh(_) => BufferProfileAttrId::XonOffsetTh,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferProfileAttrId {
    PoolId,
    BufferSize,
    ThresholdMode,
    SharedDynamicTh,
    SharedStaticTh,
    XoffTh,
    XonTh,
    XonOffsetTh,
}

/// Priority group attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PgAttr {
    /// Read only.
    Port(PortOid),
    /// Read only.
    Index(u32),
    BufferProfile(BufferProfileOid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PgAttrId {
    Port,
    Index,
    BufferProfile,
}

/// Port pool attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortPoolAttr {
    /// Create only.
    Port(PortOid),
    /// Create only.
    BufferPool(BufferPoolOid),
    WredProfile(WredOid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortPoolAttrId {
    Port,
    BufferPool,
    WredProfile,
}

/// Buffer pool counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferPoolStat {
    CurrOccupancyBytes,
    WatermarkBytes,
    DroppedPackets,
    XoffRoomWatermarkBytes,
}

/// Priority group counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PgStat {
    Packets,
    Bytes,
    CurrOccupancyBytes,
    WatermarkBytes,
    XoffRoomWatermarkBytes,
    DroppedPackets,
}
