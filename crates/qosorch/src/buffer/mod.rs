//! BufferOrch - buffer pools, profiles, priority groups and port pools.
//!
//! Profiles draw capacity from their pool when applied to a port, queue
//! or PG; see [`accounting`] for the bookkeeping and the `apply` module
//! for the transaction that moves a target between profiles.

pub mod accounting;
mod apply;
mod orch;
mod types;

pub use accounting::{port_wred_queue_ids, reserved_xoff_get, wred_queue_ids};
pub use orch::{BufferOrch, BufferOrchStats};
pub use types::{
    BufferPoolAttr, BufferPoolAttrId, BufferPoolNode, BufferPoolStat, BufferProfileAttr,
    BufferProfileAttrId, BufferProfileNode, BufferTarget, PgAttr, PgAttrId, PgStat, PortPoolAttr,
    PortPoolAttrId, PortPoolNode, PriorityGroupNode,
};

pub(crate) use apply::profile_apply;
pub(crate) use orch::{create_pg_node, remove_pg_node, remove_port_pool_node};
