//! SONiC QoS object model.
//!
//! The QoS engine keeps the software view of every QoS object on the
//! switch and drives a hardware backend through the tables in [`npu`]:
//!
//! ```text
//! [QueueOrch] [SchedulerOrch] [SchedGroupOrch] [BufferOrch] ...
//!        \          |               |              /
//!         +----> [QosContext: QosDb + NpuApiTable] ----> [backend]
//! ```
//!
//! # Key Components
//!
//! - [`context::QosContext`]: shared graph, lock and backend tables
//! - [`db::QosDb`]: the object graph, one store per entity type
//! - [`npu`]: backend contract; [`vm::VmQosNpu`] simulates a switch
//! - one orchestrator per entity: queues, schedulers, scheduler groups,
//!   buffers, WRED profiles, QoS maps, policers and ports
//!
//! Every object is addressed by a typed handle from `sonic_sai`. Objects
//! reference each other by handle and keep back-reference lists, so an
//! object that is still used can never be removed.

// The logging macros are #[macro_export]; keep this module first.
pub mod audit;

pub mod buffer;
pub mod config;
pub mod consts;
pub mod context;
pub mod db;
pub mod error;
pub mod npu;
pub mod policer;
pub mod port;
pub mod qos_map;
pub mod queue;
mod rollback;
pub mod sched_group;
pub mod scheduler;
pub mod vm;
pub mod wred;

// ============================================================================
// Re-exports
// ============================================================================

pub use sonic_sai::{
    BufferPoolOid, BufferProfileOid, IngressPriorityGroupOid, PolicerOid, PortOid, PortPoolOid,
    QosMapOid, QueueOid, SaiError, SaiResult, SchedulerGroupOid, SchedulerOid, WredOid,
};
pub use sonic_types::{BufferPoolType, QosMapType, QueueType, StormType};

pub use buffer::{BufferOrch, BufferOrchStats};
pub use config::QosSwitchConfig;
pub use context::QosContext;
pub use db::QosDb;
pub use error::{QosError, QosResult};
pub use npu::{NpuApiTable, QosNpu};
pub use policer::{PolicerOrch, PolicerOrchStats};
pub use port::{PortQosOrch, PortQosOrchStats};
pub use qos_map::{get_tc_from_pg, QosMapOrch, QosMapOrchStats};
pub use queue::{QueueOrch, QueueOrchStats};
pub use sched_group::{SchedGroupOrch, SchedGroupOrchStats};
pub use scheduler::{SchedulerOrch, SchedulerOrchStats};
pub use vm::VmQosNpu;
pub use wred::{WredOrch, WredOrchStats};
