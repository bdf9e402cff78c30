//! SchedulerOrch - scheduler profiles and their application to queues,
//! scheduler groups and ports.
//!
//! A profile is shared by reference. Changing one of its parameters
//! re-programs every user through the reapply protocol, which undoes the
//! partial work if the backend rejects any user.

mod orch;
mod reapply;
mod types;

pub use orch::{SchedulerOrch, SchedulerOrchStats};
pub use types::{SchedulerAttr, SchedulerAttrId, SchedulerConfig, SchedulerNode, SchedulerTarget};

pub(crate) use orch::{insert_scheduler, scheduler_apply, scheduler_unlink};
