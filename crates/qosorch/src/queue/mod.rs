//! QueueOrch - egress queues.
//!
//! Queues are leaves of the per-port scheduler hierarchy and the users of
//! schedulers, WRED profiles and egress buffer profiles.

mod orch;
mod types;

pub use orch::{QueueOrch, QueueOrchStats};
pub use types::{QueueAttr, QueueAttrId, QueueNode, QueueStat};

pub(crate) use orch::{configure_queue, create_queue_node, remove_queue_node, QueueConfig};
