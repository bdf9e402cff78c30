//! PolicerOrch - policers, port storm control and ACL rule references.

mod orch;
mod types;

pub use orch::{PolicerOrch, PolicerOrchStats};
pub use types::{PolicerAttr, PolicerAttrId, PolicerConfig, PolicerNode};

pub(crate) use orch::policer_port_set;
