//! QosMapOrch - classification maps and their port slots.

mod attach;
mod orch;
mod types;

pub use attach::get_tc_from_pg;
pub use orch::{QosMapOrch, QosMapOrchStats};
pub use types::{validate_entries, QosMapAttr, QosMapAttrId, QosMapEntry, QosMapNode, QosMapParams};

pub(crate) use attach::{map_remove, map_set};
