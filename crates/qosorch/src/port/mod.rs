//! PortQosOrch - per-port QoS bring-up, teardown and port-level slots.

mod orch;
mod types;

pub use orch::{PortQosOrch, PortQosOrchStats};
pub use types::{PortQosAttr, PortQosAttrId, PortQosNode};
