//! WredOrch - WRED profiles and their links.
//!
//! A profile can be linked to unicast queues, port pools and buffer
//! pools. Pool links made before any queue draws from the pool are kept
//! in software and pushed to hardware by [`flush_cached`] later.

pub(crate) mod link;
mod orch;
mod types;

pub use link::{WredLinkKind, WredLinkSlot, WredLinkTarget, WredLinks};
pub use orch::{WredOrch, WredOrchStats};
pub use types::{WredAttr, WredAttrId, WredColorConfig, WredConfig, WredNode};

pub(crate) use orch::{flush_cached, wred_apply};
