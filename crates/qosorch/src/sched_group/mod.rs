//! SchedGroupOrch - per-port scheduler hierarchy.
//!
//! Scheduler groups form a tree per port with queues as leaves. Children
//! take a slot in their parent's child bitmap; see [`hierarchy`] for the
//! attach, detach and re-parent protocol.

pub(crate) mod hierarchy;
mod orch;
mod template;
mod types;

pub use hierarchy::HierarchyChild;
pub use orch::{SchedGroupOrch, SchedGroupOrchStats};
pub use template::{HierarchyTemplate, TemplateChild, TemplateChildKind, TemplateGroup, TemplateLevel};
pub use types::{SchedGroupAttr, SchedGroupAttrId, SchedGroupNode};

pub(crate) use orch::{app_modify_parent, remove_group_node};
pub(crate) use template::materialize;
