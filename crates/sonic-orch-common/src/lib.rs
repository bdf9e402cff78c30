//! Common object-graph primitives for the SONiC QoS engine.
//!
//! This crate provides the bookkeeping structures every QoS orchestrator
//! builds its graph from:
//!
//! - [`ObjectStore`]: Ordered, handle-keyed store that never auto-creates entries
//! - [`IdList`]: Relationship list linking one object to many others
//! - [`IdBitmap`]: First-fit id allocator (child slots, simulated id spaces)
//! - [`HasRefCount`]: Reference-counted nodes
//!
//! None of these perform hardware calls; callers serialize access through
//! their own lock.

mod bitmap;
mod id_list;
mod object_store;

pub use bitmap::{BitmapError, IdBitmap};
pub use id_list::{IdList, ListError};
pub use object_store::{HasRefCount, ObjectStore, StoreError};
