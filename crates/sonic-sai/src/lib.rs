//! Safe Rust vocabulary for the SAI (Switch Abstraction Interface) QoS objects.
//!
//! This crate provides the types shared between the QoS engine and the
//! hardware-facing backends, preventing common errors like mixing object IDs
//! of different types and ensuring proper error handling.
//!
//! # Architecture
//!
//! - [`types`]: Type-safe object IDs, one marker kind per QoS object
//! - [`uoid`]: Handle encoding (object type + backend-local id) and the
//!   pool / priority group id packing
//! - [`error`]: Error types and status handling
//!
//! # Example
//!
//! ```
//! use sonic_sai::{QueueOid, SaiObjectType, SaiResult};
//!
//! fn queue_index(queue: QueueOid) -> SaiResult<u64> {
//!     Ok(queue.npu_id())
//! }
//!
//! let queue = QueueOid::from_npu_id(4);
//! assert_eq!(sonic_sai::uoid::object_type_get(queue.as_raw()), Some(SaiObjectType::Queue));
//! assert_eq!(queue_index(queue).unwrap(), 4);
//! ```

pub mod error;
pub mod types;
pub mod uoid;

// Re-export commonly used types
pub use types::{
    AclEntryKind, AclEntryOid, BufferPoolKind, BufferPoolOid, BufferProfileKind, BufferProfileOid,
    IngressPriorityGroupKind, IngressPriorityGroupOid, PolicerKind, PolicerOid, PortKind, PortOid,
    PortPoolKind, PortPoolOid, QosMapKind, QosMapOid, QueueKind, QueueOid, RawSaiObjectId,
    SaiObjectId, SaiObjectKind, SchedulerGroupKind, SchedulerGroupOid, SchedulerKind,
    SchedulerOid, SwitchKind, SwitchOid, WredKind, WredOid,
};
pub use uoid::SaiObjectType;

pub use error::{SaiError, SaiResult, SaiStatus, SaiStatusExt};
