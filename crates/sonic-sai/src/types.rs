//! Type-safe SAI object ID wrappers.
//!
//! This module provides strongly-typed wrappers for SAI object IDs, preventing
//! accidental mixing of different object types (e.g., passing a queue OID where
//! a scheduler group OID is expected).

use std::cmp::Ordering;
use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;

use serde::{Serialize, Serializer};

use crate::uoid::{npu_id_get, object_type_get, uoid_create, SaiObjectType};

/// Raw SAI object ID type (matches sai_object_id_t in C).
pub type RawSaiObjectId = u64;

/// Marker trait for SAI object kinds.
///
/// Each SAI object type implements this trait to enable compile-time
/// type checking of object IDs.
pub trait SaiObjectKind: Send + Sync + 'static {
    /// Returns the SAI object type name for debugging.
    fn type_name() -> &'static str;

    /// Returns the object type discriminator embedded in handles of this kind.
    fn object_type() -> SaiObjectType;
}

/// A type-safe SAI object ID.
///
/// The phantom type parameter `T` indicates what kind of SAI object this
/// ID refers to. IDs order by their raw value so they can key ordered
/// object stores.
///
/// # Examples
///
/// ```
/// use sonic_sai::{QueueOid, SchedulerGroupOid};
///
/// let queue = QueueOid::from_npu_id(7);
/// let group = SchedulerGroupOid::from_npu_id(7);
///
/// // Same NPU index, different handles.
/// assert_ne!(queue.as_raw(), group.as_raw());
/// assert_eq!(queue.npu_id(), 7);
/// ```
#[derive(Clone, Copy)]
pub struct SaiObjectId<T: SaiObjectKind> {
    raw: RawSaiObjectId,
    _marker: PhantomData<T>,
}

impl<T: SaiObjectKind> SaiObjectId<T> {
    /// The null object ID (SAI_NULL_OBJECT_ID).
    pub const NULL: Self = Self {
        raw: 0,
        _marker: PhantomData,
    };

    /// Creates a new object ID from a raw value.
    ///
    /// Returns `None` if the raw value is 0 (null object ID) or if the
    /// embedded object type does not match `T`.
    pub fn from_raw(raw: RawSaiObjectId) -> Option<Self> {
        if raw == 0 || object_type_get(raw) != Some(T::object_type()) {
            None
        } else {
            Some(Self {
                raw,
                _marker: PhantomData,
            })
        }
    }

    /// Creates a new object ID from a raw value, including null.
    ///
    /// Unlike `from_raw`, this performs no type check.
    pub const fn from_raw_unchecked(raw: RawSaiObjectId) -> Self {
        Self {
            raw,
            _marker: PhantomData,
        }
    }

    /// Creates a handle of this kind around a backend-local id.
    pub fn from_npu_id(npu_id: u64) -> Self {
        Self::from_raw_unchecked(uoid_create(T::object_type(), npu_id))
    }

    /// Returns the raw object ID value.
    pub const fn as_raw(&self) -> RawSaiObjectId {
        self.raw
    }

    /// Returns the backend-local id embedded in the handle.
    pub const fn npu_id(&self) -> u64 {
        npu_id_get(self.raw)
    }

    /// Returns true if this is a null object ID.
    pub const fn is_null(&self) -> bool {
        self.raw == 0
    }

    /// Returns true if this is a valid (non-null) object ID.
    pub const fn is_valid(&self) -> bool {
        self.raw != 0
    }

    /// Returns `None` for the null ID, `Some(self)` otherwise.
    pub const fn non_null(self) -> Option<Self> {
        if self.raw == 0 {
            None
        } else {
            Some(self)
        }
    }
}

impl<T: SaiObjectKind> fmt::Debug for SaiObjectId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(0x{:016x})", T::type_name(), self.raw)
    }
}

impl<T: SaiObjectKind> fmt::Display for SaiObjectId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016x}", self.raw)
    }
}

impl<T: SaiObjectKind> PartialEq for SaiObjectId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<T: SaiObjectKind> Eq for SaiObjectId<T> {}

impl<T: SaiObjectKind> PartialOrd for SaiObjectId<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: SaiObjectKind> Ord for SaiObjectId<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.raw.cmp(&other.raw)
    }
}

impl<T: SaiObjectKind> Hash for SaiObjectId<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<T: SaiObjectKind> Default for SaiObjectId<T> {
    fn default() -> Self {
        Self::NULL
    }
}

impl<T: SaiObjectKind> Serialize for SaiObjectId<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ============================================================================
// Object Kind Markers
// ============================================================================

macro_rules! define_object_kind {
    ($name:ident, $type_name:literal, $object_type:ident, $oid_alias:ident) => {
        #[doc = concat!("Marker type for SAI ", $type_name, " objects.")]
        #[derive(Debug, Clone, Copy)]
        pub struct $name;

        impl SaiObjectKind for $name {
            fn type_name() -> &'static str {
                $type_name
            }

            fn object_type() -> SaiObjectType {
                SaiObjectType::$object_type
            }
        }

        #[doc = concat!("Type alias for ", $type_name, " object IDs.")]
        pub type $oid_alias = SaiObjectId<$name>;
    };
}

define_object_kind!(SwitchKind, "Switch", Switch, SwitchOid);
define_object_kind!(PortKind, "Port", Port, PortOid);
define_object_kind!(AclEntryKind, "AclEntry", AclEntry, AclEntryOid);
define_object_kind!(PolicerKind, "Policer", Policer, PolicerOid);
define_object_kind!(WredKind, "Wred", Wred, WredOid);
define_object_kind!(QosMapKind, "QosMap", QosMap, QosMapOid);
define_object_kind!(QueueKind, "Queue", Queue, QueueOid);
define_object_kind!(SchedulerKind, "Scheduler", Scheduler, SchedulerOid);
define_object_kind!(SchedulerGroupKind, "SchedulerGroup", SchedulerGroup, SchedulerGroupOid);
define_object_kind!(BufferPoolKind, "BufferPool", BufferPool, BufferPoolOid);
define_object_kind!(BufferProfileKind, "BufferProfile", BufferProfile, BufferProfileOid);
define_object_kind!(
    IngressPriorityGroupKind,
    "IngressPriorityGroup",
    IngressPriorityGroup,
    IngressPriorityGroupOid
);
define_object_kind!(PortPoolKind, "PortPool", PortPool, PortPoolOid);
