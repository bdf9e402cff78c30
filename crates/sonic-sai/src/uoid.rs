//! Unified object ID (UOID) encoding.
//!
//! A handle packs the object type into bits 48..60 and the backend-local
//! id into bits 0..48:
//!
//! ```text
//!  63    60 59          48 47                                  0
//! +--------+--------------+------------------------------------+
//! | unused | object type  |          NPU object id             |
//! +--------+--------------+------------------------------------+
//! ```
//!
//! Buffer pool and priority group NPU ids are packed once more so that the
//! pool type and the owning port can be recovered from the id alone.

use std::fmt;

const OBJ_TYPE_BITPOS: u32 = 48;
const OBJ_TYPE_MASK: u64 = 0x0FFF_0000_0000_0000;
const NPU_OBJ_ID_MASK: u64 = 0x0000_FFFF_FFFF_FFFF;

const POOL_TYPE_BITPOS: u32 = 16;
const POOL_TYPE_MASK: u64 = 0xFFFF_0000;
const POOL_SPID_MASK: u64 = 0x0000_FFFF;

const PG_PORT_BITPOS: u32 = 16;
const PG_PORT_MASK: u64 = 0xFFFF_0000;
const PG_NUM_MASK: u64 = 0x0000_FFFF;

/// SAI object type discriminator (matches sai_object_type_t values).
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SaiObjectType {
    Null = 0,
    Port = 1,
    AclEntry = 8,
    Policer = 18,
    Wred = 19,
    QosMap = 20,
    Queue = 21,
    Scheduler = 22,
    SchedulerGroup = 23,
    BufferPool = 24,
    BufferProfile = 25,
    IngressPriorityGroup = 26,
    Switch = 33,
    PortPool = 84,
}

impl SaiObjectType {
    /// Converts a raw discriminator.
    pub const fn from_raw(value: u16) -> Option<Self> {
        match value {
            0 => Some(SaiObjectType::Null),
            1 => Some(SaiObjectType::Port),
            8 => Some(SaiObjectType::AclEntry),
            18 => Some(SaiObjectType::Policer),
            19 => Some(SaiObjectType::Wred),
            20 => Some(SaiObjectType::QosMap),
            21 => Some(SaiObjectType::Queue),
            22 => Some(SaiObjectType::Scheduler),
            23 => Some(SaiObjectType::SchedulerGroup),
            24 => Some(SaiObjectType::BufferPool),
            25 => Some(SaiObjectType::BufferProfile),
            26 => Some(SaiObjectType::IngressPriorityGroup),
            33 => Some(SaiObjectType::Switch),
            84 => Some(SaiObjectType::PortPool),
            _ => None,
        }
    }
}

impl fmt::Display for SaiObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SaiObjectType::Null => "SAI_OBJECT_TYPE_NULL",
            SaiObjectType::Port => "SAI_OBJECT_TYPE_PORT",
            SaiObjectType::AclEntry => "SAI_OBJECT_TYPE_ACL_ENTRY",
            SaiObjectType::Policer => "SAI_OBJECT_TYPE_POLICER",
            SaiObjectType::Wred => "SAI_OBJECT_TYPE_WRED",
            SaiObjectType::QosMap => "SAI_OBJECT_TYPE_QOS_MAP",
            SaiObjectType::Queue => "SAI_OBJECT_TYPE_QUEUE",
            SaiObjectType::Scheduler => "SAI_OBJECT_TYPE_SCHEDULER",
            SaiObjectType::SchedulerGroup => "SAI_OBJECT_TYPE_SCHEDULER_GROUP",
            SaiObjectType::BufferPool => "SAI_OBJECT_TYPE_BUFFER_POOL",
            SaiObjectType::BufferProfile => "SAI_OBJECT_TYPE_BUFFER_PROFILE",
            SaiObjectType::IngressPriorityGroup => "SAI_OBJECT_TYPE_INGRESS_PRIORITY_GROUP",
            SaiObjectType::Switch => "SAI_OBJECT_TYPE_SWITCH",
            SaiObjectType::PortPool => "SAI_OBJECT_TYPE_PORT_POOL",
        };
        write!(f, "{}", s)
    }
}

/// Builds a handle from an object type and a backend-local id.
pub const fn uoid_create(object_type: SaiObjectType, npu_id: u64) -> u64 {
    ((object_type as u64) << OBJ_TYPE_BITPOS) & OBJ_TYPE_MASK | (npu_id & NPU_OBJ_ID_MASK)
}

/// Returns the object type embedded in a handle.
///
/// `None` when the discriminator is not a known type.
pub const fn object_type_get(uoid: u64) -> Option<SaiObjectType> {
    SaiObjectType::from_raw(((uoid & OBJ_TYPE_MASK) >> OBJ_TYPE_BITPOS) as u16)
}

/// Returns the backend-local id embedded in a handle.
pub const fn npu_id_get(uoid: u64) -> u64 {
    uoid & NPU_OBJ_ID_MASK
}

/// Packs a pool type discriminator and a per-type sequence id.
pub const fn pool_npu_id_create(pool_type: u32, spid: u32) -> u64 {
    (((pool_type as u64) << POOL_TYPE_BITPOS) & POOL_TYPE_MASK) | ((spid as u64) & POOL_SPID_MASK)
}

/// Returns the per-type sequence id of a packed pool id.
pub const fn pool_spid_get(npu_id: u64) -> u32 {
    (npu_id & POOL_SPID_MASK) as u32
}

/// Returns the pool type discriminator of a packed pool id.
pub const fn pool_type_get(npu_id: u64) -> u32 {
    ((npu_id & POOL_TYPE_MASK) >> POOL_TYPE_BITPOS) as u32
}

/// Packs a port number and a PG index.
pub const fn pg_npu_id_create(port: u32, pg: u32) -> u64 {
    (((port as u64) << PG_PORT_BITPOS) & PG_PORT_MASK) | ((pg as u64) & PG_NUM_MASK)
}

/// Returns the PG index of a packed PG id.
pub const fn pg_num_get(npu_id: u64) -> u32 {
    (npu_id & PG_NUM_MASK) as u32
}

/// Returns the port number of a packed PG id.
pub const fn pg_port_get(npu_id: u64) -> u32 {
    ((npu_id & PG_PORT_MASK) >> PG_PORT_BITPOS) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_uoid_roundtrip() {
        let uoid = uoid_create(SaiObjectType::SchedulerGroup, 0x1234);
        assert_eq!(object_type_get(uoid), Some(SaiObjectType::SchedulerGroup));
        assert_eq!(npu_id_get(uoid), 0x1234);
    }

    #[test]
    fn test_uoid_truncates_npu_id() {
        let uoid = uoid_create(SaiObjectType::Queue, u64::MAX);
        assert_eq!(object_type_get(uoid), Some(SaiObjectType::Queue));
        assert_eq!(npu_id_get(uoid), NPU_OBJ_ID_MASK);
    }

    #[test]
    fn test_unknown_type() {
        assert_eq!(object_type_get(0x0FFF_0000_0000_0001), None);
    }

    #[test]
    fn test_pool_packing_edges() {
        for (t, spid) in [(0, 0), (1, 0xFFFF), (0xFFFF, 1), (1, 7)] {
            let id = pool_npu_id_create(t, spid);
            assert_eq!(pool_type_get(id), t);
            assert_eq!(pool_spid_get(id), spid);
        }
    }

    #[test]
    fn test_pg_packing_is_collision_free() {
        let mut seen = HashSet::new();
        for port in [0u32, 1, 255, 0xFFFF] {
            for pg in [0u32, 7, 0xFFFF] {
                let id = pg_npu_id_create(port, pg);
                assert!(seen.insert(id));
                assert_eq!(pg_port_get(id), port);
                assert_eq!(pg_num_get(id), pg);
            }
        }
    }
}
