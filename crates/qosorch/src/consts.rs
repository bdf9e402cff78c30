//! QoS limits and defaults.

pub const MAX_DSCP: u8 = 64;
pub const MAX_DOT1P: u8 = 8;
pub const MAX_TC: u8 = 16;
pub const MAX_COLORS: u8 = 3;
pub const MAX_PFC_PRI: u8 = 8;

/// TC reported for a PG when the port has no TC-to-PG map.
pub const DEFAULT_TC: u8 = 0;
pub const DEFAULT_PG: u8 = 7;

pub const POLICER_MAX_ACTION: usize = 3;

pub const WRED_MAX_DROP_PROB: u32 = 100;
pub const WRED_MAX_WEIGHT: u8 = 15;

pub const SCHED_DEFAULT_WEIGHT: u32 = 1;
pub const SCHED_MIN_WEIGHT: u32 = 1;
pub const SCHED_MAX_WEIGHT: u32 = 100;

/// Child index of a node with no parent.
pub const CHILD_INDEX_INVALID: u32 = 0xFFFF_FFFF;
pub const QUEUE_INDEX_INVALID: u32 = 0xFF;

/// Id space sizes of the simulation backend.
pub mod vm {
    pub const MAX_QUEUES: u32 = 4096;
    pub const MAX_SCHEDULERS: u32 = 4096;
    pub const MAX_SCHED_GROUPS: u32 = 4096;
    pub const MAX_BUFFER_PROFILES: u32 = 4096;
    pub const MAX_PORT_POOLS: u32 = 4096;
    pub const MAX_WRED: u32 = 128;
    pub const MAX_MAPS: u32 = 4096;
    pub const MAX_POLICERS: u32 = 4096;
}
