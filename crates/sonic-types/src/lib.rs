//! Common SONiC QoS types.
//!
//! This crate provides type-safe representations of the values that flow
//! through the QoS control plane:
//!
//! - [`Dscp`], [`Dot1p`], [`TrafficClass`]: validated packet priority fields
//! - [`PacketColor`]: drop precedence assigned by meters and classifiers
//! - [`QosMapType`]: the per-port classification map slots
//! - [`QueueType`], [`SchedulingType`], [`MeterType`]: queue and scheduler modes
//! - [`BufferPoolType`], [`ThresholdMode`]: buffer pool accounting modes
//! - [`PolicerMode`], [`ColorSource`], [`PacketAction`], [`StormType`]: policer settings
//! - [`EcnMarkMode`]: WRED ECN marking behaviour

mod buffer;
mod map_type;
mod policer;
mod priority;
mod queue;
mod scheduling;
mod wred;

pub use buffer::{BufferPoolType, ThresholdMode};
pub use map_type::QosMapType;
pub use policer::{ColorSource, PacketAction, PolicerMode, StormType};
pub use priority::{Dot1p, Dscp, PacketColor, TrafficClass};
pub use queue::QueueType;
pub use scheduling::{MeterType, SchedulingType};
pub use wred::EcnMarkMode;

/// Common error type for parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid DSCP value: {0} (must be 0-63)")]
    InvalidDscp(u16),

    #[error("invalid 802.1p priority: {0} (must be 0-7)")]
    InvalidDot1p(u16),

    #[error("invalid traffic class: {0} (must be 0-15)")]
    InvalidTrafficClass(u16),

    #[error("invalid packet color: {0}")]
    InvalidColor(String),

    #[error("invalid QoS map type: {0}")]
    InvalidMapType(String),

    #[error("invalid queue type: {0}")]
    InvalidQueueType(String),

    #[error("invalid scheduling mode: {0}")]
    InvalidSchedulingType(String),

    #[error("invalid buffer setting: {0}")]
    InvalidBufferSetting(String),

    #[error("invalid policer setting: {0}")]
    InvalidPolicerSetting(String),

    #[error("invalid ECN mark mode: {0}")]
    InvalidEcnMode(String),
}
