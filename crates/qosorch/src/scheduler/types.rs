//! Scheduler profile node and attributes.

use serde::Serialize;
use sonic_orch_common::IdList;
use sonic_sai::{PortOid, QueueOid, SchedulerGroupOid, SchedulerOid};
use sonic_types::{MeterType, SchedulingType};

use crate::consts::{SCHED_DEFAULT_WEIGHT, SCHED_MAX_WEIGHT, SCHED_MIN_WEIGHT};
use crate::error::{QosError, QosResult};

/// Scheduling and shaping parameters of a scheduler profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SchedulerConfig {
    pub algorithm: SchedulingType,
    pub weight: u32,
    pub shaper_type: MeterType,
    pub min_bandwidth_rate: u64,
    pub min_bandwidth_burst: u64,
    pub max_bandwidth_rate: u64,
    pub max_bandwidth_burst: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            algorithm: SchedulingType::Dwrr,
            weight: SCHED_DEFAULT_WEIGHT,
            shaper_type: MeterType::Bytes,
            min_bandwidth_rate: 0,
            min_bandwidth_burst: 0,
            max_bandwidth_rate: 0,
            max_bandwidth_burst: 0,
        }
    }
}

impl SchedulerConfig {
    /// Validates and stores one attribute.
    pub fn apply(&mut self, attr: &SchedulerAttr) -> QosResult<()> {
        match *attr {
            SchedulerAttr::SchedulingType(t) => self.algorithm = t,
            SchedulerAttr::Weight(w) => {
                if !(SCHED_MIN_WEIGHT..=SCHED_MAX_WEIGHT).contains(&w) {
                    return Err(QosError::invalid_attr_value(format!(
                        "scheduler weight {} outside {}..={}",
                        w, SCHED_MIN_WEIGHT, SCHED_MAX_WEIGHT
                    )));
                }
                self.weight = w;
            }
            SchedulerAttr::MeterType(m) => self.shaper_type = m,
            SchedulerAttr::MinBandwidthRate(v) => self.min_bandwidth_rate = v,
            SchedulerAttr::MinBandwidthBurstRate(v) => self.min_bandwidth_burst = v,
            SchedulerAttr::MaxBandwidthRate(v) => self.max_bandwidth_rate = v,
            SchedulerAttr::MaxBandwidthBurstRate(v) => self.max_bandwidth_burst = v,
        }
        Ok(())
    }

    /// Returns this config's value for the attribute `id`.
    pub fn get(&self, id: SchedulerAttrId) -> SchedulerAttr {
        match id {
            SchedulerAttrId::SchedulingType => SchedulerAttr::SchedulingType(self.algorithm),
            SchedulerAttrId::Weight => SchedulerAttr::Weight(self.weight),
            SchedulerAttrId::MeterType => SchedulerAttr::MeterType(self.shaper_type),
            SchedulerAttrId::MinBandwidthRate => SchedulerAttr::MinBandwidthRate(self.min_bandwidth_rate),
            SchedulerAttrId::MinBandwidthBurstRate => {
                SchedulerAttr::MinBandwidthBurstRate(self.min_bandwidth_burst)
            }
            SchedulerAttrId::MaxBandwidthRate => SchedulerAttr::MaxBandwidthRate(self.max_bandwidth_rate),
            SchedulerAttrId::MaxBandwidthBurstRate => {
                SchedulerAttr::MaxBandwidthBurstRate(self.max_bandwidth_burst)
            }
        }
    }
}

/// A scheduler profile and everything it is applied to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchedulerNode {
    pub scheduler_id: SchedulerOid,
    pub config: SchedulerConfig,
    #[serde(skip)]
    pub ports: IdList<PortOid>,
    #[serde(skip)]
    pub queues: IdList<QueueOid>,
    #[serde(skip)]
    pub groups: IdList<SchedulerGroupOid>,
}

impl SchedulerNode {
    pub fn new(scheduler_id: SchedulerOid, config: SchedulerConfig) -> Self {
        Self {
            scheduler_id,
            config,
            ports: IdList::new(),
            queues: IdList::new(),
            groups: IdList::new(),
        }
    }

    pub fn is_referenced(&self) -> bool {
        !(self.ports.is_empty() && self.queues.is_empty() && self.groups.is_empty())
    }

    pub fn ref_count(&self) -> usize {
        self.ports.len() + self.queues.len() + self.groups.len()
    }
}

/// An object a scheduler profile can be applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchedulerTarget {
    Queue(QueueOid),
    Group(SchedulerGroupOid),
    Port(PortOid),
}

impl SchedulerTarget {
    pub fn as_raw(&self) -> u64 {
        match self {
            SchedulerTarget::Queue(q) => q.as_raw(),
            SchedulerTarget::Group(g) => g.as_raw(),
            SchedulerTarget::Port(p) => p.as_raw(),
        }
    }
}

/// Scheduler attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerAttr {
    SchedulingType(SchedulingType),
    Weight(u32),
    MeterType(MeterType),
    MinBandwidthRate(u64),
    MinBandwidthBurstRate(u64),
    MaxBandwidthRate(u64),
    MaxBandwidthBurstRate(u64),
}

impl SchedulerAttr {
    pub fn id(&self) -> SchedulerAttrId {
        match self {
            SchedulerAttr::SchedulingType(_) => SchedulerAttrId::SchedulingType,
            SchedulerAttr::Weight(_) => SchedulerAttrId::Weight,
            SchedulerAttr::MeterType(_) => SchedulerAttrId::MeterType,
            SchedulerAttr::MinBandwidthRate(_) => SchedulerAttrId::MinBandwidthRate,
            SchedulerAttr::MinBandwidthBurstRate(_) => SchedulerAttrId::MinBandwidthBurstRate,
            SchedulerAttr::MaxBandwidthRate(_) => SchedulerAttrId::MaxBandwidthRate,
            SchedulerAttr::MaxBandwidthBurstRate(_) => SchedulerAttrId::MaxBandwidthBurstRate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchedulerAttrId {
    SchedulingType,
    Weight,
    MeterType,
    MinBandwidthRate,
    MinBandwidthBurstRate,
    MaxBandwidthRate,
    MaxBandwidthBurstRate,
}
