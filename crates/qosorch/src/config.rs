//! Switch capability configuration.
//!
//! Holds the limits the QoS engine needs to know about the switch: queue
//! counts per port, PG count, hierarchy limits and buffer capacity. Loaded
//! from a JSON file or taken from [`QosSwitchConfig::default`].

use std::path::Path;

use serde::{Deserialize, Serialize};
use sonic_types::{QueueType, SchedulingType};

use crate::error::{QosError, QosResult};
use crate::sched_group::{HierarchyTemplate, TemplateChild, TemplateGroup, TemplateLevel};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QosSwitchConfig {
    pub max_uc_queues: u32,
    pub max_mc_queues: u32,
    /// Queues per port when unicast and multicast queues are not separate.
    pub max_queues: u32,
    pub separate_uc_mc: bool,
    pub num_pg: u32,
    pub max_hierarchy_levels: u32,
    pub max_childs_per_hierarchy_node: u32,
    /// When set, applications may not re-parent hierarchy nodes.
    pub hierarchy_fixed: bool,
    pub cell_size: u32,
    /// Switch buffer per direction, in KB.
    pub max_buffer_size_kb: u64,
    pub max_ingress_pools: u32,
    pub max_egress_pools: u32,
    pub cpu_port_queues: u32,
    pub port_hierarchy: Option<HierarchyTemplate>,
    pub cpu_hierarchy: Option<HierarchyTemplate>,
}

impl Default for QosSwitchConfig {
    fn default() -> Self {
        Self {
            max_uc_queues: 8,
            max_mc_queues: 8,
            max_queues: 16,
            separate_uc_mc: true,
            num_pg: 8,
            max_hierarchy_levels: 3,
            max_childs_per_hierarchy_node: 64,
            hierarchy_fixed: false,
            cell_size: 256,
            max_buffer_size_kb: 12 * 1024,
            max_ingress_pools: 4,
            max_egress_pools: 4,
            cpu_port_queues: 8,
            port_hierarchy: None,
            cpu_hierarchy: None,
        }
    }
}

impl QosSwitchConfig {
    /// Reads and validates a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> QosResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| QosError::Config(format!("{}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| QosError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> QosResult<()> {
        if self.max_hierarchy_levels == 0 {
            return Err(QosError::Config("max_hierarchy_levels must be at least 1".to_string()));
        }
        if self.max_childs_per_hierarchy_node == 0 {
            return Err(QosError::Config(
                "max_childs_per_hierarchy_node must be at least 1".to_string(),
            ));
        }
        let port_queues = if self.separate_uc_mc {
            self.max_uc_queues + self.max_mc_queues
        } else {
            self.max_queues
        };
        if port_queues == 0 {
            return Err(QosError::Config("ports need at least one queue".to_string()));
        }
        if self.cell_size == 0 {
            return Err(QosError::Config("cell_size must be non-zero".to_string()));
        }

        self.port_template().validate(
            self.max_hierarchy_levels,
            self.max_childs_per_hierarchy_node,
            &|t, i| i < self.port_queue_count(t),
        )?;
        self.cpu_template().validate(
            self.max_hierarchy_levels,
            self.max_childs_per_hierarchy_node,
            &|t, i| t == QueueType::All && i < self.cpu_port_queues,
        )
    }

    /// Number of front-panel port queues of `queue_type`.
    pub fn port_queue_count(&self, queue_type: QueueType) -> u32 {
        match (self.separate_uc_mc, queue_type) {
            (true, QueueType::Unicast) => self.max_uc_queues,
            (true, QueueType::Multicast) => self.max_mc_queues,
            (false, QueueType::All) => self.max_queues,
            _ => 0,
        }
    }

    /// Switch buffer per direction, in bytes.
    pub fn buffer_size_bytes(&self) -> u64 {
        self.max_buffer_size_kb * 1024
    }

    /// Front-panel hierarchy, configured or derived from the queue counts.
    pub fn port_template(&self) -> HierarchyTemplate {
        self.port_hierarchy
            .clone()
            .unwrap_or_else(|| self.default_port_template())
    }

    pub fn cpu_template(&self) -> HierarchyTemplate {
        self.cpu_hierarchy
            .clone()
            .unwrap_or_else(|| self.default_cpu_template())
    }

    // One level-1 group per queue index holding the UC and MC queue of
    // that index, all under a single root.
    fn default_port_template(&self) -> HierarchyTemplate {
        let per_index: Vec<Vec<TemplateChild>> = if self.separate_uc_mc {
            let n = self.max_uc_queues.max(self.max_mc_queues);
            (0..n)
                .map(|i| {
                    let mut children = Vec::new();
                    if i < self.max_uc_queues {
                        children.push(TemplateChild::queue(QueueType::Unicast, i));
                    }
                    if i < self.max_mc_queues {
                        children.push(TemplateChild::queue(QueueType::Multicast, i));
                    }
                    children
                })
                .collect()
        } else {
            (0..self.max_queues)
                .map(|i| vec![TemplateChild::queue(QueueType::All, i)])
                .collect()
        };

        if self.max_hierarchy_levels < 2 {
            let children: Vec<TemplateChild> = per_index.into_iter().flatten().collect();
            return flat_template(children);
        }

        let leaves: Vec<TemplateGroup> = per_index
            .into_iter()
            .enumerate()
            .map(|(i, children)| TemplateGroup {
                node_id: i as u32,
                sched_mode: SchedulingType::Dwrr,
                max_childs: children.len().max(1) as u32,
                children,
            })
            .collect();
        let root = TemplateGroup {
            node_id: 0,
            sched_mode: SchedulingType::Strict,
            max_childs: leaves.len().max(1) as u32,
            children: leaves.iter().map(|g| TemplateChild::group(g.node_id)).collect(),
        };

        HierarchyTemplate {
            levels: vec![
                TemplateLevel { groups: vec![root] },
                TemplateLevel { groups: leaves },
            ],
        }
    }

    fn default_cpu_template(&self) -> HierarchyTemplate {
        flat_template(
            (0..self.cpu_port_queues)
                .map(|i| TemplateChild::queue(QueueType::All, i))
                .collect(),
        )
    }
}

fn flat_template(children: Vec<TemplateChild>) -> HierarchyTemplate {
    HierarchyTemplate {
        levels: vec![TemplateLevel {
            groups: vec![TemplateGroup {
                node_id: 0,
                sched_mode: SchedulingType::Dwrr,
                max_childs: children.len().max(1) as u32,
                children,
            }],
        }],
    }
}
