//! Per-port scheduler hierarchy templates.
//!
//! A template describes, level by level, the scheduler groups a port gets
//! at bring-up and which queues or next-level groups hang under each of
//! them. Level 0 groups are roots.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use sonic_sai::{PortOid, SchedulerGroupOid};
use sonic_types::{QueueType, SchedulingType};

use crate::context::QosContext;
use crate::db::QosDb;
use crate::error::{QosError, QosResult};
use crate::sched_group::hierarchy::{self, HierarchyChild};
use crate::sched_group::orch::create_group_node;

/// Kind of a template child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateChildKind {
    Queue,
    Group,
}

/// One child slot of a template group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateChild {
    pub kind: TemplateChildKind,
    /// Queue index for queues, node id on the next level for groups.
    pub index: u32,
    #[serde(default)]
    pub queue_type: QueueType,
}

impl TemplateChild {
    pub fn queue(queue_type: QueueType, index: u32) -> Self {
        Self {
            kind: TemplateChildKind::Queue,
            index,
            queue_type,
        }
    }

    pub fn group(node_id: u32) -> Self {
        Self {
            kind: TemplateChildKind::Group,
            index: node_id,
            queue_type: QueueType::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateGroup {
    pub node_id: u32,
    #[serde(default)]
    pub sched_mode: SchedulingType,
    pub max_childs: u32,
    #[serde(default)]
    pub children: Vec<TemplateChild>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateLevel {
    pub groups: Vec<TemplateGroup>,
}

/// Scheduler hierarchy applied to a port at bring-up.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyTemplate {
    pub levels: Vec<TemplateLevel>,
}

impl HierarchyTemplate {
    /// Checks the template against the switch limits.
    ///
    /// `queue_exists` answers whether the port will own a queue of the
    /// given type and index.
    pub fn validate(
        &self,
        max_levels: u32,
        max_childs: u32,
        queue_exists: &dyn Fn(QueueType, u32) -> bool,
    ) -> QosResult<()> {
        if self.levels.is_empty() {
            return Err(QosError::Config("hierarchy template has no levels".to_string()));
        }
        if self.levels.len() > max_levels as usize {
            return Err(QosError::Config(format!(
                "hierarchy template has {} levels, switch supports {}",
                self.levels.len(),
                max_levels
            )));
        }

        let mut used_queues = HashSet::new();
        let mut referenced: BTreeSet<(usize, u32)> = BTreeSet::new();

        for (level, tl) in self.levels.iter().enumerate() {
            let mut ids = BTreeSet::new();
            for group in &tl.groups {
                if !ids.insert(group.node_id) {
                    return Err(QosError::Config(format!(
                        "duplicate node id {} on level {}",
                        group.node_id, level
                    )));
                }
                if group.max_childs == 0 || group.max_childs > max_childs {
                    return Err(QosError::Config(format!(
                        "node {}/{} max_childs {} outside 1..={}",
                        level, group.node_id, group.max_childs, max_childs
                    )));
                }
                if group.children.len() > group.max_childs as usize {
                    return Err(QosError::Config(format!(
                        "node {}/{} lists {} children, max_childs is {}",
                        level,
                        group.node_id,
                        group.children.len(),
                        group.max_childs
                    )));
                }
                for child in &group.children {
                    match child.kind {
                        TemplateChildKind::Queue => {
                            if !queue_exists(child.queue_type, child.index) {
                                return Err(QosError::Config(format!(
                                    "node {}/{} references missing {} queue {}",
                                    level, group.node_id, child.queue_type, child.index
                                )));
                            }
                            if !used_queues.insert((child.queue_type, child.index)) {
                                return Err(QosError::Config(format!(
                                    "{} queue {} has more than one parent",
                                    child.queue_type, child.index
                                )));
                            }
                        }
                        TemplateChildKind::Group => {
                            let next = level + 1;
                            let exists = self.levels.get(next).is_some_and(|l| {
                                l.groups.iter().any(|g| g.node_id == child.index)
                            });
                            if !exists {
                                return Err(QosError::Config(format!(
                                    "node {}/{} references missing group {}/{}",
                                    level, group.node_id, next, child.index
                                )));
                            }
                            if !referenced.insert((next, child.index)) {
                                return Err(QosError::Config(format!(
                                    "group {}/{} has more than one parent",
                                    next, child.index
                                )));
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }

    pub fn group_count(&self) -> usize {
        self.levels.iter().map(|l| l.groups.len()).sum()
    }
}

/// Creates the template's groups on `port` and wires queues and groups
/// under them.
///
/// The port's queues must already exist. On failure the partially built
/// hierarchy is left in place for the caller's teardown.
pub(crate) fn materialize(
    ctx: &QosContext,
    db: &mut QosDb,
    port: PortOid,
    template: &HierarchyTemplate,
) -> QosResult<()> {
    let mut nodes: BTreeMap<(usize, u32), SchedulerGroupOid> = BTreeMap::new();

    for (level, tl) in template.levels.iter().enumerate() {
        for group in &tl.groups {
            let sg = create_group_node(
                ctx,
                db,
                port,
                level as u32,
                group.max_childs,
                group.sched_mode,
            )?;
            nodes.insert((level, group.node_id), sg);
        }
    }

    for (level, tl) in template.levels.iter().enumerate() {
        for group in &tl.groups {
            let parent = node_at(&nodes, level, group.node_id)?;
            for child in &group.children {
                let child = match child.kind {
                    TemplateChildKind::Queue => {
                        let queue = db
                            .find_port_queue(port, child.queue_type, child.index)
                            .ok_or_else(|| {
                                QosError::Config(format!(
                                    "port {} has no {} queue {}",
                                    port, child.queue_type, child.index
                                ))
                            })?;
                        HierarchyChild::Queue(queue)
                    }
                    TemplateChildKind::Group => {
                        HierarchyChild::Group(node_at(&nodes, level + 1, child.index)?)
                    }
                };
                hierarchy::attach(ctx.npu(), db, child, parent)?;
            }
        }
    }
    Ok(())
}

fn node_at(
    nodes: &BTreeMap<(usize, u32), SchedulerGroupOid>,
    level: usize,
    node_id: u32,
) -> QosResult<SchedulerGroupOid> {
    nodes
        .get(&(level, node_id))
        .copied()
        .ok_or_else(|| QosError::Config(format!("template has no group {}/{}", level, node_id)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_level() -> HierarchyTemplate {
        HierarchyTemplate {
            levels: vec![
                TemplateLevel {
                    groups: vec![TemplateGroup {
                        node_id: 0,
                        sched_mode: SchedulingType::Strict,
                        max_childs: 2,
                        children: vec![TemplateChild::group(0), TemplateChild::group(1)],
                    }],
                },
                TemplateLevel {
                    groups: vec![
                        TemplateGroup {
                            node_id: 0,
                            sched_mode: SchedulingType::Dwrr,
                            max_childs: 1,
                            children: vec![TemplateChild::queue(QueueType::Unicast, 0)],
                        },
                        TemplateGroup {
                            node_id: 1,
                            sched_mode: SchedulingType::Dwrr,
                            max_childs: 1,
                            children: vec![TemplateChild::queue(QueueType::Unicast, 1)],
                        },
                    ],
                },
            ],
        }
    }

    fn two_uc_queues(t: QueueType, i: u32) -> bool {
        t == QueueType::Unicast && i < 2
    }

    #[test]
    fn test_valid_template() {
        let t = two_level();
        assert!(t.validate(3, 8, &two_uc_queues).is_ok());
        assert_eq!(t.group_count(), 3);
    }

    #[test]
    fn test_too_many_levels() {
        assert!(matches!(
            two_level().validate(1, 8, &two_uc_queues),
            Err(QosError::Config(_))
        ));
    }

    #[test]
    fn test_max_childs_over_switch_limit() {
        assert!(two_level().validate(3, 1, &two_uc_queues).is_err());
    }

    #[test]
    fn test_missing_queue_rejected() {
        let mut t = two_level();
        t.levels[1].groups[1].children[0].index = 5;
        assert!(t.validate(3, 8, &two_uc_queues).is_err());
    }

    #[test]
    fn test_missing_group_rejected() {
        let mut t = two_level();
        t.levels[0].groups[0].children[1] = TemplateChild::group(9);
        assert!(t.validate(3, 8, &two_uc_queues).is_err());
    }

    #[test]
    fn test_double_parent_rejected() {
        let mut t = two_level();
        t.levels[1].groups[1].children[0] = TemplateChild::queue(QueueType::Unicast, 0);
        assert!(t.validate(3, 8, &two_uc_queues).is_err());
    }

    #[test]
    fn test_template_json_shape() {
        let json = r#"{"levels":[{"groups":[{"node_id":0,"max_childs":1,
            "children":[{"kind":"queue","index":3,"queue_type":"multicast"}]}]}]}"#;
        let t: HierarchyTemplate = serde_json::from_str(json).unwrap();
        assert_eq!(t.levels[0].groups[0].sched_mode, SchedulingType::Dwrr);
        assert_eq!(
            t.levels[0].groups[0].children[0],
            TemplateChild::queue(QueueType::Multicast, 3)
        );
    }
}
