//! Re-programming every user of a scheduler profile after a parameter
//! change.
//!
//! Users are visited in three stages: queues, then scheduler groups, then
//! ports. Each stage counts the targets it has re-programmed. When a target
//! fails, the counted targets of every stage are moved back to the old
//! parameters (ports, then groups, then queues, each newest first) and the
//! original failure is returned.

use serde_json::json;
use sonic_sai::SaiError;

use super::types::{SchedulerNode, SchedulerTarget};
use crate::audit::{AuditCategory, AuditRecord};
use crate::npu::NpuApiTable;
use crate::{audit_log, error_log};

const STAGES: usize = 3;

fn stage_targets(node: &SchedulerNode) -> [Vec<SchedulerTarget>; STAGES] {
    [
        node.queues.iter().map(SchedulerTarget::Queue).collect(),
        node.groups.iter().map(SchedulerTarget::Group).collect(),
        node.ports.iter().map(SchedulerTarget::Port).collect(),
    ]
}

/// Pushes `new` to every target of `old`. On failure the targets already
/// done are reverted before returning.
pub(crate) fn reapply(npu: &NpuApiTable, old: &SchedulerNode, new: &SchedulerNode) -> Result<(), SaiError> {
    let stages = stage_targets(old);
    let mut applied = [0usize; STAGES];

    for (stage, targets) in stages.iter().enumerate() {
        for &target in targets {
            if let Err(e) = npu.scheduler.scheduler_set(target, Some(old), Some(new)) {
                audit_log!(AuditRecord::new(AuditCategory::Reapply, "SchedulerOrch", "reapply")
                    .with_object_id(old.scheduler_id.to_string())
                    .with_object_type("scheduler")
                    .with_details(json!({
                        "failed_target": format!("{:#x}", target.as_raw()),
                        "queues_done": applied[0],
                        "groups_done": applied[1],
                        "ports_done": applied[2],
                    }))
                    .with_error(e.to_string()));
                revert(npu, old, new, &stages, &applied);
                return Err(e);
            }
            applied[stage] += 1;
        }
    }
    Ok(())
}

fn revert(
    npu: &NpuApiTable,
    old: &SchedulerNode,
    new: &SchedulerNode,
    stages: &[Vec<SchedulerTarget>; STAGES],
    applied: &[usize; STAGES],
) {
    for stage in (0..STAGES).rev() {
        for &target in stages[stage][..applied[stage]].iter().rev() {
            if let Err(e) = npu.scheduler.scheduler_set(target, Some(new), Some(old)) {
                error_log!(
                    "SchedulerOrch",
                    scheduler = %old.scheduler_id,
                    target = target.as_raw(),
                    error = %e,
                    "failed to restore scheduler parameters"
                );
            }
        }
    }
}
