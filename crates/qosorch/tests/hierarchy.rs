//! Scheduler hierarchy moves that must be rejected or undone.

mod common;

use common::Harness;
use pretty_assertions::assert_eq;
use sonic_qosorch::queue::QueueAttr;
use sonic_qosorch::sched_group::SchedGroupAttr;
use sonic_qosorch::{PortOid, QosDb, QosError, QueueOrch, QueueType, SchedGroupOrch, SchedulerGroupOid};

fn assert_child_slots_consistent(db: &QosDb) {
    for group in db.sched_groups.values() {
        assert_eq!(group.child_count, group.child_index_bitmap.used(), "group {}", group.sg_id);
        assert_eq!(group.child_count as usize, group.children.len(), "group {}", group.sg_id);
        assert!(group.child_count <= group.max_childs, "group {}", group.sg_id);
    }
}

fn level2_group(groups: &mut SchedGroupOrch, port: PortOid, max_childs: u32) -> SchedulerGroupOid {
    groups
        .create(&[
            SchedGroupAttr::Port(port),
            SchedGroupAttr::Level(2),
            SchedGroupAttr::MaxChilds(max_childs),
        ])
        .unwrap()
}

#[test]
fn test_full_parent_rejects_move() {
    let h = Harness::new();
    let port = h.port(1);
    let mut groups = SchedGroupOrch::new(h.ctx.clone());
    let mut queues = QueueOrch::new(h.ctx.clone());

    let full = level2_group(&mut groups, port, 1);
    let (q0, q1) = {
        let db = h.ctx.lock();
        (
            db.find_port_queue(port, QueueType::Unicast, 0).unwrap(),
            db.find_port_queue(port, QueueType::Unicast, 1).unwrap(),
        )
    };
    queues.set_attribute(q0, QueueAttr::ParentSchedulerNode(full)).unwrap();
    let q1_parent = h.ctx.lock().queue(q1).unwrap().parent_id;

    let before = h.ctx.snapshot();
    let err = queues.set_attribute(q1, QueueAttr::ParentSchedulerNode(full)).unwrap_err();
    assert!(matches!(err, QosError::InvalidParameter(_)));
    assert_eq!(h.ctx.snapshot(), before);

    let db = h.ctx.lock();
    assert_eq!(db.queue(q1).unwrap().parent_id, q1_parent);
    assert_eq!(db.sched_group(full).unwrap().child_count, 1);
    assert_child_slots_consistent(&db);
}

#[test]
fn test_move_across_ports_rejected() {
    let h = Harness::new();
    let port1 = h.port(1);
    let port2 = h.port(2);
    let mut groups = SchedGroupOrch::new(h.ctx.clone());
    let mut queues = QueueOrch::new(h.ctx.clone());

    let foreign = level2_group(&mut groups, port2, 4);
    let q = h.ctx.lock().find_port_queue(port1, QueueType::Unicast, 0).unwrap();

    let before = h.ctx.snapshot();
    let err = queues.set_attribute(q, QueueAttr::ParentSchedulerNode(foreign)).unwrap_err();
    assert!(matches!(err, QosError::InvalidParameter(_)));
    assert_eq!(h.ctx.snapshot(), before);
    assert!(!h.ctx.lock().port(port1).unwrap().is_app_hqos_init);
    assert_child_slots_consistent(&h.ctx.lock());
}

#[test]
fn test_failed_modify_parent_releases_slot() {
    let h = Harness::new();
    let port = h.port(1);
    let mut groups = SchedGroupOrch::new(h.ctx.clone());
    let mut queues = QueueOrch::new(h.ctx.clone());

    let target = level2_group(&mut groups, port, 4);
    let q = h.ctx.lock().find_port_queue(port, QueueType::Unicast, 0).unwrap();

    let before = h.ctx.snapshot();
    h.queues.fail_after(0);
    let err = queues.set_attribute(q, QueueAttr::ParentSchedulerNode(target)).unwrap_err();
    assert!(matches!(err, QosError::Hardware(_)));
    assert_eq!(h.ctx.snapshot(), before);
    assert_child_slots_consistent(&h.ctx.lock());

    queues.set_attribute(q, QueueAttr::ParentSchedulerNode(target)).unwrap();
    let db = h.ctx.lock();
    assert_eq!(db.queue(q).unwrap().parent_id, target);
    assert_eq!(db.queue(q).unwrap().child_index, 0);
    assert_child_slots_consistent(&db);
}

#[test]
fn test_failed_attach_releases_slot() {
    let h = Harness::new();
    let port = h.port(1);
    let mut groups = SchedGroupOrch::new(h.ctx.clone());
    let mut queues = QueueOrch::new(h.ctx.clone());

    let target = level2_group(&mut groups, port, 4);
    let q = h.ctx.lock().find_port_queue(port, QueueType::Unicast, 0).unwrap();
    queues
        .set_attribute(q, QueueAttr::ParentSchedulerNode(SchedulerGroupOid::NULL))
        .unwrap();

    let before = h.ctx.snapshot();
    h.queues.fail_after(0);
    let err = queues.set_attribute(q, QueueAttr::ParentSchedulerNode(target)).unwrap_err();
    assert!(matches!(err, QosError::Hardware(_)));
    assert_eq!(h.ctx.snapshot(), before);
    assert!(h.ctx.lock().queue(q).unwrap().parent_id.is_null());

    queues.set_attribute(q, QueueAttr::ParentSchedulerNode(target)).unwrap();
    let db = h.ctx.lock();
    assert_eq!(db.sched_group(target).unwrap().child_count, 1);
    assert_eq!(db.queue(q).unwrap().child_index, 0);
    assert_child_slots_consistent(&db);
}

#[test]
fn test_template_hierarchy_slots_consistent() {
    let h = Harness::new();
    h.port(1);
    h.port(2);
    assert_child_slots_consistent(&h.ctx.lock());
}
