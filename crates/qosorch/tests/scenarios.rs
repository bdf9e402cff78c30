//! Cross-orchestrator scenarios over the VM backend.

mod common;

use common::{Harness, PortMapCall, ProfileApplyCall, SchedulerSetCall, WredLinkCall};
use pretty_assertions::assert_eq;
use sonic_qosorch::buffer::{BufferPoolAttr, BufferPoolAttrId, BufferProfileAttr, BufferTarget, PgAttr, PgAttrId};
use sonic_qosorch::port::PortQosAttr;
use sonic_qosorch::qos_map::QosMapAttr;
use sonic_qosorch::queue::QueueAttr;
use sonic_qosorch::sched_group::SchedGroupAttr;
use sonic_qosorch::scheduler::{SchedulerAttr, SchedulerAttrId, SchedulerTarget};
use sonic_qosorch::wred::{WredAttr, WredAttrId, WredLinkTarget};
use sonic_qosorch::{
    BufferOrch, BufferPoolOid, BufferPoolType, PortOid, PortQosOrch, QosError, QosMapOid, QosMapOrch,
    QosMapType, QueueOid, QueueOrch, QueueType, SchedGroupOrch, SchedulerOrch, WredOrch,
};

fn shared(buffers: &BufferOrch, pool: BufferPoolOid) -> u64 {
    match buffers.get_pool_attribute(pool, &[BufferPoolAttrId::SharedSize]).unwrap()[..] {
        [BufferPoolAttr::SharedSize(v)] => v,
        ref other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_pool_capacity_drains_per_apply() {
    let h = Harness::new();
    let port = h.port(1);
    let mut buffers = BufferOrch::new(h.ctx.clone());

    let pool = buffers
        .create_pool(&[BufferPoolAttr::Type(BufferPoolType::Ingress), BufferPoolAttr::Size(1000)])
        .unwrap();
    let profiles: Vec<_> = (0..3)
        .map(|_| {
            buffers
                .create_profile(&[BufferProfileAttr::PoolId(pool), BufferProfileAttr::BufferSize(200)])
                .unwrap()
        })
        .collect();
    // creating profiles reserves nothing
    assert_eq!(shared(&buffers, pool), 1000);

    let pgs = buffers.port_pg_list(port).unwrap();
    for (i, (pg, profile)) in pgs.iter().zip(&profiles).enumerate() {
        buffers.set_pg_attribute(*pg, PgAttr::BufferProfile(*profile)).unwrap();
        assert_eq!(shared(&buffers, pool), 1000 - 200 * (i as u64 + 1));
    }

    let big = buffers
        .create_profile(&[BufferProfileAttr::PoolId(pool), BufferProfileAttr::BufferSize(900)])
        .unwrap();
    let before = h.ctx.snapshot();
    let err = buffers.set_pg_attribute(pgs[3], PgAttr::BufferProfile(big)).unwrap_err();
    assert!(matches!(err, QosError::InsufficientResources(_)));
    assert_eq!(h.ctx.snapshot(), before);
    assert_eq!(shared(&buffers, pool), 400);
    assert_eq!(buffers.stats().capacity_denials, 1);
}

#[test]
fn test_queue_moves_between_groups() {
    let h = Harness::new();
    let port = h.port(1);
    let mut groups = SchedGroupOrch::new(h.ctx.clone());
    let mut queues = QueueOrch::new(h.ctx.clone());

    let create = |groups: &mut SchedGroupOrch| {
        groups
            .create(&[SchedGroupAttr::Port(port), SchedGroupAttr::Level(2), SchedGroupAttr::MaxChilds(4)])
            .unwrap()
    };
    let a = create(&mut groups);
    let b = create(&mut groups);
    let q1 = h.ctx.lock().find_port_queue(port, QueueType::Unicast, 0).unwrap();

    queues.set_attribute(q1, QueueAttr::ParentSchedulerNode(a)).unwrap();
    assert_eq!(h.ctx.lock().queue(q1).unwrap().child_index, 0);

    queues.set_attribute(q1, QueueAttr::ParentSchedulerNode(b)).unwrap();

    let db = h.ctx.lock();
    let queue = db.queue(q1).unwrap();
    let group_a = db.sched_group(a).unwrap();
    let group_b = db.sched_group(b).unwrap();
    assert_eq!(queue.parent_id, b);
    assert_eq!(group_a.child_count, 0);
    assert!(!group_a.child_index_bitmap.is_used(0));
    assert_eq!(group_b.child_count, 1);
    assert!(group_b.child_index_bitmap.is_used(queue.child_index));
    assert_eq!(group_b.children.len(), 1);
    assert!(db.port(port).unwrap().is_app_hqos_init);
}

#[test]
fn test_dot1p_removal_reinstalls_dscp() {
    let h = Harness::new();
    let port = h.port(1);
    let mut maps = QosMapOrch::new(h.ctx.clone());

    let dot1p = maps.create(&[QosMapAttr::Type(QosMapType::Dot1pToTc)]).unwrap();
    let dscp = maps.create(&[QosMapAttr::Type(QosMapType::DscpToTc)]).unwrap();
    maps.bind_port(port, QosMapType::Dot1pToTc, dot1p).unwrap();
    maps.bind_port(port, QosMapType::DscpToTc, dscp).unwrap();
    h.maps.clear();

    maps.bind_port(port, QosMapType::Dot1pToTc, QosMapOid::NULL).unwrap();
    assert_eq!(
        h.maps.calls(),
        vec![
            PortMapCall { port, map: dot1p, map_type: QosMapType::Dot1pToTc, enable: false },
            PortMapCall { port, map: dscp, map_type: QosMapType::DscpToTc, enable: true },
        ]
    );
    assert!(maps.ports(dot1p).unwrap().is_empty());
    assert_eq!(maps.ports(dscp).unwrap(), vec![port]);
}

#[test]
fn test_dscp_removal_without_dot1p_resets_default() {
    let h = Harness::new();
    let port = h.port(1);
    let mut maps = QosMapOrch::new(h.ctx.clone());

    let dscp = maps.create(&[QosMapAttr::Type(QosMapType::DscpToTc)]).unwrap();
    maps.bind_port(port, QosMapType::DscpToTc, dscp).unwrap();
    h.maps.clear();

    maps.bind_port(port, QosMapType::DscpToTc, QosMapOid::NULL).unwrap();
    assert_eq!(
        h.maps.calls(),
        vec![
            PortMapCall { port, map: dscp, map_type: QosMapType::DscpToTc, enable: false },
            PortMapCall { port, map: QosMapOid::NULL, map_type: QosMapType::Dot1pToTc, enable: true },
        ]
    );
}

#[test]
fn test_dscp_removal_reinstalls_dot1p_color() {
    let h = Harness::new();
    let port = h.port(1);
    let mut maps = QosMapOrch::new(h.ctx.clone());

    let dot1p_color = maps.create(&[QosMapAttr::Type(QosMapType::Dot1pToColor)]).unwrap();
    let dscp_color = maps.create(&[QosMapAttr::Type(QosMapType::DscpToColor)]).unwrap();
    maps.bind_port(port, QosMapType::Dot1pToColor, dot1p_color).unwrap();
    maps.bind_port(port, QosMapType::DscpToColor, dscp_color).unwrap();
    h.maps.clear();

    maps.bind_port(port, QosMapType::DscpToColor, QosMapOid::NULL).unwrap();
    assert_eq!(
        h.maps.calls()[1],
        PortMapCall { port, map: dot1p_color, map_type: QosMapType::Dot1pToColor, enable: true }
    );
}

#[test]
fn test_egress_map_removal_reinstalls_nothing() {
    let h = Harness::new();
    let port = h.port(1);
    let mut maps = QosMapOrch::new(h.ctx.clone());

    let tc_queue = maps.create(&[QosMapAttr::Type(QosMapType::TcToQueue)]).unwrap();
    let dscp = maps.create(&[QosMapAttr::Type(QosMapType::DscpToTc)]).unwrap();
    maps.bind_port(port, QosMapType::TcToQueue, tc_queue).unwrap();
    maps.bind_port(port, QosMapType::DscpToTc, dscp).unwrap();
    h.maps.clear();

    maps.bind_port(port, QosMapType::TcToQueue, QosMapOid::NULL).unwrap();
    assert_eq!(h.maps.calls().len(), 1);
}

#[test]
fn test_map_removal_is_idempotent() {
    let h = Harness::new();
    let port = h.port(1);
    let mut maps = QosMapOrch::new(h.ctx.clone());

    let dot1p = maps.create(&[QosMapAttr::Type(QosMapType::Dot1pToTc)]).unwrap();
    maps.bind_port(port, QosMapType::Dot1pToTc, dot1p).unwrap();
    maps.bind_port(port, QosMapType::Dot1pToTc, QosMapOid::NULL).unwrap();

    let after_first = h.ctx.snapshot();
    h.maps.clear();
    maps.bind_port(port, QosMapType::Dot1pToTc, QosMapOid::NULL).unwrap();
    assert!(h.maps.calls().is_empty());
    assert_eq!(h.ctx.snapshot(), after_first);
    maps.remove(dot1p).unwrap();
}

#[test]
fn test_scheduler_reapply_rolls_back() {
    let h = Harness::new();
    let port = h.port(1);
    let mut schedulers = SchedulerOrch::new(h.ctx.clone());
    let mut queues = QueueOrch::new(h.ctx.clone());
    let mut groups = SchedGroupOrch::new(h.ctx.clone());
    let mut ports = PortQosOrch::new(h.ctx.clone());

    let s = schedulers.create(&[SchedulerAttr::Weight(10)]).unwrap();
    let (qs, root) = {
        let db = h.ctx.lock();
        let node = db.port(port).unwrap();
        let qs: Vec<_> = node.queues.iter().take(3).collect();
        (qs, node.sched_groups[0].first().unwrap())
    };
    for q in &qs {
        queues.set_attribute(*q, QueueAttr::SchedulerProfile(s)).unwrap();
    }
    groups.set_attribute(root, SchedGroupAttr::SchedulerProfile(s)).unwrap();
    ports.set_attribute(port, PortQosAttr::SchedulerProfile(s)).unwrap();

    let before = h.ctx.snapshot();
    h.schedulers.clear();
    // the three queues and the group go through, the port fails
    h.schedulers.fail_after(4);

    let err = schedulers.set_attribute(s, SchedulerAttr::Weight(20)).unwrap_err();
    assert!(matches!(err, QosError::Hardware(_)));
    assert_eq!(h.ctx.snapshot(), before);
    assert_eq!(
        schedulers.get_attribute(s, &[SchedulerAttrId::Weight]).unwrap(),
        vec![SchedulerAttr::Weight(10)]
    );

    let call = |target, weight| SchedulerSetCall { target, weight: Some(weight) };
    let group = SchedulerTarget::Group(root);
    let queue = |i: usize| SchedulerTarget::Queue(qs[i]);
    assert_eq!(
        h.schedulers.calls(),
        vec![
            call(queue(0), 20),
            call(queue(1), 20),
            call(queue(2), 20),
            call(group, 20),
            call(group, 10),
            call(queue(2), 10),
            call(queue(1), 10),
            call(queue(0), 10),
        ]
    );
    assert_eq!(schedulers.stats().reapply_failures, 1);

    h.schedulers.clear();
    schedulers.set_attribute(s, SchedulerAttr::Weight(20)).unwrap();
    assert_eq!(h.schedulers.calls().len(), 5);
    assert!(h.schedulers.calls().iter().all(|c| c.weight == Some(20)));
}

fn unicast_queues(h: &Harness, port: PortOid, n: u32) -> Vec<QueueOid> {
    let db = h.ctx.lock();
    (0..n)
        .map(|i| db.find_port_queue(port, QueueType::Unicast, i).unwrap())
        .collect()
}

#[test]
fn test_scheduler_reapply_fails_mid_queues() {
    let h = Harness::new();
    let port = h.port(1);
    let mut schedulers = SchedulerOrch::new(h.ctx.clone());
    let mut queues = QueueOrch::new(h.ctx.clone());

    let s = schedulers.create(&[SchedulerAttr::Weight(10)]).unwrap();
    let qs = unicast_queues(&h, port, 3);
    for q in &qs {
        queues.set_attribute(*q, QueueAttr::SchedulerProfile(s)).unwrap();
    }

    let before = h.ctx.snapshot();
    h.schedulers.clear();
    h.schedulers.fail_after(1);

    let err = schedulers.set_attribute(s, SchedulerAttr::Weight(20)).unwrap_err();
    assert!(matches!(err, QosError::Hardware(_)));
    assert_eq!(h.ctx.snapshot(), before);
    assert_eq!(
        h.schedulers.calls(),
        vec![
            SchedulerSetCall { target: SchedulerTarget::Queue(qs[0]), weight: Some(20) },
            SchedulerSetCall { target: SchedulerTarget::Queue(qs[0]), weight: Some(10) },
        ]
    );
    assert_eq!(schedulers.stats().reapply_failures, 1);
}

#[test]
fn test_scheduler_reapply_fails_mid_groups() {
    let h = Harness::new();
    let port = h.port(1);
    let mut schedulers = SchedulerOrch::new(h.ctx.clone());
    let mut queues = QueueOrch::new(h.ctx.clone());
    let mut groups = SchedGroupOrch::new(h.ctx.clone());

    let s = schedulers.create(&[SchedulerAttr::Weight(10)]).unwrap();
    let qs = unicast_queues(&h, port, 2);
    let gs: Vec<_> = h.ctx.lock().port(port).unwrap().sched_groups[1].iter().take(3).collect();
    assert_eq!(gs.len(), 3);
    for q in &qs {
        queues.set_attribute(*q, QueueAttr::SchedulerProfile(s)).unwrap();
    }
    for g in &gs {
        groups.set_attribute(*g, SchedGroupAttr::SchedulerProfile(s)).unwrap();
    }

    let before = h.ctx.snapshot();
    h.schedulers.clear();
    // both queues and the first group go through, the second group fails
    h.schedulers.fail_after(3);

    let err = schedulers.set_attribute(s, SchedulerAttr::Weight(20)).unwrap_err();
    assert!(matches!(err, QosError::Hardware(_)));
    assert_eq!(h.ctx.snapshot(), before);

    let call = |target, weight| SchedulerSetCall { target, weight: Some(weight) };
    let queue = |i: usize| SchedulerTarget::Queue(qs[i]);
    let group = SchedulerTarget::Group(gs[0]);
    assert_eq!(
        h.schedulers.calls(),
        vec![
            call(queue(0), 20),
            call(queue(1), 20),
            call(group, 20),
            call(group, 10),
            call(queue(1), 10),
            call(queue(0), 10),
        ]
    );
}

#[test]
fn test_failed_profile_apply_keeps_old_profile() {
    let h = Harness::new();
    let port = h.port(1);
    let mut buffers = BufferOrch::new(h.ctx.clone());

    let pool = buffers
        .create_pool(&[BufferPoolAttr::Type(BufferPoolType::Ingress), BufferPoolAttr::Size(1000)])
        .unwrap();
    let small = buffers
        .create_profile(&[BufferProfileAttr::PoolId(pool), BufferProfileAttr::BufferSize(200)])
        .unwrap();
    let large = buffers
        .create_profile(&[BufferProfileAttr::PoolId(pool), BufferProfileAttr::BufferSize(300)])
        .unwrap();
    let pg = buffers.port_pg_list(port).unwrap()[0];
    buffers.set_pg_attribute(pg, PgAttr::BufferProfile(small)).unwrap();

    let before = h.ctx.snapshot();
    h.buffers.fail_after(0);
    let err = buffers.set_pg_attribute(pg, PgAttr::BufferProfile(large)).unwrap_err();
    assert!(matches!(err, QosError::Hardware(_)));
    assert_eq!(h.ctx.snapshot(), before);
    assert_eq!(shared(&buffers, pool), 800);
    assert_eq!(
        buffers.get_pg_attribute(pg, &[PgAttrId::BufferProfile]).unwrap(),
        vec![PgAttr::BufferProfile(small)]
    );
}

#[test]
fn test_profile_resize_rolls_back_on_failure() {
    let h = Harness::new();
    let port = h.port(1);
    let mut buffers = BufferOrch::new(h.ctx.clone());

    let pool = buffers
        .create_pool(&[BufferPoolAttr::Type(BufferPoolType::Ingress), BufferPoolAttr::Size(1000)])
        .unwrap();
    let profile = buffers
        .create_profile(&[BufferProfileAttr::PoolId(pool), BufferProfileAttr::BufferSize(200)])
        .unwrap();
    let pgs: Vec<_> = buffers.port_pg_list(port).unwrap().into_iter().take(3).collect();
    for pg in &pgs {
        buffers.set_pg_attribute(*pg, PgAttr::BufferProfile(profile)).unwrap();
    }

    let before = h.ctx.snapshot();
    h.buffers.clear();
    h.buffers.fail_after(1);
    let err = buffers
        .set_profile_attribute(profile, BufferProfileAttr::BufferSize(250))
        .unwrap_err();
    assert!(matches!(err, QosError::Hardware(_)));
    assert_eq!(h.ctx.snapshot(), before);
    assert_eq!(shared(&buffers, pool), 400);
    assert_eq!(
        h.buffers.calls(),
        vec![
            ProfileApplyCall { target: BufferTarget::Pg(pgs[0]), size: Some(250) },
            ProfileApplyCall { target: BufferTarget::Pg(pgs[0]), size: Some(200) },
        ]
    );
    assert_eq!(buffers.stats().reapply_failures, 1);
}

#[test]
fn test_wred_update_rolls_back_on_failure() {
    let h = Harness::new();
    let port = h.port(1);
    let mut wreds = WredOrch::new(h.ctx.clone());
    let mut queues = QueueOrch::new(h.ctx.clone());

    let wred = wreds.create(&[WredAttr::Weight(2)]).unwrap();
    let qs = unicast_queues(&h, port, 3);
    for q in &qs {
        queues.set_attribute(*q, QueueAttr::WredProfile(wred)).unwrap();
    }

    let before = h.ctx.snapshot();
    h.wreds.clear();
    h.wreds.fail_after(1);
    let err = wreds.set_attribute(wred, WredAttr::Weight(7)).unwrap_err();
    assert!(matches!(err, QosError::Hardware(_)));
    assert_eq!(h.ctx.snapshot(), before);
    assert_eq!(
        h.wreds.calls(),
        vec![
            WredLinkCall { target: WredLinkTarget::Queue(qs[0]), weight: 7 },
            WredLinkCall { target: WredLinkTarget::Queue(qs[0]), weight: 2 },
        ]
    );
    assert_eq!(wreds.get_attribute(wred, &[WredAttrId::Weight]).unwrap(), vec![WredAttr::Weight(2)]);
}
