//! Port bring-up and teardown with objects from every orchestrator bound.

mod common;

use common::Harness;
use pretty_assertions::assert_eq;
use sonic_qosorch::buffer::{BufferPoolAttr, BufferProfileAttr, PgAttr};
use sonic_qosorch::policer::PolicerAttr;
use sonic_qosorch::port::{PortQosAttr, PortQosAttrId};
use sonic_qosorch::qos_map::QosMapAttr;
use sonic_qosorch::queue::QueueAttr;
use sonic_qosorch::scheduler::SchedulerAttr;
use sonic_qosorch::wred::WredLinkTarget;
use sonic_qosorch::{
    BufferOrch, BufferPoolType, PolicerOrch, PortOid, PortQosOrch, QosError, QosMapOrch, QosMapType,
    QosSwitchConfig, QueueOrch, QueueType, SchedulerOrch, StormType, WredOrch,
};

#[test]
fn test_teardown_releases_every_binding() {
    let h = Harness::new();
    let initial = h.ctx.snapshot();
    let free_ingress = h.vm.free_buffer_bytes(BufferPoolType::Ingress);

    let mut ports = PortQosOrch::new(h.ctx.clone());
    let mut maps = QosMapOrch::new(h.ctx.clone());
    let mut policers = PolicerOrch::new(h.ctx.clone());
    let mut schedulers = SchedulerOrch::new(h.ctx.clone());
    let mut buffers = BufferOrch::new(h.ctx.clone());
    let mut wreds = WredOrch::new(h.ctx.clone());
    let mut queues = QueueOrch::new(h.ctx.clone());

    let port = PortOid::from_npu_id(3);
    ports.port_init(port, false).unwrap();

    let map = maps.create(&[QosMapAttr::Type(QosMapType::DscpToTc)]).unwrap();
    let policer = policers.create(&[PolicerAttr::Cir(5000)]).unwrap();
    let scheduler = schedulers.create(&[SchedulerAttr::Weight(40)]).unwrap();
    let pool = buffers
        .create_pool(&[BufferPoolAttr::Type(BufferPoolType::Ingress), BufferPoolAttr::Size(4096)])
        .unwrap();
    let profile = buffers
        .create_profile(&[BufferProfileAttr::PoolId(pool), BufferProfileAttr::BufferSize(512)])
        .unwrap();
    let wred = wreds.create(&[]).unwrap();

    ports.set_attribute(port, PortQosAttr::QosMap(QosMapType::DscpToTc, map)).unwrap();
    ports.set_attribute(port, PortQosAttr::Policer(StormType::Broadcast, policer)).unwrap();
    ports.set_attribute(port, PortQosAttr::SchedulerProfile(scheduler)).unwrap();

    let pg = buffers.port_pg_list(port).unwrap()[0];
    buffers.set_pg_attribute(pg, PgAttr::BufferProfile(profile)).unwrap();
    let uc0 = h.ctx.lock().find_port_queue(port, QueueType::Unicast, 0).unwrap();
    queues.set_attribute(uc0, QueueAttr::WredProfile(wred)).unwrap();
    queues.set_attribute(uc0, QueueAttr::SchedulerProfile(scheduler)).unwrap();

    assert!(matches!(maps.remove(map), Err(QosError::ObjectInUse(_))));
    assert!(matches!(policers.remove(policer), Err(QosError::ObjectInUse(_))));

    ports.port_deinit(port).unwrap();

    maps.remove(map).unwrap();
    policers.remove(policer).unwrap();
    schedulers.remove(scheduler).unwrap();
    wreds.remove(wred).unwrap();
    buffers.remove_profile(profile).unwrap();
    buffers.remove_pool(pool).unwrap();

    assert_eq!(h.ctx.snapshot(), initial);
    assert_eq!(h.vm.free_buffer_bytes(BufferPoolType::Ingress), free_ingress);
}

#[test]
fn test_port_slots_round_trip_through_get() {
    let h = Harness::new();
    let port = h.port(1);
    let mut ports = PortQosOrch::new(h.ctx.clone());
    let mut policers = PolicerOrch::new(h.ctx.clone());

    let p = policers.create(&[]).unwrap();
    ports.set_attribute(port, PortQosAttr::Policer(StormType::Multicast, p)).unwrap();

    let got = ports
        .get_attribute(
            port,
            &[
                PortQosAttrId::Policer(StormType::Multicast),
                PortQosAttrId::Policer(StormType::Flood),
                PortQosAttrId::QosMap(QosMapType::TcToQueue),
            ],
        )
        .unwrap();
    assert_eq!(
        got,
        vec![
            PortQosAttr::Policer(StormType::Multicast, p),
            PortQosAttr::Policer(StormType::Flood, sonic_qosorch::PolicerOid::NULL),
            PortQosAttr::QosMap(QosMapType::TcToQueue, sonic_qosorch::QosMapOid::NULL),
        ]
    );

    match &ports.get_attribute(port, &[PortQosAttrId::SchedulerGroupList]).unwrap()[..] {
        [PortQosAttr::SchedulerGroupList(groups)] => assert_eq!(groups.len(), 9),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_single_level_switch_flat_hierarchy() {
    let config = QosSwitchConfig {
        max_hierarchy_levels: 1,
        max_uc_queues: 4,
        max_mc_queues: 4,
        ..QosSwitchConfig::default()
    };
    let h = Harness::with_config(config);
    let port = h.port(1);

    let db = h.ctx.lock();
    let node = db.port(port).unwrap();
    assert_eq!(node.sched_group_count(), 1);
    let root = node.sched_groups[0].first().unwrap();
    assert_eq!(db.sched_group(root).unwrap().child_count, 8);
    for q in node.queues.iter() {
        assert_eq!(db.queue(q).unwrap().parent_id, root);
    }
}

#[test]
fn test_missing_port_rejected_everywhere() {
    let h = Harness::new();
    let ghost = PortOid::from_npu_id(42);
    let mut ports = PortQosOrch::new(h.ctx.clone());
    let mut maps = QosMapOrch::new(h.ctx.clone());

    assert!(matches!(ports.port_deinit(ghost), Err(QosError::NotFound { .. })));
    assert!(ports.get_attribute(ghost, &[PortQosAttrId::QueueList]).is_err());
    let m = maps.create(&[QosMapAttr::Type(QosMapType::TcToQueue)]).unwrap();
    assert!(matches!(
        maps.bind_port(ghost, QosMapType::TcToQueue, m),
        Err(QosError::InvalidObjectId(_))
    ));
}
