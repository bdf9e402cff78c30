//! PolicerOrch implementation.

use std::sync::Arc;

use serde_json::json;
use sonic_sai::{AclEntryOid, PolicerOid, PortOid};
use sonic_types::StormType;

use super::types::{PolicerAttr, PolicerAttrId, PolicerConfig, PolicerNode};
use crate::audit::{AuditCategory, AuditOutcome, AuditRecord};
use crate::context::QosContext;
use crate::db::QosDb;
use crate::error::{QosError, QosResult};
use crate::npu::NpuApiTable;
use crate::rollback::ApplyLog;
use crate::{audit_log, debug_log, error_log};

/// Policer orchestrator statistics.
#[derive(Debug, Clone, Default)]
pub struct PolicerOrchStats {
    pub policers_created: u64,
    pub policers_removed: u64,
    pub policers_updated: u64,
    pub storm_control_applied: u64,
}

/// Binds `policer` to the `storm_type` slot of `port`; null unbinds.
pub(crate) fn policer_port_set(
    npu: &NpuApiTable,
    db: &mut QosDb,
    port: PortOid,
    storm_type: StormType,
    policer: PolicerOid,
) -> QosResult<()> {
    let old = db
        .ports
        .get(&port)
        .ok_or(QosError::InvalidObjectId(port.as_raw()))?
        .policer(storm_type);
    if old == policer {
        return Ok(());
    }
    if !policer.is_null() && !db.policers.contains(&policer) {
        return Err(QosError::InvalidObjectId(policer.as_raw()));
    }

    npu.policer.storm_control_port_set(port, storm_type, policer)?;

    let slot = storm_type.slot();
    if !old.is_null() {
        db.policer_mut(old)?.ports[slot].unlink(&port)?;
    }
    if !policer.is_null() {
        db.policer_mut(policer)?.ports[slot].link_back(port)?;
    }
    db.port_mut(port)?.policers[slot] = policer;

    debug_log!("PolicerOrch", port = %port, storm_type = %storm_type, policer = %policer, "storm control set");
    Ok(())
}

/// Policer orchestrator for rate limiting and storm control.
pub struct PolicerOrch {
    ctx: Arc<QosContext>,
    stats: PolicerOrchStats,
}

impl std::fmt::Debug for PolicerOrch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicerOrch")
            .field("stats", &self.stats)
            .finish()
    }
}

impl PolicerOrch {
    pub fn new(ctx: Arc<QosContext>) -> Self {
        Self {
            ctx,
            stats: PolicerOrchStats::default(),
        }
    }

    pub fn stats(&self) -> &PolicerOrchStats {
        &self.stats
    }

    pub fn create(&mut self, attrs: &[PolicerAttr]) -> QosResult<PolicerOid> {
        let mut config = PolicerConfig::default();
        for (i, attr) in attrs.iter().enumerate() {
            config.apply(attr).map_err(|e| e.at_index(i))?;
        }
        config.validate()?;

        let mut db = self.ctx.lock();
        let id = self.ctx.npu().policer.policer_create(&config).inspect_err(|e| {
            audit_log!(AuditRecord::new(AuditCategory::ResourceCreate, "PolicerOrch", "create_policer")
                .with_object_type("policer")
                .with_error(e.to_string()));
        })?;
        db.policers.insert(id, PolicerNode::new(id, config))?;

        self.stats.policers_created = self.stats.policers_created.saturating_add(1);
        audit_log!(AuditRecord::new(AuditCategory::ResourceCreate, "PolicerOrch", "create_policer")
            .with_outcome(AuditOutcome::Success)
            .with_object_id(id.to_string())
            .with_object_type("policer")
            .with_details(json!({ "mode": config.mode, "cir": config.cir, "pir": config.pir })));
        Ok(id)
    }

    /// Removes a policer no port slot or ACL rule uses.
    pub fn remove(&mut self, id: PolicerOid) -> QosResult<()> {
        let mut db = self.ctx.lock();
        if db.policer(id)?.is_referenced() {
            audit_log!(AuditRecord::new(AuditCategory::ResourceDelete, "PolicerOrch", "remove_policer")
                .with_outcome(AuditOutcome::Denied)
                .with_object_id(id.to_string())
                .with_object_type("policer")
                .with_error("policer is referenced"));
            return Err(QosError::object_in_use(format!("policer {} is referenced", id)));
        }

        self.ctx.npu().policer.policer_remove(id)?;
        db.policers.remove(&id);

        self.stats.policers_removed = self.stats.policers_removed.saturating_add(1);
        audit_log!(AuditRecord::new(AuditCategory::ResourceDelete, "PolicerOrch", "remove_policer")
            .with_outcome(AuditOutcome::Success)
            .with_object_id(id.to_string())
            .with_object_type("policer"));
        Ok(())
    }

    /// Changes a rate, burst, color source or action, then re-binds the
    /// policer on every port slot using it.
    pub fn set_attribute(&mut self, id: PolicerOid, attr: PolicerAttr) -> QosResult<()> {
        if matches!(attr, PolicerAttr::MeterType(_) | PolicerAttr::Mode(_)) {
            return Err(QosError::invalid_parameter(format!(
                "{:?} cannot be changed after create",
                attr.id()
            )));
        }

        let mut db = self.ctx.lock();
        let npu = self.ctx.npu();
        let node = db.policer(id)?;
        let old = node.config;
        let mut config = old;
        config.apply(&attr)?;
        config.validate()?;
        if config == old {
            return Ok(());
        }

        let users: Vec<(PortOid, StormType)> = StormType::ALL
            .into_iter()
            .flat_map(|s| node.ports[s.slot()].iter().map(move |p| (p, s)))
            .collect();

        npu.policer.policer_attribute_set(id, &attr)?;
        let mut rebound = ApplyLog::new("PolicerOrch");
        let mut failure = None;
        for &(port, storm) in &users {
            if let Err(e) = npu.policer.storm_control_port_set(port, storm, id) {
                failure = Some(e);
                break;
            }
            rebound.record((port, storm));
        }
        if let Some(e) = failure {
            // The ports read the policer's parameters when bound, so the
            // old value goes back before they are re-bound.
            if let Err(r) = npu.policer.policer_attribute_set(id, &old.get(attr.id())) {
                error_log!("PolicerOrch", policer = %id, error = %r, "failed to restore policer attribute");
            }
            rebound.rollback(|(port, storm)| npu.policer.storm_control_port_set(port, storm, id));
            audit_log!(AuditRecord::new(AuditCategory::ResourceModify, "PolicerOrch", "set_attribute")
                .with_object_id(id.to_string())
                .with_object_type("policer")
                .with_details(json!({ "ports": users.len() }))
                .with_error(e.to_string()));
            return Err(e.into());
        }

        db.policer_mut(id)?.config = config;
        self.stats.policers_updated = self.stats.policers_updated.saturating_add(1);
        debug_log!("PolicerOrch", policer = %id, attr = ?attr, ports = users.len(), "policer updated");
        Ok(())
    }

    pub fn get_attribute(&self, id: PolicerOid, ids: &[PolicerAttrId]) -> QosResult<Vec<PolicerAttr>> {
        let db = self.ctx.lock();
        let config = db.policer(id)?.config;
        Ok(ids.iter().map(|&a| config.get(a)).collect())
    }

    /// Binds `policer` as the `storm_type` storm-control policer of
    /// `port`; null unbinds.
    pub fn bind_port(&mut self, port: PortOid, storm_type: StormType, policer: PolicerOid) -> QosResult<()> {
        let mut db = self.ctx.lock();
        policer_port_set(self.ctx.npu(), &mut db, port, storm_type, policer)?;
        self.stats.storm_control_applied = self.stats.storm_control_applied.saturating_add(1);
        Ok(())
    }

    /// Records that ACL rule `rule` meters through `policer`.
    pub fn acl_rule_link(&mut self, policer: PolicerOid, rule: AclEntryOid) -> QosResult<()> {
        let mut db = self.ctx.lock();
        db.policers
            .get_mut(&policer)
            .ok_or(QosError::InvalidObjectId(policer.as_raw()))?
            .acl_rules
            .link_back(rule)?;
        Ok(())
    }

    pub fn acl_rule_unlink(&mut self, policer: PolicerOid, rule: AclEntryOid) -> QosResult<()> {
        let mut db = self.ctx.lock();
        db.policer_mut(policer)?.acl_rules.unlink(&rule)?;
        Ok(())
    }

    /// ACL rules currently metering through `policer`.
    pub fn acl_rules(&self, policer: PolicerOid) -> QosResult<Vec<AclEntryOid>> {
        Ok(self.ctx.lock().policer(policer)?.acl_rules.iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QosSwitchConfig;
    use crate::port::PortQosNode;
    use crate::vm::VmQosNpu;
    use crate::npu::PolicerNpuApi;
    use pretty_assertions::assert_eq;
    use sonic_sai::{SaiError, SaiResult};
    use sonic_types::PolicerMode;
    use std::sync::Mutex;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum PolicerCall {
        Attr(PolicerAttr),
        Bind(PortOid),
    }

    /// Logs attribute and port programming; fails one port bind on demand.
    struct FlakyPolicerNpu {
        inner: Arc<VmQosNpu>,
        calls: Mutex<Vec<PolicerCall>>,
        fail_bind_in: Mutex<Option<usize>>,
    }

    impl PolicerNpuApi for FlakyPolicerNpu {
        fn policer_create(&self, config: &PolicerConfig) -> SaiResult<PolicerOid> {
            self.inner.policer_create(config)
        }

        fn policer_remove(&self, policer: PolicerOid) -> SaiResult<()> {
            self.inner.policer_remove(policer)
        }

        fn policer_attribute_set(&self, policer: PolicerOid, attr: &PolicerAttr) -> SaiResult<()> {
            self.calls.lock().unwrap().push(PolicerCall::Attr(*attr));
            self.inner.policer_attribute_set(policer, attr)
        }

        fn storm_control_port_set(&self, port: PortOid, storm_type: StormType, policer: PolicerOid) -> SaiResult<()> {
            let mut fail_in = self.fail_bind_in.lock().unwrap();
            match *fail_in {
                Some(0) => {
                    *fail_in = None;
                    return Err(SaiError::invalid_parameter("bind rejected"));
                }
                Some(n) => *fail_in = Some(n - 1),
                None => {}
            }
            self.calls.lock().unwrap().push(PolicerCall::Bind(port));
            self.inner.storm_control_port_set(port, storm_type, policer)
        }
    }

    fn create_test_orch() -> (PolicerOrch, PortOid) {
        let config = QosSwitchConfig::default();
        let npu = NpuApiTable::from_backend(Arc::new(VmQosNpu::new(&config)));
        let ctx = QosContext::new(config, npu).unwrap();
        let port = PortOid::from_npu_id(1);
        ctx.lock().ports.insert(port, PortQosNode::new(port, false, 2)).unwrap();
        (PolicerOrch::new(ctx), port)
    }

    #[test]
    fn test_storm_control_bind() {
        let (mut orch, port) = create_test_orch();
        let p = orch.create(&[PolicerAttr::Cir(1000)]).unwrap();

        orch.bind_port(port, StormType::Broadcast, p).unwrap();
        assert_eq!(orch.ctx.lock().port(port).unwrap().policer(StormType::Broadcast), p);
        assert!(matches!(orch.remove(p), Err(QosError::ObjectInUse(_))));

        orch.bind_port(port, StormType::Broadcast, PolicerOid::NULL).unwrap();
        orch.remove(p).unwrap();
        assert_eq!(orch.stats().storm_control_applied, 2);
    }

    #[test]
    fn test_acl_reference_blocks_remove() {
        let (mut orch, _) = create_test_orch();
        let p = orch.create(&[]).unwrap();
        let rule = AclEntryOid::from_npu_id(5);

        orch.acl_rule_link(p, rule).unwrap();
        assert_eq!(orch.acl_rules(p).unwrap(), vec![rule]);
        assert!(orch.remove(p).is_err());
        orch.acl_rule_unlink(p, rule).unwrap();
        orch.remove(p).unwrap();
    }

    #[test]
    fn test_set_rate_on_bound_policer() {
        let (mut orch, port) = create_test_orch();
        let p = orch
            .create(&[PolicerAttr::Mode(PolicerMode::TrTcm), PolicerAttr::Cir(100), PolicerAttr::Pir(200)])
            .unwrap();
        orch.bind_port(port, StormType::Flood, p).unwrap();

        orch.set_attribute(p, PolicerAttr::Pir(400)).unwrap();
        assert_eq!(orch.get_attribute(p, &[PolicerAttrId::Pir]).unwrap(), vec![PolicerAttr::Pir(400)]);

        // PIR below CIR
        assert!(orch.set_attribute(p, PolicerAttr::Pir(50)).is_err());
        assert!(matches!(
            orch.set_attribute(p, PolicerAttr::Mode(PolicerMode::SrTcm)),
            Err(QosError::InvalidParameter(_))
        ));
        assert_eq!(orch.stats().policers_updated, 1);
    }

    #[test]
    fn test_failed_rebind_restores_rate_before_rebinding() {
        let config = QosSwitchConfig::default();
        let vm = Arc::new(VmQosNpu::new(&config));
        let flaky = Arc::new(FlakyPolicerNpu {
            inner: vm.clone(),
            calls: Mutex::new(Vec::new()),
            fail_bind_in: Mutex::new(None),
        });
        let mut npu = NpuApiTable::from_backend(vm);
        npu.policer = flaky.clone();
        let ctx = QosContext::new(config, npu).unwrap();
        let (p1, p2) = (PortOid::from_npu_id(1), PortOid::from_npu_id(2));
        for port in [p1, p2] {
            ctx.lock().ports.insert(port, PortQosNode::new(port, false, 2)).unwrap();
        }
        let mut orch = PolicerOrch::new(ctx.clone());

        let p = orch.create(&[PolicerAttr::Cir(1000)]).unwrap();
        orch.bind_port(p1, StormType::Broadcast, p).unwrap();
        orch.bind_port(p2, StormType::Broadcast, p).unwrap();
        let before = ctx.snapshot();
        flaky.calls.lock().unwrap().clear();
        *flaky.fail_bind_in.lock().unwrap() = Some(1);

        let err = orch.set_attribute(p, PolicerAttr::Cir(2000)).unwrap_err();
        assert!(matches!(err, QosError::Hardware(_)));
        assert_eq!(
            *flaky.calls.lock().unwrap(),
            vec![
                PolicerCall::Attr(PolicerAttr::Cir(2000)),
                PolicerCall::Bind(p1),
                PolicerCall::Attr(PolicerAttr::Cir(1000)),
                PolicerCall::Bind(p1),
            ]
        );
        assert_eq!(ctx.snapshot(), before);
        assert_eq!(orch.get_attribute(p, &[PolicerAttrId::Cir]).unwrap(), vec![PolicerAttr::Cir(1000)]);
    }
}
