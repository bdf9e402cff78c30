//! Shared QoS engine state.
//!
//! A [`QosContext`] owns the object graph behind one mutex, the backend
//! tables, the switch configuration and the switch default scheduler.
//! Every public operation takes the lock once for its whole duration, so
//! a multi-step operation (reapply, port bring-up) is never observed half
//! done by another caller.

use std::sync::{Arc, Mutex, MutexGuard};

use sonic_sai::SchedulerOid;

use crate::config::QosSwitchConfig;
use crate::db::QosDb;
use crate::error::QosResult;
use crate::npu::NpuApiTable;
use crate::scheduler::{self, SchedulerConfig};
use crate::sched_group::HierarchyTemplate;
use crate::{audit_log, info_log};
use crate::audit::{AuditCategory, AuditOutcome, AuditRecord};

pub struct QosContext {
    config: QosSwitchConfig,
    npu: NpuApiTable,
    db: Mutex<QosDb>,
    default_scheduler: SchedulerOid,
    port_template: HierarchyTemplate,
    cpu_template: HierarchyTemplate,
}

impl QosContext {
    /// Validates `config`, creates the switch default scheduler through
    /// `npu` and returns the shared context.
    pub fn new(config: QosSwitchConfig, npu: NpuApiTable) -> QosResult<Arc<Self>> {
        config.validate()?;

        let mut db = QosDb::new();
        let default_scheduler = scheduler::insert_scheduler(&npu, &mut db, SchedulerConfig::default())?;

        info_log!(
            "QosContext",
            default_scheduler = %default_scheduler,
            separate_uc_mc = config.separate_uc_mc,
            "QoS context initialized"
        );
        audit_log!(AuditRecord::new(AuditCategory::SystemLifecycle, "QosContext", "init")
            .with_outcome(AuditOutcome::Success)
            .with_object_id(default_scheduler.to_string())
            .with_object_type("scheduler"));

        Ok(Arc::new(Self {
            port_template: config.port_template(),
            cpu_template: config.cpu_template(),
            config,
            npu,
            db: Mutex::new(db),
            default_scheduler,
        }))
    }

    /// Takes the QoS lock.
    ///
    /// A poisoned lock is recovered: every mutation is committed only after
    /// its fallible steps, so a panicking holder cannot leave a torn graph.
    pub fn lock(&self) -> MutexGuard<'_, QosDb> {
        self.db.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn npu(&self) -> &NpuApiTable {
        &self.npu
    }

    pub fn config(&self) -> &QosSwitchConfig {
        &self.config
    }

    /// Scheduler applied to every queue at creation.
    pub fn default_scheduler(&self) -> SchedulerOid {
        self.default_scheduler
    }

    pub fn port_template(&self) -> &HierarchyTemplate {
        &self.port_template
    }

    pub fn cpu_template(&self) -> &HierarchyTemplate {
        &self.cpu_template
    }

    /// Copy of the graph, for dumps and rollback checks.
    pub fn snapshot(&self) -> QosDb {
        self.lock().clone()
    }

    pub fn summary(&self) -> serde_json::Value {
        self.lock().summary()
    }
}

impl std::fmt::Debug for QosContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QosContext")
            .field("config", &self.config)
            .field("default_scheduler", &self.default_scheduler)
            .finish_non_exhaustive()
    }
}
