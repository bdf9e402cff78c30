//! Structured logging and audit records for the QoS engine.
//!
//! Every mutation of the QoS graph (create, remove, attach, detach, reapply)
//! emits one [`AuditRecord`] on the `audit` target. Records are JSON
//! serializable so they can be shipped as-is to a log collector.
//!
//! Plain diagnostics go through the module-local macros:
//!
//! | Macro | Level | Usage |
//! |-------|-------|-------|
//! | `error_log!` | Error | Unexpected failures, failed rollbacks |
//! | `warn_log!` | Warn | Rejected requests, degraded states |
//! | `info_log!` | Info | Lifecycle events |
//! | `debug_log!` | Debug | Per-object tracing |
//!
//! Each macro tags the event with a `source` field naming the orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Audit event category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditCategory {
    /// Object creation
    ResourceCreate,
    /// Attribute change or re-parenting
    ResourceModify,
    /// Object removal
    ResourceDelete,
    /// Port bring-up / teardown
    PortLifecycle,
    /// Hierarchy attach / detach
    HierarchyChange,
    /// Multi-target reapply and its rollback
    Reapply,
    /// Buffer capacity admission decisions
    CapacityCheck,
    /// Daemon startup and shutdown
    SystemLifecycle,
    /// Error and failure events
    ErrorCondition,
}

impl fmt::Display for AuditCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditCategory::ResourceCreate => write!(f, "RESOURCE_CREATE"),
            AuditCategory::ResourceModify => write!(f, "RESOURCE_MODIFY"),
            AuditCategory::ResourceDelete => write!(f, "RESOURCE_DELETE"),
            AuditCategory::PortLifecycle => write!(f, "PORT_LIFECYCLE"),
            AuditCategory::HierarchyChange => write!(f, "HIERARCHY_CHANGE"),
            AuditCategory::Reapply => write!(f, "REAPPLY"),
            AuditCategory::CapacityCheck => write!(f, "CAPACITY_CHECK"),
            AuditCategory::SystemLifecycle => write!(f, "SYSTEM_LIFECYCLE"),
            AuditCategory::ErrorCondition => write!(f, "ERROR_CONDITION"),
        }
    }
}

/// Outcome of an audited action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditOutcome {
    /// Action completed successfully
    Success,
    /// Action failed
    Failure,
    /// Action is in progress
    InProgress,
    /// Action was refused before touching hardware
    Denied,
}

impl fmt::Display for AuditOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditOutcome::Success => write!(f, "success"),
            AuditOutcome::Failure => write!(f, "failure"),
            AuditOutcome::InProgress => write!(f, "in_progress"),
            AuditOutcome::Denied => write!(f, "denied"),
        }
    }
}

/// One audit event.
///
/// Built with the `with_*` methods and handed to `audit_log!`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    /// UTC time the record was created.
    pub timestamp: DateTime<Utc>,

    pub category: AuditCategory,

    /// Orchestrator that generated the event, e.g. `"QueueOrch"`.
    pub source: String,

    /// Operation name, e.g. `"modify_parent"`.
    pub action: String,

    pub outcome: AuditOutcome,

    /// Handle of the affected object, hex formatted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,

    /// Object kind, e.g. `"queue"` or `"buffer_pool"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Groups the records of one multi-step operation (port bring-up, reapply).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

impl AuditRecord {
    /// Creates a record stamped with the current time.
    ///
    /// The outcome defaults to [`AuditOutcome::InProgress`].
    pub fn new(
        category: AuditCategory,
        source: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            category,
            source: source.into(),
            action: action.into(),
            outcome: AuditOutcome::InProgress,
            object_id: None,
            object_type: None,
            details: None,
            error: None,
            correlation_id: None,
        }
    }

    pub fn with_outcome(mut self, outcome: AuditOutcome) -> Self {
        self.outcome = outcome;
        self
    }

    pub fn with_object_id(mut self, id: impl Into<String>) -> Self {
        self.object_id = Some(id.into());
        self
    }

    pub fn with_object_type(mut self, obj_type: impl Into<String>) -> Self {
        self.object_type = Some(obj_type.into());
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Records the error and marks the outcome as Failure, unless the
    /// action was already marked Denied.
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        if self.outcome != AuditOutcome::Denied {
            self.outcome = AuditOutcome::Failure;
        }
        self
    }

    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Serializes the record. Never fails; a serialization error is
    /// embedded in the returned JSON instead.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|e| format!(r#"{{"error":"serialization_failed","message":"{}"}}"#, e))
    }
}

/// Debug-level log tagged with its source orchestrator.
///
/// ```ignore
/// debug_log!("QueueOrch", queue = %oid, "queue created");
/// ```
#[macro_export]
macro_rules! debug_log {
    ($source:expr, $($arg:tt)*) => {
        tracing::debug!(
            source = $source,
            $($arg)*
        )
    };
}

/// Info-level log tagged with its source orchestrator.
#[macro_export]
macro_rules! info_log {
    ($source:expr, $($arg:tt)*) => {
        tracing::info!(
            source = $source,
            $($arg)*
        )
    };
}

/// Warn-level log tagged with its source orchestrator.
#[macro_export]
macro_rules! warn_log {
    ($source:expr, $($arg:tt)*) => {
        tracing::warn!(
            source = $source,
            $($arg)*
        )
    };
}

/// Error-level log tagged with its source orchestrator.
#[macro_export]
macro_rules! error_log {
    ($source:expr, $($arg:tt)*) => {
        tracing::error!(
            source = $source,
            $($arg)*
        )
    };
}

/// Emits an [`AuditRecord`] on the `audit` target.
///
/// Successes log at info, in-progress records at debug, failures and
/// denials at warn with the error attached.
#[macro_export]
macro_rules! audit_log {
    ($record:expr) => {
        let record = $record;
        match record.outcome {
            $crate::audit::AuditOutcome::Success => {
                tracing::info!(
                    target: "audit",
                    category = %record.category,
                    source = %record.source,
                    action = %record.action,
                    outcome = %record.outcome,
                    audit_json = %record.to_json(),
                    "AUDIT: {} - {} - {}",
                    record.category,
                    record.action,
                    record.outcome
                );
            }
            $crate::audit::AuditOutcome::InProgress => {
                tracing::debug!(
                    target: "audit",
                    category = %record.category,
                    source = %record.source,
                    action = %record.action,
                    outcome = %record.outcome,
                    audit_json = %record.to_json(),
                    "AUDIT: {} - {} - {}",
                    record.category,
                    record.action,
                    record.outcome
                );
            }
            $crate::audit::AuditOutcome::Failure | $crate::audit::AuditOutcome::Denied => {
                tracing::warn!(
                    target: "audit",
                    category = %record.category,
                    source = %record.source,
                    action = %record.action,
                    outcome = %record.outcome,
                    error = record.error.as_deref().unwrap_or(""),
                    audit_json = %record.to_json(),
                    "AUDIT: {} - {} - {}",
                    record.category,
                    record.action,
                    record.outcome
                );
            }
        }
    };
}

/// Installs the JSON log subscriber.
///
/// `RUST_LOG` wins over `log_level` when set.
pub fn init_logging(log_level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .json(),
        )
        .init();
}

/// Installs a human readable subscriber for interactive runs.
pub fn init_logging_pretty(log_level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true)
                .pretty(),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_record_creation() {
        let record = AuditRecord::new(AuditCategory::ResourceCreate, "QueueOrch", "create_queue")
            .with_outcome(AuditOutcome::Success)
            .with_object_id("0x15000000000001")
            .with_object_type("queue");

        assert_eq!(record.category, AuditCategory::ResourceCreate);
        assert_eq!(record.source, "QueueOrch");
        assert_eq!(record.action, "create_queue");
        assert_eq!(record.outcome, AuditOutcome::Success);
        assert_eq!(record.object_type, Some("queue".to_string()));
    }

    #[test]
    fn test_audit_record_with_error() {
        let record = AuditRecord::new(AuditCategory::CapacityCheck, "BufferOrch", "apply_profile")
            .with_error("pool exhausted");

        assert_eq!(record.outcome, AuditOutcome::Failure);
        assert_eq!(record.error, Some("pool exhausted".to_string()));

        let denied = AuditRecord::new(AuditCategory::CapacityCheck, "BufferOrch", "apply_profile")
            .with_outcome(AuditOutcome::Denied)
            .with_error("pool exhausted");
        assert_eq!(denied.outcome, AuditOutcome::Denied);
    }

    #[test]
    fn test_audit_record_json_serialization() {
        let record = AuditRecord::new(AuditCategory::Reapply, "SchedulerOrch", "reapply")
            .with_outcome(AuditOutcome::Success)
            .with_details(serde_json::json!({
                "queues": 8,
                "groups": 2
            }));

        let json = record.to_json();
        assert!(json.contains("REAPPLY"));
        assert!(json.contains("SchedulerOrch"));
        assert!(json.contains("\"queues\":8"));
        assert!(!json.contains("correlation_id"));
    }

    #[test]
    fn test_audit_category_display() {
        assert_eq!(AuditCategory::HierarchyChange.to_string(), "HIERARCHY_CHANGE");
        assert_eq!(AuditCategory::PortLifecycle.to_string(), "PORT_LIFECYCLE");
    }

    #[test]
    fn test_audit_outcome_display() {
        assert_eq!(AuditOutcome::InProgress.to_string(), "in_progress");
        assert_eq!(AuditOutcome::Denied.to_string(), "denied");
    }
}
