//! QoS engine error type.

use sonic_orch_common::{BitmapError, ListError, StoreError};
use sonic_sai::{SaiError, SaiStatus};
use thiserror::Error;

/// Error returned by every QoS operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QosError {
    /// The object addressed by the request does not exist.
    #[error("{kind} {id:#x} not found")]
    NotFound { kind: &'static str, id: u64 },

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A referenced handle names no live object.
    #[error("Invalid object id: {0:#x}")]
    InvalidObjectId(u64),

    /// A referenced handle has the wrong object type.
    #[error("Invalid object type for {0:#x}")]
    InvalidObjectType(u64),

    #[error("Invalid attribute value: {0}")]
    InvalidAttrValue(String),

    #[error("Insufficient resources: {0}")]
    InsufficientResources(String),

    #[error("Object in use: {0}")]
    ObjectInUse(String),

    #[error("Not supported: {0}")]
    NotSupported(String),

    /// The hardware-facing backend rejected the call.
    #[error("Hardware failure: {0}")]
    Hardware(#[from] SaiError),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Failure on the `index`-th element of an attribute list.
    #[error("Attribute {index}: {source}")]
    Attribute {
        index: usize,
        source: Box<QosError>,
    },
}

impl QosError {
    pub fn not_found(kind: &'static str, id: u64) -> Self {
        QosError::NotFound { kind, id }
    }

    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        QosError::InvalidParameter(msg.into())
    }

    pub fn invalid_attr_value(msg: impl Into<String>) -> Self {
        QosError::InvalidAttrValue(msg.into())
    }

    pub fn insufficient_resources(msg: impl Into<String>) -> Self {
        QosError::InsufficientResources(msg.into())
    }

    pub fn object_in_use(msg: impl Into<String>) -> Self {
        QosError::ObjectInUse(msg.into())
    }

    pub fn not_supported(msg: impl Into<String>) -> Self {
        QosError::NotSupported(msg.into())
    }

    /// Wraps the error with the position of the offending attribute.
    pub fn at_index(self, index: usize) -> Self {
        QosError::Attribute {
            index,
            source: Box::new(self),
        }
    }

    /// Returns the status code reported to the attribute layer.
    pub fn status(&self) -> SaiStatus {
        match self {
            QosError::NotFound { .. } => SaiStatus::ItemNotFound,
            QosError::AlreadyExists(_) => SaiStatus::ItemAlreadyExists,
            QosError::InvalidParameter(_) => SaiStatus::InvalidParameter,
            QosError::InvalidObjectId(_) => SaiStatus::InvalidObjectId,
            QosError::InvalidObjectType(_) => SaiStatus::InvalidObjectType,
            QosError::InvalidAttrValue(_) => SaiStatus::InvalidAttrValue,
            QosError::InsufficientResources(_) => SaiStatus::InsufficientResources,
            QosError::ObjectInUse(_) => SaiStatus::ObjectInUse,
            QosError::NotSupported(_) => SaiStatus::NotSupported,
            QosError::Hardware(e) => e.status(),
            QosError::Config(_) => SaiStatus::InvalidParameter,
            QosError::Attribute { source, .. } => source.status(),
        }
    }

    /// Strips any attribute-index wrapping.
    pub fn root(&self) -> &QosError {
        match self {
            QosError::Attribute { source, .. } => source.root(),
            other => other,
        }
    }
}

impl From<StoreError> for QosError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::KeyNotFound => QosError::not_found("object", 0),
            StoreError::AlreadyExists => QosError::AlreadyExists("object".to_string()),
            StoreError::RefCountUnderflow => {
                QosError::InvalidParameter("reference count underflow".to_string())
            }
        }
    }
}

impl From<ListError> for QosError {
    fn from(e: ListError) -> Self {
        match e {
            ListError::AlreadyLinked => QosError::AlreadyExists("relationship".to_string()),
            ListError::NotLinked => QosError::not_found("relationship", 0),
        }
    }
}

impl From<BitmapError> for QosError {
    fn from(e: BitmapError) -> Self {
        match e {
            BitmapError::Exhausted { .. } => QosError::InsufficientResources(e.to_string()),
            BitmapError::OutOfRange { .. } => QosError::InvalidParameter(e.to_string()),
        }
    }
}

/// Result type for QoS operations.
pub type QosResult<T> = Result<T, QosError>;
