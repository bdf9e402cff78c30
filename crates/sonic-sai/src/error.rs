//! SAI error types and status handling.
//!
//! Backends report failures as [`SaiError`]; every variant maps back to the
//! `sai_status_t` code the attribute layer hands to its caller.

use std::fmt;
use thiserror::Error;

/// SAI status codes matching the SAI C API.
///
/// These values correspond to `sai_status_t` in the SAI header files.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SaiStatus {
    Success = 0,
    Failure = -1,
    NotSupported = -2,
    NoMemory = -3,
    InsufficientResources = -4,
    InvalidParameter = -5,
    ItemAlreadyExists = -6,
    ItemNotFound = -7,
    BufferOverflow = -8,
    InvalidPortNumber = -9,
    Uninitialized = -12,
    TableFull = -13,
    MandatoryAttributeMissing = -14,
    NotImplemented = -15,
    ObjectInUse = -17,
    InvalidObjectType = -18,
    InvalidObjectId = -19,
    NotExecuted = -23,
    InvalidAttribute = -24,
    InvalidAttrValue = -25,
}

impl SaiStatus {
    /// Creates a SaiStatus from a raw i32 value.
    ///
    /// Unknown codes collapse to [`SaiStatus::Failure`].
    pub fn from_raw(status: i32) -> Self {
        match status {
            0 => SaiStatus::Success,
            -2 => SaiStatus::NotSupported,
            -3 => SaiStatus::NoMemory,
            -4 => SaiStatus::InsufficientResources,
            -5 => SaiStatus::InvalidParameter,
            -6 => SaiStatus::ItemAlreadyExists,
            -7 => SaiStatus::ItemNotFound,
            -8 => SaiStatus::BufferOverflow,
            -9 => SaiStatus::InvalidPortNumber,
            -12 => SaiStatus::Uninitialized,
            -13 => SaiStatus::TableFull,
            -14 => SaiStatus::MandatoryAttributeMissing,
            -15 => SaiStatus::NotImplemented,
            -17 => SaiStatus::ObjectInUse,
            -18 => SaiStatus::InvalidObjectType,
            -19 => SaiStatus::InvalidObjectId,
            -23 => SaiStatus::NotExecuted,
            -24 => SaiStatus::InvalidAttribute,
            -25 => SaiStatus::InvalidAttrValue,
            _ => SaiStatus::Failure,
        }
    }

    /// Returns the raw status code.
    pub const fn as_raw(&self) -> i32 {
        *self as i32
    }

    /// Returns true if the status indicates success.
    pub fn is_success(&self) -> bool {
        *self == SaiStatus::Success
    }

    /// Converts to a Result, returning Ok(()) for success.
    pub fn into_result(self, operation: &'static str) -> SaiResult<()> {
        if self.is_success() {
            Ok(())
        } else {
            Err(SaiError::from_status(operation, self))
        }
    }
}

impl fmt::Display for SaiStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SaiStatus::Success => "SAI_STATUS_SUCCESS",
            SaiStatus::Failure => "SAI_STATUS_FAILURE",
            SaiStatus::NotSupported => "SAI_STATUS_NOT_SUPPORTED",
            SaiStatus::NoMemory => "SAI_STATUS_NO_MEMORY",
            SaiStatus::InsufficientResources => "SAI_STATUS_INSUFFICIENT_RESOURCES",
            SaiStatus::InvalidParameter => "SAI_STATUS_INVALID_PARAMETER",
            SaiStatus::ItemAlreadyExists => "SAI_STATUS_ITEM_ALREADY_EXISTS",
            SaiStatus::ItemNotFound => "SAI_STATUS_ITEM_NOT_FOUND",
            SaiStatus::BufferOverflow => "SAI_STATUS_BUFFER_OVERFLOW",
            SaiStatus::InvalidPortNumber => "SAI_STATUS_INVALID_PORT_NUMBER",
            SaiStatus::Uninitialized => "SAI_STATUS_UNINITIALIZED",
            SaiStatus::TableFull => "SAI_STATUS_TABLE_FULL",
            SaiStatus::MandatoryAttributeMissing => "SAI_STATUS_MANDATORY_ATTRIBUTE_MISSING",
            SaiStatus::NotImplemented => "SAI_STATUS_NOT_IMPLEMENTED",
            SaiStatus::ObjectInUse => "SAI_STATUS_OBJECT_IN_USE",
            SaiStatus::InvalidObjectType => "SAI_STATUS_INVALID_OBJECT_TYPE",
            SaiStatus::InvalidObjectId => "SAI_STATUS_INVALID_OBJECT_ID",
            SaiStatus::NotExecuted => "SAI_STATUS_NOT_EXECUTED",
            SaiStatus::InvalidAttribute => "SAI_STATUS_INVALID_ATTRIBUTE",
            SaiStatus::InvalidAttrValue => "SAI_STATUS_INVALID_ATTR_VALUE",
        };
        write!(f, "{}", s)
    }
}

/// Error reported by a hardware-facing backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SaiError {
    /// The backend call returned a non-success status.
    #[error("{operation} failed: {status}")]
    Status {
        operation: &'static str,
        status: SaiStatus,
    },

    /// The backend ran out of ids or capacity.
    #[error("Insufficient resources: {resource}")]
    InsufficientResources { resource: String },

    /// The requested feature is not supported by the backend.
    #[error("Feature not supported: {feature}")]
    NotSupported { feature: String },

    /// Invalid parameter passed to the backend.
    #[error("Invalid parameter: {message}")]
    InvalidParameter { message: String },

    /// The backend has no record of the object.
    #[error("Item not found: {item}")]
    NotFound { item: String },

    /// Object is in use and cannot be removed.
    #[error("Object in use: {object}")]
    ObjectInUse { object: String },
}

impl SaiError {
    /// Creates an error from a SAI status code.
    pub fn from_status(operation: &'static str, status: SaiStatus) -> Self {
        SaiError::Status { operation, status }
    }

    /// Creates an insufficient resources error.
    pub fn insufficient_resources(resource: impl Into<String>) -> Self {
        SaiError::InsufficientResources {
            resource: resource.into(),
        }
    }

    /// Creates a not supported error with a feature description.
    pub fn not_supported(feature: impl Into<String>) -> Self {
        SaiError::NotSupported {
            feature: feature.into(),
        }
    }

    /// Creates an invalid parameter error with a message.
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        SaiError::InvalidParameter {
            message: message.into(),
        }
    }

    /// Creates a not found error with an item description.
    pub fn not_found(item: impl Into<String>) -> Self {
        SaiError::NotFound { item: item.into() }
    }

    /// Creates an object in use error.
    pub fn object_in_use(object: impl Into<String>) -> Self {
        SaiError::ObjectInUse {
            object: object.into(),
        }
    }

    /// Returns the SAI status equivalent of this error.
    pub fn status(&self) -> SaiStatus {
        match self {
            SaiError::Status { status, .. } => *status,
            SaiError::InsufficientResources { .. } => SaiStatus::InsufficientResources,
            SaiError::NotSupported { .. } => SaiStatus::NotSupported,
            SaiError::InvalidParameter { .. } => SaiStatus::InvalidParameter,
            SaiError::NotFound { .. } => SaiStatus::ItemNotFound,
            SaiError::ObjectInUse { .. } => SaiStatus::ObjectInUse,
        }
    }
}

/// Result type for SAI operations.
pub type SaiResult<T> = Result<T, SaiError>;

/// Extension trait for converting raw SAI status codes.
pub trait SaiStatusExt {
    /// Converts a raw status code to a Result.
    fn to_result(self, operation: &'static str) -> SaiResult<()>;
}

impl SaiStatusExt for i32 {
    fn to_result(self, operation: &'static str) -> SaiResult<()> {
        SaiStatus::from_raw(self).into_result(operation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_success() {
        assert!(SaiStatus::Success.is_success());
        assert!(SaiStatus::Success.into_result("noop").is_ok());
    }

    #[test]
    fn test_status_failure() {
        assert!(!SaiStatus::Failure.is_success());
        let err = SaiStatus::Failure.into_result("queue_create").unwrap_err();
        assert_eq!(err.status(), SaiStatus::Failure);
        assert_eq!(err.to_string(), "queue_create failed: SAI_STATUS_FAILURE");
    }

    #[test]
    fn test_status_from_raw() {
        assert_eq!(SaiStatus::from_raw(0), SaiStatus::Success);
        assert_eq!(SaiStatus::from_raw(-7), SaiStatus::ItemNotFound);
        assert_eq!(SaiStatus::from_raw(-999), SaiStatus::Failure);
        assert_eq!(SaiStatus::InvalidAttrValue.as_raw(), -25);
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            SaiError::insufficient_resources("wred ids").status(),
            SaiStatus::InsufficientResources
        );
        assert_eq!(SaiError::not_found("pool").status(), SaiStatus::ItemNotFound);
        assert_eq!(SaiError::object_in_use("map").status(), SaiStatus::ObjectInUse);
    }

    #[test]
    fn test_raw_status_to_result() {
        assert!(0_i32.to_result("op").is_ok());
        assert!((-4_i32).to_result("op").is_err());
    }
}
