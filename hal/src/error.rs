//! # HAL Error Handling
//!
//! Errors reported by platform collaborators. They carry no context beyond
//! the category; callers log where the failure happened.

use core::fmt;

/// HAL result type alias
pub type HalResult<T> = core::result::Result<T, HalError>;

/// Platform service failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum HalError {
    /// Line, register or firmware transport failure
    Io,
    /// Requested device, line or entry does not exist
    NotFound,
    /// The firmware method is not implemented by this device
    MethodNotPresent,
    /// Firmware returned an object of the wrong type
    UnexpectedType,
    /// Resource is already claimed by another owner
    Busy,
    /// Operation not supported on this platform
    NotSupported,
    /// Raw negative status code from the platform
    Errno(i32),
}

impl fmt::Display for HalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io => write!(f, "I/O error"),
            Self::NotFound => write!(f, "not found"),
            Self::MethodNotPresent => write!(f, "firmware method not present"),
            Self::UnexpectedType => write!(f, "unexpected firmware object type"),
            Self::Busy => write!(f, "resource busy"),
            Self::NotSupported => write!(f, "operation not supported"),
            Self::Errno(code) => write!(f, "platform error {}", code),
        }
    }
}
