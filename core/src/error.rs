//! # SHPS Error Handling
//!
//! Error types for the power coordination engine.
//!
//! - Setup failures abort probe and unwind what was acquired
//! - Runtime failures return to the caller
//! - Interrupt and firmware-event failures are logged only

use core::fmt;

use shps_hal::HalError;

use crate::config::ConfigError;

// =============================================================================
// RESULT TYPE
// =============================================================================

/// SHPS Result type alias
pub type Result<T> = core::result::Result<T, Error>;

// =============================================================================
// ERRNO VALUES
// =============================================================================

/// Negative status codes reported through the attribute surface
pub mod errno {
    /// No such device
    pub const ENODEV: i32 = 19;
    /// I/O error
    pub const EIO: i32 = 5;
    /// Invalid argument
    pub const EINVAL: i32 = 22;
    /// Device or resource busy
    pub const EBUSY: i32 = 16;
    /// Connection timed out
    pub const ETIMEDOUT: i32 = 110;
    /// Operation not supported
    pub const EOPNOTSUPP: i32 = 95;
    /// Function not implemented
    pub const ENOSYS: i32 = 38;
}

// =============================================================================
// ERROR ENUM
// =============================================================================

/// SHPS unified error type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// Target is not a settable power state, or input did not parse
    InvalidArgument,
    /// Device, line, table entry or attribute does not exist
    NotFound,
    /// Line read, register access or firmware call failed
    Io,
    /// Bounded wait expired
    Timeout,
    /// Firmware does not implement the requested method
    MethodNotPresent,
    /// Firmware address table has an unexpected layout
    MalformedTable,
    /// Resource already claimed
    Busy,
    /// Operation not supported by the platform
    NotSupported,
    /// Raw platform status code
    Platform(i32),
    /// Configuration rejected
    Config(ConfigError),
}

impl Error {
    /// Negative errno value for this error
    pub const fn errno(&self) -> i32 {
        let code = match self {
            Self::InvalidArgument | Self::Config(_) => errno::EINVAL,
            Self::NotFound => errno::ENODEV,
            Self::Io | Self::MalformedTable => errno::EIO,
            Self::Timeout => errno::ETIMEDOUT,
            Self::MethodNotPresent => errno::ENOSYS,
            Self::Busy => errno::EBUSY,
            Self::NotSupported => errno::EOPNOTSUPP,
            Self::Platform(code) => return *code,
        };
        -code
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument => write!(f, "invalid argument"),
            Self::NotFound => write!(f, "no such device"),
            Self::Io => write!(f, "I/O error"),
            Self::Timeout => write!(f, "operation timed out"),
            Self::MethodNotPresent => write!(f, "firmware method not present"),
            Self::MalformedTable => write!(f, "malformed firmware address table"),
            Self::Busy => write!(f, "resource busy"),
            Self::NotSupported => write!(f, "operation not supported"),
            Self::Platform(code) => write!(f, "platform error {}", code),
            Self::Config(e) => write!(f, "configuration error: {}", e),
        }
    }
}

impl From<HalError> for Error {
    fn from(e: HalError) -> Self {
        match e {
            HalError::NotFound => Self::NotFound,
            HalError::MethodNotPresent => Self::MethodNotPresent,
            HalError::Busy => Self::Busy,
            HalError::NotSupported => Self::NotSupported,
            HalError::Errno(code) => Self::Platform(code),
            _ => Self::Io,
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hal_conversion() {
        assert_eq!(Error::from(HalError::Io), Error::Io);
        assert_eq!(Error::from(HalError::UnexpectedType), Error::Io);
        assert_eq!(Error::from(HalError::NotFound), Error::NotFound);
        assert_eq!(Error::from(HalError::Errno(-62)), Error::Platform(-62));
    }

    #[test]
    fn test_errno_mapping() {
        assert_eq!(Error::InvalidArgument.errno(), -22);
        assert_eq!(Error::NotFound.errno(), -19);
        assert_eq!(Error::Io.errno(), -5);
        assert_eq!(Error::MalformedTable.errno(), -5);
        assert_eq!(Error::Timeout.errno(), -110);
        assert_eq!(Error::Busy.errno(), -16);
        assert_eq!(Error::Platform(-62).errno(), -62);
        assert_eq!(Error::Config(ConfigError::ZeroPollAttempts).errno(), -22);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Error::Io), "I/O error");
        assert_eq!(
            format!("{}", Error::Config(ConfigError::ZeroPollInterval)),
            "configuration error: poll interval must be non-zero"
        );
    }
}
