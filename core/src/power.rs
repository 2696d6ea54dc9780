//! # Device Power State
//!
//! The tri-valued power view shared by both control paths.

use core::fmt;

use shps_hal::PciPowerState;

use crate::error::Error;

/// Observed or requested device power state
///
/// `Unknown` is only ever reported by the bus path; it is never a valid
/// target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DevicePower {
    /// Powered off
    Off     = 0,
    /// Powered on
    On      = 1,
    /// Bus reported an error or indeterminate D-state
    Unknown = 2,
}

impl DevicePower {
    /// Textual form
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::On => "on",
            Self::Unknown => "unknown",
        }
    }

    /// Whether this value may be requested as a target
    pub const fn is_target(self) -> bool {
        matches!(self, Self::Off | Self::On)
    }

    /// Classify a root-port D-state
    pub const fn from_pci(state: PciPowerState) -> Self {
        if state.is_d3() {
            Self::Off
        } else if state.is_indeterminate() {
            Self::Unknown
        } else {
            Self::On
        }
    }
}

impl From<bool> for DevicePower {
    fn from(on: bool) -> Self {
        if on {
            Self::On
        } else {
            Self::Off
        }
    }
}

impl TryFrom<u8> for DevicePower {
    type Error = Error;

    fn try_from(raw: u8) -> Result<Self, Error> {
        match raw {
            0 => Ok(Self::Off),
            1 => Ok(Self::On),
            2 => Ok(Self::Unknown),
            _ => Err(Error::InvalidArgument),
        }
    }
}

impl fmt::Display for DevicePower {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Control path through which power is queried or set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PowerPath {
    /// Firmware direct-power method and the power rail line
    Firmware,
    /// Root-port D-state transition
    Bus,
}

impl PowerPath {
    /// Short name used in log messages
    pub const fn name(self) -> &'static str {
        match self {
            Self::Firmware => "dsm",
            Self::Bus => "rp",
        }
    }
}

impl fmt::Display for PowerPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
