//! # Control Surface
//!
//! The two user-facing power knobs of the hot-plug device:
//!
//! | Attribute        | Path     |
//! |------------------|----------|
//! | `dgpu_power`     | Bus      |
//! | `dgpu_power_dsm` | Firmware |
//!
//! Reads print the state followed by a newline; writes accept a boolean.

use alloc::string::String;
use alloc::sync::Arc;

use shps_hal::Platform;

use crate::coordinator::Coordinator;
use crate::error::{Error, Result};
use crate::power::{DevicePower, PowerPath};

/// Bus path attribute name
pub const DGPU_POWER: &str = "dgpu_power";

/// Firmware path attribute name
pub const DGPU_POWER_DSM: &str = "dgpu_power_dsm";

/// All attribute names, in registration order
pub const ATTRIBUTE_NAMES: [&str; 2] = [DGPU_POWER, DGPU_POWER_DSM];

/// Path controlled by a named attribute
pub fn attribute_path(name: &str) -> Option<PowerPath> {
    match name {
        DGPU_POWER => Some(PowerPath::Bus),
        DGPU_POWER_DSM => Some(PowerPath::Firmware),
        _ => None,
    }
}

/// Parse a boolean the way kernel attributes do
///
/// Only the leading one or two characters are significant.
pub fn parse_bool(input: &str) -> Result<bool> {
    let bytes = input.as_bytes();
    match bytes.first() {
        Some(b'y' | b'Y' | b't' | b'T' | b'e' | b'E' | b'1') => Ok(true),
        Some(b'n' | b'N' | b'f' | b'F' | b'd' | b'D' | b'0') => Ok(false),
        Some(b'o' | b'O') => match bytes.get(1) {
            Some(b'n' | b'N') => Ok(true),
            Some(b'f' | b'F') => Ok(false),
            _ => Err(Error::InvalidArgument),
        },
        _ => Err(Error::InvalidArgument),
    }
}

/// One power attribute bound to a coordinator
pub struct PowerAttribute<P: Platform> {
    coordinator: Arc<Coordinator<P>>,
    path: PowerPath,
}

impl<P: Platform> PowerAttribute<P> {
    /// Bind the attribute for `path`
    pub fn new(coordinator: Arc<Coordinator<P>>, path: PowerPath) -> Self {
        Self { coordinator, path }
    }

    /// Attribute name
    pub fn name(&self) -> &'static str {
        match self.path {
            PowerPath::Bus => DGPU_POWER,
            PowerPath::Firmware => DGPU_POWER_DSM,
        }
    }

    /// Controlled path
    pub fn path(&self) -> PowerPath {
        self.path
    }

    /// Render the current state
    pub fn show(&self) -> Result<String> {
        let power = self.coordinator.get_power(self.path)?;
        let mut out = String::from(power.as_str());
        out.push('\n');
        Ok(out)
    }

    /// Apply a written value; returns the number of bytes consumed
    pub fn store(&self, input: &str) -> Result<usize> {
        let target = DevicePower::from(parse_bool(input)?);
        self.coordinator.set_power(self.path, target)?;
        Ok(input.len())
    }

    /// [`PowerAttribute::store`] with the result folded into a status code
    pub fn store_status(&self, input: &str) -> isize {
        match self.store(input) {
            Ok(count) => count as isize,
            Err(e) => e.errno() as isize,
        }
    }
}
