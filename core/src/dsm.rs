//! # Firmware Direct Power
//!
//! The platform `_DSM` of the hot-plug device controls the dGPU power rail
//! directly, bypassing the root port. The rail itself is read back through
//! the `dgpu_power` GPIO line.

use shps_hal::{AcpiObject, AcpiObjectType, DsmMethod, GpioLine, Guid};

use crate::error::{Error, Result};
use crate::power::DevicePower;

// =============================================================================
// FIRMWARE INTERFACE
// =============================================================================

/// `_DSM` UUID of the hot-plug device
pub const SHPS_DSM_UUID: Guid = Guid::new(
    0x5515a847,
    0xed55,
    0x4b27,
    [0x83, 0x52, 0xcd, 0x32, 0x0e, 0x10, 0x36, 0x0a],
);

/// `_DSM` revision
pub const SHPS_DSM_REVISION: u64 = 1;

/// Function returning the PCI address table
pub const SHPS_DSM_GPU_ADDRS: u64 = 0x02;

/// Function setting direct dGPU power
pub const SHPS_DSM_GPU_POWER: u64 = 0x05;

// =============================================================================
// FIRMWARE POWER METHOD
// =============================================================================

/// Borrowed view of the firmware power path
pub struct FirmwarePower<'a, D: DsmMethod, G: GpioLine> {
    dsm: &'a D,
    line: &'a G,
}

impl<'a, D: DsmMethod, G: GpioLine> FirmwarePower<'a, D, G> {
    /// Bind the `_DSM` evaluator and the power rail line
    pub fn new(dsm: &'a D, line: &'a G) -> Self {
        Self { dsm, line }
    }

    /// Read the power rail
    pub fn get(&self) -> Result<DevicePower> {
        let on = self.line.get_value().map_err(|_| Error::Io)?;
        Ok(DevicePower::from(on))
    }

    /// Assert direct power
    ///
    /// Returns `false` without calling firmware when the rail already
    /// matches `target`.
    pub fn set(&self, target: DevicePower) -> Result<bool> {
        if !target.is_target() {
            return Err(Error::InvalidArgument);
        }

        if self.get()? == target {
            return Ok(false);
        }

        log::info!("setting dGPU direct power to '{}'", target);

        let param = AcpiObject::Integer(u64::from(target == DevicePower::On));
        let result = self
            .dsm
            .evaluate_typed(
                &SHPS_DSM_UUID,
                SHPS_DSM_REVISION,
                SHPS_DSM_GPU_POWER,
                Some(&param),
                AcpiObjectType::Buffer,
            )
            .map_err(|e| {
                log::error!("failed to evaluate dGPU direct power method: {}", e);
                Error::Io
            })?;

        match result.as_buffer() {
            Some([0]) => Ok(true),
            other => {
                log::error!("unexpected result from dGPU direct power method: {:02x?}", other);
                Err(Error::Io)
            },
        }
    }
}
