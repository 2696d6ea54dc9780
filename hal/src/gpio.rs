//! # GPIO Lines
//!
//! Boolean input lines used for dGPU power and presence sensing.

use crate::error::HalResult;

/// Named GPIO line of the hot-plug device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GpioName {
    /// Chassis base (keyboard dock) presence
    BasePresence,
    /// dGPU power rail, reflects the firmware direct power bit
    DgpuPower,
    /// dGPU physical presence on the connector
    DgpuPresence,
}

impl GpioName {
    /// All lines, in acquisition order
    pub const ALL: [GpioName; 3] = [Self::DgpuPower, Self::DgpuPresence, Self::BasePresence];

    /// Connection id used to request the line
    pub const fn con_id(self) -> &'static str {
        match self {
            Self::BasePresence => "base_presence",
            Self::DgpuPower => "dgpu_power",
            Self::DgpuPresence => "dgpu_presence",
        }
    }
}

/// Firmware resource index of a line and of its interrupt companion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpioMapping {
    /// Line name
    pub name: GpioName,
    /// Resource index of the interrupt-capable companion line
    pub irq_index: u8,
    /// Resource index of the value line
    pub value_index: u8,
}

/// Resource layout of the hot-plug device's `_CRS` GPIO entries
pub static GPIO_MAPPINGS: [GpioMapping; 3] = [
    GpioMapping { name: GpioName::BasePresence, irq_index: 0, value_index: 1 },
    GpioMapping { name: GpioName::DgpuPower,    irq_index: 2, value_index: 3 },
    GpioMapping { name: GpioName::DgpuPresence, irq_index: 4, value_index: 5 },
];

/// Look up the resource layout of a line
pub fn mapping(name: GpioName) -> Option<&'static GpioMapping> {
    GPIO_MAPPINGS.iter().find(|m| m.name == name)
}

/// Readable boolean line
///
/// Reads may sleep (lines can sit behind an I2C expander).
pub trait GpioLine: Send + Sync {
    /// Line name
    fn name(&self) -> GpioName;

    /// Read the logical line value
    fn get_value(&self) -> HalResult<bool>;
}
