//! # PCI Bridge Abstraction
//!
//! Addressing, D-states and the PCIe capability registers the coordinator
//! reads while a downstream device is being removed.

use core::fmt;

use static_assertions::const_assert_eq;

use crate::error::HalResult;

// =============================================================================
// ADDRESSING
// =============================================================================

/// PCI function address (segment:bus:device.function)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PciAddr {
    /// Segment (domain)
    pub segment: u16,
    /// Bus number
    pub bus: u8,
    /// Device number (5 bits)
    pub device: u8,
    /// Function number (3 bits)
    pub function: u8,
}

impl PciAddr {
    /// Create a new address
    #[inline]
    pub const fn new(segment: u16, bus: u8, device: u8, function: u8) -> Self {
        Self {
            segment,
            bus,
            device: device & 0x1f,
            function: function & 0x07,
        }
    }

    /// Create an address in segment 0
    #[inline(always)]
    pub const fn from_bdf(bus: u8, device: u8, function: u8) -> Self {
        Self::new(0, bus, device, function)
    }

    /// Encoded device/function byte
    #[inline(always)]
    pub const fn devfn(&self) -> u8 {
        (self.device << 3) | self.function
    }

    /// Encoded bus/devfn word
    #[inline(always)]
    pub const fn bdf(&self) -> u16 {
        ((self.bus as u16) << 8) | self.devfn() as u16
    }
}

impl fmt::Display for PciAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04x}:{:02x}:{:02x}.{}",
            self.segment, self.bus, self.device, self.function
        )
    }
}

// =============================================================================
// POWER STATES
// =============================================================================

/// PCI power management state as tracked by the bus layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PciPowerState {
    /// Fully on
    D0,
    /// Light sleep
    D1,
    /// Deeper sleep
    D2,
    /// Off, auxiliary power present
    D3Hot,
    /// Off, main power removed
    D3Cold,
    /// State has not been determined yet
    Unknown,
    /// Last transition failed
    Error,
}

impl PciPowerState {
    /// Check if the state is one of the D3 variants
    pub const fn is_d3(self) -> bool {
        matches!(self, Self::D3Hot | Self::D3Cold)
    }

    /// Check if the bus layer has no reliable view of the state
    pub const fn is_indeterminate(self) -> bool {
        matches!(self, Self::Unknown | Self::Error)
    }

    /// Short name as printed by the bus layer
    pub const fn name(self) -> &'static str {
        match self {
            Self::D0 => "D0",
            Self::D1 => "D1",
            Self::D2 => "D2",
            Self::D3Hot => "D3hot",
            Self::D3Cold => "D3cold",
            Self::Unknown => "unknown",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for PciPowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// PCIE CAPABILITY REGISTERS
// =============================================================================

bitflags::bitflags! {
    /// PCIe Link Status register (capability offset 0x12)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct LinkStatus: u16 {
        /// Link training in progress
        const LINK_TRAINING = 1 << 11;
        /// Slot uses the reference clock
        const SLOT_CLOCK = 1 << 12;
        /// Data Link Layer link active
        const DLL_LINK_ACTIVE = 1 << 13;
        /// Link bandwidth management status
        const BW_MGMT = 1 << 14;
        /// Link autonomous bandwidth status
        const AUTO_BW = 1 << 15;
    }
}

bitflags::bitflags! {
    /// PCIe Slot Status register (capability offset 0x1a)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SlotStatus: u16 {
        /// Attention button pressed
        const ATTN_BUTTON = 1 << 0;
        /// Power fault detected
        const POWER_FAULT = 1 << 1;
        /// MRL sensor changed
        const MRL_CHANGED = 1 << 2;
        /// Presence detect changed
        const PRESENCE_CHANGED = 1 << 3;
        /// Command completed
        const CMD_COMPLETED = 1 << 4;
        /// MRL sensor state
        const MRL_STATE = 1 << 5;
        /// Presence detect state
        const PRESENCE_DETECT = 1 << 6;
        /// Electromechanical interlock status
        const EMI = 1 << 7;
        /// Data link layer state changed
        const DLL_CHANGED = 1 << 8;
    }
}

const_assert_eq!(LinkStatus::DLL_LINK_ACTIVE.bits(), 0x2000);
const_assert_eq!(SlotStatus::PRESENCE_DETECT.bits(), 0x0040);

// =============================================================================
// BRIDGE PORT TRAIT
// =============================================================================

/// Upstream bridge (root port) of the hot-pluggable device
///
/// Mirrors the bus-layer primitives: D-state transitions, configuration
/// space save/restore, device enable and bus mastering. Transitions out of
/// D3cold may synchronously invoke firmware notification handlers before
/// [`BridgePort::set_power_state`] returns.
pub trait BridgePort: Send {
    /// Bus address of the port
    fn address(&self) -> PciAddr;

    /// Current D-state as tracked by the bus layer
    fn current_state(&self) -> PciPowerState;

    /// Transition to a new D-state
    fn set_power_state(&mut self, state: PciPowerState) -> HalResult<()>;

    /// Save configuration space for a later restore
    fn save_state(&mut self) -> HalResult<()>;

    /// Restore previously saved configuration space (no-op if nothing saved)
    fn restore_state(&mut self);

    /// Enable the device (I/O, memory decoding)
    fn enable_device(&mut self) -> HalResult<()>;

    /// Disable the device
    fn disable_device(&mut self);

    /// Check if the device is enabled
    fn is_enabled(&self) -> bool;

    /// Enable bus mastering
    fn set_master(&mut self);

    /// Disable bus mastering
    fn clear_master(&mut self);

    /// Read the PCIe Link Status register
    fn read_link_status(&self) -> HalResult<LinkStatus>;

    /// Read the PCIe Slot Status register
    fn read_slot_status(&self) -> HalResult<SlotStatus>;
}
