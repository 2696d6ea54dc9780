//! # Bus Power Controller
//!
//! Root-port D-state transitions for the dGPU.
//!
//! Power-on brings the root port to D0, which makes the firmware raise the
//! rail and emit a power-on notification before the transition returns.
//! Power-off first removes the device through the firmware path, waits for
//! the link to drop, then parks the root port in D3cold.

use shps_hal::{BridgePort, Delay, DsmMethod, GpioLine, PciPowerState};

use crate::dsm::FirmwarePower;
use crate::error::{Error, Result};
use crate::link::LinkQuiescence;
use crate::power::DevicePower;
use crate::state::{Phase, PhaseCell, PowerBook};

/// Result of a bus power request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusOutcome {
    /// Already at target, nothing touched
    Unchanged,
    /// Root port brought to D0
    PoweredOn,
    /// Root port parked in D3cold
    PoweredOff {
        /// Whether the link dropped before the deadline
        link_removed: bool,
    },
}

/// Power state of the dGPU as seen through its root port
pub fn bus_power_of<B: BridgePort + ?Sized>(bridge: &B) -> DevicePower {
    DevicePower::from_pci(bridge.current_state())
}

/// Borrowed view of everything a bus transition touches
///
/// Only constructed while the coordinator lock is held.
pub struct BusPower<'a, B, D, G, L>
where
    B: BridgePort,
    D: DsmMethod,
    G: GpioLine,
    L: Delay + ?Sized,
{
    bridge: &'a mut B,
    firmware: FirmwarePower<'a, D, G>,
    quiescence: LinkQuiescence<'a, L>,
    book: &'a mut PowerBook,
    phase: &'a PhaseCell,
}

impl<'a, B, D, G, L> BusPower<'a, B, D, G, L>
where
    B: BridgePort,
    D: DsmMethod,
    G: GpioLine,
    L: Delay + ?Sized,
{
    /// Assemble a controller
    pub fn new(
        bridge: &'a mut B,
        firmware: FirmwarePower<'a, D, G>,
        quiescence: LinkQuiescence<'a, L>,
        book: &'a mut PowerBook,
        phase: &'a PhaseCell,
    ) -> Self {
        Self {
            bridge,
            firmware,
            quiescence,
            book,
            phase,
        }
    }

    /// Current bus-side power state
    pub fn get(&self) -> DevicePower {
        bus_power_of(&*self.bridge)
    }

    /// Drive the root port to `target`
    pub fn set(&mut self, target: DevicePower) -> Result<BusOutcome> {
        if !target.is_target() {
            return Err(Error::InvalidArgument);
        }

        if self.get() == target {
            return Ok(BusOutcome::Unchanged);
        }

        log::info!("setting dGPU power state to '{}'", target);

        match target {
            DevicePower::On => self.power_on(),
            _ => self.power_off(),
        }
    }

    fn power_on(&mut self) -> Result<BusOutcome> {
        let transition = self.book.begin(self.phase, Phase::PoweringOn);

        // Firmware notifies synchronously from inside this call.
        self.bridge.set_power_state(PciPowerState::D0)?;
        self.bridge.restore_state();
        self.bridge.enable_device()?;
        self.bridge.set_master();

        transition.complete();
        Ok(BusOutcome::PoweredOn)
    }

    fn power_off(&mut self) -> Result<BusOutcome> {
        let transition = self.book.begin(self.phase, Phase::PoweringOff);

        self.bridge.save_state()?;
        self.firmware.set(DevicePower::Off)?;

        let link_removed = self.quiescence.wait_for_removal(&*self.bridge);
        if !link_removed {
            log::warn!("dGPU removal via firmware timed out");
        }

        self.bridge.clear_master();
        self.bridge.disable_device();
        self.bridge.set_power_state(PciPowerState::D3Cold)?;

        transition.complete();
        Ok(BusOutcome::PoweredOff { link_removed })
    }
}
