//! # Platform Abstraction
//!
//! Resource acquisition for the hot-plug device. Each target (kernel glue,
//! simulator, test board) implements [`Platform`] once; every handle it
//! hands out is exclusively owned by the caller and released on drop.

use alloc::sync::Arc;

use crate::acpi::DsmMethod;
use crate::error::HalResult;
use crate::gpio::{GpioLine, GpioName};
use crate::irq::{EdgeHandler, IrqFlags};
use crate::pci::{BridgePort, PciAddr};

/// Sleeping delay source
pub trait Delay {
    /// Sleep for at least `ms` milliseconds
    fn sleep_ms(&self, ms: u32);
}

/// Platform abstraction trait
pub trait Platform: Delay + Send + Sync + 'static {
    /// Root-port handle type
    type Bridge: BridgePort;
    /// GPIO line handle type
    type Gpio: GpioLine;
    /// `_DSM` evaluator type
    type Dsm: DsmMethod;
    /// Interrupt registration; dropping it frees the interrupt
    type Irq: Send + Sync;

    /// Get platform name
    fn name(&self) -> &'static str;

    /// Number of GPIO resources described by firmware for the device
    fn gpio_count(&self) -> usize;

    /// Get the `_DSM` evaluator of the hot-plug device
    fn dsm(&self) -> HalResult<Self::Dsm>;

    /// Look up a PCI function by address
    fn pci_device(&self, addr: PciAddr) -> HalResult<Self::Bridge>;

    /// Acquire a named GPIO line as input
    fn gpio(&self, name: GpioName) -> HalResult<Self::Gpio>;

    /// Request a threaded interrupt on the line's interrupt companion
    fn request_irq(
        &self,
        line: &Self::Gpio,
        label: &'static str,
        flags: IrqFlags,
        handler: Arc<dyn EdgeHandler>,
    ) -> HalResult<Self::Irq>;
}
