//! # Driver Lifecycle
//!
//! Binds the coordinator to a hot-plug device instance.
//!
//! ## Probe sequence
//!
//! 1. Validate configuration
//! 2. Check the firmware describes GPIO resources
//! 3. Open the `_DSM` evaluator
//! 4. Resolve the root port from the address table
//! 5. Acquire `dgpu_power`, `dgpu_presence`, `base_presence`
//! 6. Build the coordinator
//! 7. Request the presence interrupt
//! 8. Register the firmware event dispatcher
//! 9. Optionally park the dGPU
//!
//! A failure at any step drops everything acquired so far, newest first.
//! Removal releases in the same order by dropping the driver.

use alloc::sync::Arc;

use shps_hal::{BridgePort, GpioName, HalError, Platform, RequestChannel};

use crate::attrs::{attribute_path, PowerAttribute, ATTRIBUTE_NAMES};
use crate::config::ShpsConfig;
use crate::coordinator::{Coordinator, DeviceHandles};
use crate::discovery;
use crate::error::{Error, Result};
use crate::events::{DispatcherRegistration, FirmwareEventDispatcher};
use crate::power::{DevicePower, PowerPath};
use crate::presence::{PresenceMonitor, PRESENCE_IRQ_FLAGS, PRESENCE_IRQ_NAME};

/// Driver name
pub const SHPS_DRIVER_NAME: &str = "surface_dgpu_hps";

/// ACPI hardware id of the hot-plug device
pub const SHPS_ACPI_ID: &str = "MSHW0153";

fn acquire_line<P: Platform>(platform: &P, name: GpioName) -> Result<P::Gpio> {
    platform.gpio(name).map_err(|e| {
        log::error!("failed to get gpio '{}': {}", name.con_id(), e);
        Error::from(e)
    })
}

/// Bound driver instance
///
/// Fields drop in declaration order, which is the teardown order.
pub struct ShpsDriver<P: Platform, C: RequestChannel + ?Sized> {
    registration: DispatcherRegistration<C>,
    irq: P::Irq,
    presence: Arc<PresenceMonitor<P>>,
    coordinator: Arc<Coordinator<P>>,
}

impl<P: Platform, C: RequestChannel + ?Sized> ShpsDriver<P, C> {
    /// Bind to the device described by `platform`
    pub fn probe(platform: P, channel: Arc<C>, config: ShpsConfig) -> Result<Self> {
        config.validate()?;

        if platform.gpio_count() == 0 {
            log::debug!("{}: no GPIO resources described", platform.name());
            return Err(Error::NotFound);
        }

        let dsm = platform.dsm()?;
        let bridge = discovery::root_port(&platform, &dsm).map_err(|e| {
            log::error!("failed to resolve dGPU root port: {}", e);
            e
        })?;
        log::info!("dGPU root port at {}", bridge.address());

        let power = acquire_line(&platform, GpioName::DgpuPower)?;
        let presence = acquire_line(&platform, GpioName::DgpuPresence)?;
        let base_presence = acquire_line(&platform, GpioName::BasePresence)?;

        let handles = DeviceHandles {
            bridge,
            dsm,
            power,
            presence,
            base_presence,
        };
        let coordinator = Arc::new(Coordinator::new(platform, handles, config)?);

        let monitor = Arc::new(PresenceMonitor::new(coordinator.clone()));
        let irq = coordinator
            .platform()
            .request_irq(
                coordinator.presence_line(),
                PRESENCE_IRQ_NAME,
                PRESENCE_IRQ_FLAGS,
                monitor.clone(),
            )
            .map_err(|e: HalError| {
                log::error!("failed to request presence interrupt: {}", e);
                Error::from(e)
            })?;

        let registration = FirmwareEventDispatcher::register(coordinator.clone(), channel);

        if config.power_off_at_probe {
            coordinator.set_power(PowerPath::Bus, DevicePower::Off)?;
        }

        Ok(Self {
            registration,
            irq,
            presence: monitor,
            coordinator,
        })
    }

    /// Unbind; handles are released in teardown order
    pub fn remove(self) {
        log::debug!("removing {}", SHPS_DRIVER_NAME);
        drop(self);
    }

    /// System shutdown hook
    pub fn shutdown(&self) {
        if self.coordinator.config().power_on_at_shutdown {
            self.coordinator.on_system_shutdown();
        }
    }

    /// System suspend-prepare hook
    pub fn suspend_prepare(&self) -> Result<()> {
        self.coordinator.prepare_for_system_suspend()
    }

    /// System resume-complete hook
    pub fn resume_complete(&self) {
        self.coordinator.on_system_resume_complete();
    }

    /// Look up a power attribute by name
    pub fn attribute(&self, name: &str) -> Result<PowerAttribute<P>> {
        attribute_path(name)
            .map(|path| PowerAttribute::new(self.coordinator.clone(), path))
            .ok_or(Error::NotFound)
    }

    /// Names of every exposed attribute
    pub fn attribute_names(&self) -> &'static [&'static str] {
        &ATTRIBUTE_NAMES
    }

    /// The coordinator
    pub fn coordinator(&self) -> &Arc<Coordinator<P>> {
        &self.coordinator
    }

    /// The presence monitor
    pub fn presence(&self) -> &PresenceMonitor<P> {
        &self.presence
    }

    /// Interrupt registration of the presence line
    pub fn irq(&self) -> &P::Irq {
        &self.irq
    }

    /// Firmware event registration
    pub fn registration(&self) -> &DispatcherRegistration<C> {
        &self.registration
    }
}
