//! # Link Quiescence
//!
//! After direct power is cut the root port keeps reporting the downstream
//! link for a while. The bridge must not be put into D3cold until the link
//! is gone, so the power-off sequence polls the link and slot status
//! registers with a bounded backoff.

use shps_hal::{BridgePort, Delay, HalResult, LinkStatus, SlotStatus};

use crate::config::ShpsConfig;
use crate::error::{Error, Result};

/// Source of PCIe link and slot status
pub trait LinkProbe {
    /// Read the Link Status register
    fn link_status(&self) -> HalResult<LinkStatus>;

    /// Read the Slot Status register
    fn slot_status(&self) -> HalResult<SlotStatus>;
}

impl<B: BridgePort> LinkProbe for B {
    fn link_status(&self) -> HalResult<LinkStatus> {
        self.read_link_status()
    }

    fn slot_status(&self) -> HalResult<SlotStatus> {
        self.read_slot_status()
    }
}

/// Whether the downstream device is still electrically present
///
/// A failed register read counts as all bits clear.
pub fn link_up<L: LinkProbe + ?Sized>(probe: &L) -> bool {
    let lnksta = probe.link_status().unwrap_or(LinkStatus::empty());
    let sltsta = probe.slot_status().unwrap_or(SlotStatus::empty());

    lnksta.contains(LinkStatus::DLL_LINK_ACTIVE) || sltsta.contains(SlotStatus::PRESENCE_DETECT)
}

/// Bounded link removal wait
pub struct LinkQuiescence<'a, D: Delay + ?Sized> {
    delay: &'a D,
    attempts: u32,
    interval_ms: u32,
}

impl<'a, D: Delay + ?Sized> LinkQuiescence<'a, D> {
    /// Create a monitor with explicit timing
    pub fn new(delay: &'a D, attempts: u32, interval_ms: u32) -> Self {
        Self {
            delay,
            attempts,
            interval_ms,
        }
    }

    /// Create a monitor with the configured timing
    pub fn from_config(delay: &'a D, config: &ShpsConfig) -> Self {
        Self::new(delay, config.poll_attempts, config.poll_interval_ms)
    }

    /// Poll until the link is down
    ///
    /// Returns the number of intervals slept before removal was observed,
    /// or [`Error::Timeout`] if the link is still up after every attempt
    /// and a final check.
    pub fn poll<L: LinkProbe + ?Sized>(&self, probe: &L) -> Result<u32> {
        for attempt in 0..self.attempts {
            if !link_up(probe) {
                return Ok(attempt);
            }
            self.delay.sleep_ms(self.interval_ms);
        }

        if link_up(probe) {
            Err(Error::Timeout)
        } else {
            Ok(self.attempts)
        }
    }

    /// Poll until the link is down; `false` on timeout
    ///
    /// Timeouts are not logged here; the caller decides how to react.
    pub fn wait_for_removal<L: LinkProbe + ?Sized>(&self, probe: &L) -> bool {
        match self.poll(probe) {
            Ok(waited) => {
                let waited_ms = u64::from(waited) * u64::from(self.interval_ms);
                log::debug!("dGPU link removed after {} ms", waited_ms);
                true
            },
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use core::cell::Cell;

    use shps_hal::mock::{LinkRemoval, MockBoard, ROOT_PORT_ADDR};
    use shps_hal::{HalError, Platform};

    use super::*;
    use crate::testutil as testlog;

    struct Scripted {
        lnk: Cell<u32>,
        slt: Cell<u32>,
    }

    impl LinkProbe for Scripted {
        fn link_status(&self) -> HalResult<LinkStatus> {
            let n = self.lnk.get();
            self.lnk.set(n.saturating_sub(1));
            Ok(if n > 0 {
                LinkStatus::DLL_LINK_ACTIVE
            } else {
                LinkStatus::empty()
            })
        }

        fn slot_status(&self) -> HalResult<SlotStatus> {
            let n = self.slt.get();
            self.slt.set(n.saturating_sub(1));
            Ok(if n > 0 {
                SlotStatus::PRESENCE_DETECT
            } else {
                SlotStatus::empty()
            })
        }
    }

    struct Broken;

    impl LinkProbe for Broken {
        fn link_status(&self) -> HalResult<LinkStatus> {
            Err(HalError::Io)
        }

        fn slot_status(&self) -> HalResult<SlotStatus> {
            Err(HalError::Io)
        }
    }

    #[test]
    fn test_immediate_removal() {
        let board = MockBoard::new();
        board.set_link_up(false);
        let platform = board.platform();
        let bridge = platform.pci_device(ROOT_PORT_ADDR).expect("bridge");

        let monitor = LinkQuiescence::new(&platform, 20, 50);
        assert_eq!(monitor.poll(&bridge), Ok(0));
        assert_eq!(board.counters().sleeps, 0);
    }

    #[test]
    fn test_removal_after_polls() {
        let board = MockBoard::new();
        board.set_link_removal(LinkRemoval::AfterPolls(3));
        let platform = board.platform();
        let bridge = platform.pci_device(ROOT_PORT_ADDR).expect("bridge");
        let dsm = platform.dsm().expect("dsm");
        let line = platform.gpio(shps_hal::GpioName::DgpuPower).expect("gpio");
        crate::dsm::FirmwarePower::new(&dsm, &line)
            .set(crate::power::DevicePower::Off)
            .expect("cut power");

        let monitor = LinkQuiescence::new(&platform, 20, 50);
        assert_eq!(monitor.poll(&bridge), Ok(3));
        assert_eq!(board.counters().slept_ms, 150);
    }

    #[test]
    fn test_timeout_after_budget() {
        let board = MockBoard::new();
        board.set_link_removal(LinkRemoval::Never);
        let platform = board.platform();
        let bridge = platform.pci_device(ROOT_PORT_ADDR).expect("bridge");

        let monitor = LinkQuiescence::from_config(&platform, &ShpsConfig::default());
        assert!(!monitor.wait_for_removal(&bridge));

        let c = board.counters();
        assert_eq!(c.sleeps, 20);
        assert_eq!(c.slept_ms, 1000);
        assert_eq!(c.link_reads, 21);
    }

    #[test]
    fn test_timeout_leaves_reporting_to_caller() {
        testlog::capture();
        let board = MockBoard::new();
        board.set_link_removal(LinkRemoval::Never);
        let platform = board.platform();
        let bridge = platform.pci_device(ROOT_PORT_ADDR).expect("bridge");

        assert!(!LinkQuiescence::new(&platform, 2, 1).wait_for_removal(&bridge));
        assert_eq!(testlog::count_level(log::Level::Warn), 0);
    }

    #[test]
    fn test_long_interval_wait_is_logged_in_full() {
        testlog::capture();
        let board = MockBoard::new();
        board.set_link_removal(LinkRemoval::AfterPolls(2));
        let platform = board.platform();
        let bridge = platform.pci_device(ROOT_PORT_ADDR).expect("bridge");
        let dsm = platform.dsm().expect("dsm");
        let line = platform.gpio(shps_hal::GpioName::DgpuPower).expect("gpio");
        crate::dsm::FirmwarePower::new(&dsm, &line)
            .set(crate::power::DevicePower::Off)
            .expect("cut power");

        let interval = u32::MAX / 2 + 1;
        let monitor = LinkQuiescence::new(&platform, 10, interval);
        assert!(monitor.wait_for_removal(&bridge));
        assert_eq!(board.counters().slept_ms, 2 * u64::from(interval));
        assert_eq!(
            testlog::count(log::Level::Debug, "dGPU link removed after 4294967296 ms"),
            1
        );
    }

    #[test]
    fn test_slot_presence_keeps_link_up() {
        let board = MockBoard::new();
        let platform = board.platform();
        let probe = Scripted {
            lnk: Cell::new(0),
            slt: Cell::new(2),
        };

        assert_eq!(LinkQuiescence::new(&platform, 20, 50).poll(&probe), Ok(2));
    }

    #[test]
    fn test_final_check_after_last_sleep() {
        let board = MockBoard::new();
        let platform = board.platform();
        let probe = Scripted {
            lnk: Cell::new(3),
            slt: Cell::new(0),
        };

        assert_eq!(LinkQuiescence::new(&platform, 3, 10).poll(&probe), Ok(3));
    }

    #[test]
    fn test_failed_reads_count_as_down() {
        assert!(!link_up(&Broken));
    }
}
