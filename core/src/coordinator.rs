//! # Power State Coordinator
//!
//! Single owner of the dGPU handles and of the power intent. Every query and
//! transition on either control path runs under one lock; presence edges and
//! firmware notifications call back in from their own contexts and take the
//! same lock.
//!
//! ```text
//!   attribute / lifecycle ──┐
//!   presence edge ──────────┼──▶ lock ──▶ FirmwarePower / BusPower ──▶ unlock
//!   firmware power-on ──────┘      ▲
//!        │                         │
//!        └── phase probe (no lock) ┘  self-initiated power-on returns early
//! ```
//!
//! The firmware power-on notification is delivered synchronously from
//! inside the root port's D0 transition, while the lock is held by the
//! caller of [`Coordinator::set_power`]. The phase probe is therefore read
//! before anything else in [`Coordinator::on_unexpected_power_on`].

use shps_hal::{BridgePort, GpioLine, PciAddr, Platform};
use spin::Mutex;
use static_assertions::assert_impl_all;

use crate::bridge::{bus_power_of, BusOutcome, BusPower};
use crate::config::ShpsConfig;
use crate::dsm::FirmwarePower;
use crate::error::{Error, Result};
use crate::link::LinkQuiescence;
use crate::power::{DevicePower, PowerPath};
use crate::state::{Phase, PhaseCell, PowerBook, SelfTransitionProbe};
use crate::stats::{CoordinatorStats, StatsSnapshot};

assert_impl_all!(PhaseCell: Send, Sync);
assert_impl_all!(CoordinatorStats: Send, Sync);

// =============================================================================
// HANDLES
// =============================================================================

/// Hardware handles owned by the coordinator
pub struct DeviceHandles<P: Platform> {
    /// Upstream root port of the dGPU
    pub bridge: P::Bridge,
    /// `_DSM` evaluator of the hot-plug device
    pub dsm: P::Dsm,
    /// `dgpu_power` line
    pub power: P::Gpio,
    /// `dgpu_presence` line
    pub presence: P::Gpio,
    /// `base_presence` line
    pub base_presence: P::Gpio,
}

// The lock is a spinlock held across the whole power-off sequence, link
// quiescence sleeps included. Presence edges and firmware events arriving
// meanwhile spin until it is released; `ShpsConfig::validate` caps that
// at `MAX_QUIESCENCE_MS`.
struct Inner<P: Platform> {
    bridge: P::Bridge,
    dsm: P::Dsm,
    power: P::Gpio,
    book: PowerBook,
}

// =============================================================================
// COORDINATOR
// =============================================================================

/// dGPU power state coordinator
pub struct Coordinator<P: Platform> {
    platform: P,
    inner: Mutex<Inner<P>>,
    phase: PhaseCell,
    presence: P::Gpio,
    base_presence: P::Gpio,
    config: ShpsConfig,
    stats: CoordinatorStats,
}

impl<P: Platform> Coordinator<P> {
    /// Take ownership of the handles
    ///
    /// Fails with [`Error::Config`] if `config` does not validate.
    pub fn new(platform: P, handles: DeviceHandles<P>, config: ShpsConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            platform,
            inner: Mutex::new(Inner {
                bridge: handles.bridge,
                dsm: handles.dsm,
                power: handles.power,
                book: PowerBook::new(),
            }),
            phase: PhaseCell::new(),
            presence: handles.presence,
            base_presence: handles.base_presence,
            config,
            stats: CoordinatorStats::new(),
        })
    }

    // -------------------------------------------------------------------------
    // Power paths
    // -------------------------------------------------------------------------

    /// Query power through one path
    pub fn get_power(&self, path: PowerPath) -> Result<DevicePower> {
        let inner = self.inner.lock();
        match path {
            PowerPath::Firmware => FirmwarePower::new(&inner.dsm, &inner.power).get(),
            PowerPath::Bus => Ok(bus_power_of(&inner.bridge)),
        }
    }

    /// Drive one path to `target`
    pub fn set_power(&self, path: PowerPath, target: DevicePower) -> Result<()> {
        let mut inner = self.inner.lock();
        self.set_power_locked(&mut inner, path, target)
    }

    fn set_power_locked(
        &self,
        inner: &mut Inner<P>,
        path: PowerPath,
        target: DevicePower,
    ) -> Result<()> {
        match path {
            PowerPath::Firmware => {
                if FirmwarePower::new(&inner.dsm, &inner.power).set(target)? {
                    self.stats.record_firmware_set();
                }
            },
            PowerPath::Bus => {
                let outcome = BusPower::new(
                    &mut inner.bridge,
                    FirmwarePower::new(&inner.dsm, &inner.power),
                    LinkQuiescence::from_config(&self.platform, &self.config),
                    &mut inner.book,
                    &self.phase,
                )
                .set(target)?;

                match outcome {
                    BusOutcome::Unchanged => {},
                    BusOutcome::PoweredOn => self.stats.record_power_on(),
                    BusOutcome::PoweredOff { link_removed } => {
                        self.stats.record_power_off(link_removed)
                    },
                }
            },
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // System transitions
    // -------------------------------------------------------------------------

    /// Force the bus path off before system suspend
    pub fn prepare_for_system_suspend(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        self.dump_locked(&inner, "suspend-prepare");

        self.set_power_locked(&mut inner, PowerPath::Bus, DevicePower::Off)
            .map_err(|e| {
                log::warn!("failed to power off dGPU: {}", e);
                e
            })
    }

    /// Diagnostic hook after system resume
    pub fn on_system_resume_complete(&self) {
        self.dump("resume-complete");
    }

    /// Force the bus path on so the bus layer can shut the device down
    pub fn on_system_shutdown(&self) {
        if let Err(e) = self.set_power(PowerPath::Bus, DevicePower::On) {
            log::warn!("failed to turn on dGPU: {}", e);
        }
    }

    // -------------------------------------------------------------------------
    // Asynchronous events
    // -------------------------------------------------------------------------

    /// Reconcile after the root port left D3cold
    ///
    /// Called for every firmware power-on notification. When the power-on
    /// was started by [`Coordinator::set_power`] this returns immediately
    /// without touching the lock, which that caller still holds.
    pub fn on_unexpected_power_on(&self) {
        if self.phase.probe().is_powering_on() {
            self.stats.record_self_notification();
            return;
        }

        let intent = {
            let mut inner = self.inner.lock();
            self.dump_locked(&inner, "powered-on");

            inner.bridge.restore_state();
            if !inner.bridge.is_enabled() {
                if let Err(e) = inner.bridge.enable_device() {
                    log::warn!("failed to enable dGPU root port: {}", e);
                }
            }
            inner.bridge.set_master();

            inner.book.intent()
        };

        if !intent {
            self.stats.record_unexpected_power_on();
            log::warn!("unexpected dGPU power-on detected");
        }
    }

    /// The dGPU was plugged in; power is left to the user
    pub fn on_dgpu_attached(&self) -> Result<()> {
        self.dump("attached");
        Ok(())
    }

    /// The dGPU was pulled; park the root port
    pub fn on_dgpu_detached(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        self.dump_locked(&inner, "detached");
        self.set_power_locked(&mut inner, PowerPath::Bus, DevicePower::Off)
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Presence line, for interrupt registration
    pub fn presence_line(&self) -> &P::Gpio {
        &self.presence
    }

    /// Physical presence of the dGPU
    pub fn is_present(&self) -> Result<bool> {
        self.presence.get_value().map_err(Error::from)
    }

    /// Physical presence of the keyboard base
    pub fn is_base_present(&self) -> Result<bool> {
        self.base_presence.get_value().map_err(Error::from)
    }

    /// Whether the last completed bus transition powered the dGPU on
    pub fn intent(&self) -> bool {
        self.inner.lock().book.intent()
    }

    /// Transition currently in flight
    pub fn phase(&self) -> Phase {
        self.probe().phase()
    }

    /// Lock-free phase accessor
    pub fn probe(&self) -> SelfTransitionProbe<'_> {
        self.phase.probe()
    }

    /// Address of the managed root port
    pub fn root_port(&self) -> PciAddr {
        self.inner.lock().bridge.address()
    }

    /// Platform the handles were acquired from
    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Active configuration
    pub fn config(&self) -> &ShpsConfig {
        &self.config
    }

    /// Counter snapshot
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub(crate) fn counters(&self) -> &CoordinatorStats {
        &self.stats
    }

    // -------------------------------------------------------------------------
    // Diagnostics
    // -------------------------------------------------------------------------

    fn dump(&self, prefix: &str) {
        let inner = self.inner.lock();
        self.dump_locked(&inner, prefix);
    }

    fn dump_locked(&self, inner: &Inner<P>, prefix: &str) {
        let rp = bus_power_of(&inner.bridge);
        match FirmwarePower::new(&inner.dsm, &inner.power).get() {
            Ok(dsm) => log::debug!("{}: dGPU power state: rp={}, dsm={}", prefix, rp, dsm),
            Err(e) => {
                log::error!("{}: failed to get direct power state: {}", prefix, e);
                log::debug!("{}: dGPU power state: rp={}, dsm=?", prefix, rp);
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::sync::Arc;

    use log::Level;
    use shps_hal::mock::{DsmReply, LinkRemoval, MockBoard, MockPlatform, ROOT_PORT_ADDR};
    use shps_hal::{GpioName, PciPowerState, RequestChannel, Rqsg};

    use super::*;
    use crate::events::FirmwareEventDispatcher;
    use crate::config::ConfigError;
    use crate::testutil::{self as testlog, coordinator, coordinator_with};

    assert_impl_all!(Coordinator<MockPlatform>: Send, Sync);

    #[test]
    fn test_set_then_get_both_paths() {
        for path in [PowerPath::Bus, PowerPath::Firmware] {
            for start_on in [true, false] {
                let board = if start_on {
                    MockBoard::new()
                } else {
                    MockBoard::powered_off()
                };
                let c = coordinator(&board);

                c.set_power(path, DevicePower::Off).expect("off");
                assert_eq!(c.get_power(path), Ok(DevicePower::Off), "{:?}", path);

                c.set_power(path, DevicePower::On).expect("on");
                assert_eq!(c.get_power(path), Ok(DevicePower::On), "{:?}", path);
            }
        }
    }

    #[test]
    fn test_intent_follows_bus_transitions() {
        let board = MockBoard::powered_off();
        let c = coordinator(&board);
        assert!(!c.intent());

        c.set_power(PowerPath::Bus, DevicePower::On).expect("on");
        assert!(c.intent());

        c.set_power(PowerPath::Bus, DevicePower::Off).expect("off");
        assert!(!c.intent());

        // Firmware path does not touch intent
        c.set_power(PowerPath::Firmware, DevicePower::On).expect("dsm on");
        assert!(!c.intent());
    }

    #[test]
    fn test_noop_is_idempotent() {
        let board = MockBoard::new();
        let c = coordinator(&board);
        c.set_power(PowerPath::Bus, DevicePower::On).expect("on");
        c.set_power(PowerPath::Firmware, DevicePower::On).expect("dsm on");
        assert_eq!(board.counters().mutations, 0);

        let board = MockBoard::powered_off();
        let c = coordinator(&board);
        c.set_power(PowerPath::Bus, DevicePower::Off).expect("off");
        c.set_power(PowerPath::Firmware, DevicePower::Off).expect("dsm off");
        assert_eq!(board.counters().mutations, 0);
    }

    #[test]
    fn test_invalid_target_rejected() {
        let board = MockBoard::new();
        let c = coordinator(&board);

        for path in [PowerPath::Bus, PowerPath::Firmware] {
            assert_eq!(c.set_power(path, DevicePower::Unknown), Err(Error::InvalidArgument));
        }
        assert_eq!(board.counters().mutations, 0);
        assert_eq!(c.get_power(PowerPath::Bus), Ok(DevicePower::On));
    }

    #[test]
    fn test_unknown_bus_state_reported() {
        let board = MockBoard::new();
        board.set_bridge_state(PciPowerState::Error);
        let c = coordinator(&board);
        assert_eq!(c.get_power(PowerPath::Bus), Ok(DevicePower::Unknown));
    }

    #[test]
    fn test_self_initiated_power_on_skips_reconcile() {
        testlog::capture();
        let board = MockBoard::powered_off();
        let c = coordinator(&board);
        let _registration = FirmwareEventDispatcher::register(c.clone(), board.clone());

        c.set_power(PowerPath::Bus, DevicePower::On).expect("on");

        let counters = board.counters();
        assert_eq!(counters.rqsg_delivered, 1);
        assert_eq!(counters.restores, 1);

        let stats = c.stats();
        assert_eq!(stats.self_notifications, 1);
        assert_eq!(stats.unexpected_power_ons, 0);
        assert_eq!(testlog::count_level(Level::Warn), 0);
        assert_eq!(c.phase(), Phase::Idle);
    }

    #[test]
    fn test_external_power_on_warns_once() {
        testlog::capture();
        let board = MockBoard::powered_off();
        let c = coordinator(&board);
        let _registration = FirmwareEventDispatcher::register(c.clone(), board.clone());

        board.simulate_external_power_on();

        assert_eq!(testlog::count(Level::Warn, "unexpected dGPU power-on detected"), 1);
        assert_eq!(c.stats().unexpected_power_ons, 1);

        let counters = board.counters();
        assert_eq!(counters.restores, 1);
        assert_eq!(counters.enables, 1);
        assert_eq!(counters.master_sets, 1);
        assert!(board.is_enabled());
        assert!(board.is_master());

        // No corrective power-off
        assert_eq!(board.bridge_state(), PciPowerState::D0);
        assert!(!c.intent());
    }

    #[test]
    fn test_expected_power_on_reconciles_silently() {
        testlog::capture();
        let board = MockBoard::powered_off();
        let c = coordinator(&board);
        c.set_power(PowerPath::Bus, DevicePower::On).expect("on");

        // Bus layer suspends and resumes the port behind our back
        board.set_bridge_state(PciPowerState::D3Cold);
        let _registration = FirmwareEventDispatcher::register(c.clone(), board.clone());
        board.reset_counters();
        board.simulate_external_power_on();

        assert_eq!(board.counters().restores, 1);
        assert_eq!(board.counters().enables, 0);
        assert_eq!(testlog::count(Level::Warn, "unexpected dGPU power-on"), 0);
    }

    #[test]
    fn test_detach_powers_off_attach_does_not_power_on() {
        let board = MockBoard::new();
        let c = coordinator(&board);

        c.on_dgpu_attached().expect("attach");
        assert_eq!(board.counters().mutations, 0);

        c.on_dgpu_detached().expect("detach");
        assert_eq!(board.bridge_state(), PciPowerState::D3Cold);

        board.reset_counters();
        c.on_dgpu_attached().expect("attach");
        assert_eq!(board.counters().mutations, 0);
        assert_eq!(board.bridge_state(), PciPowerState::D3Cold);
    }

    #[test]
    fn test_quiescence_timeout_still_parks() {
        testlog::capture();
        let board = MockBoard::new();
        board.set_link_removal(LinkRemoval::Never);
        let c = coordinator(&board);

        c.set_power(PowerPath::Bus, DevicePower::Off).expect("off");

        assert_eq!(board.bridge_state(), PciPowerState::D3Cold);
        assert_eq!(board.counters().slept_ms, 1000);
        assert_eq!(c.stats().quiescence_timeouts, 1);
        assert_eq!(testlog::count(Level::Warn, "dGPU removal via firmware timed out"), 1);
        assert_eq!(testlog::count_level(Level::Warn), 1);
    }

    #[test]
    fn test_new_rejects_unbounded_quiescence() {
        let board = MockBoard::new();
        let platform = board.platform();
        let handles = testlog::handles(&platform);

        let result = Coordinator::new(platform, handles, ShpsConfig::with_polling(10, u32::MAX / 2 + 1));
        assert!(matches!(result, Err(Error::Config(ConfigError::QuiescenceTooLong))));
        assert_eq!(board.bridge_refs(), 0);
    }

    #[test]
    fn test_configured_quiescence_budget() {
        let board = MockBoard::new();
        board.set_link_removal(LinkRemoval::Never);
        let c = coordinator_with(&board, ShpsConfig::with_polling(5, 10));

        c.set_power(PowerPath::Bus, DevicePower::Off).expect("off");
        assert_eq!(board.counters().sleeps, 5);
        assert_eq!(board.counters().slept_ms, 50);
    }

    #[test]
    fn test_suspend_prepare_propagates_failure() {
        testlog::capture();
        let board = MockBoard::new();
        board.set_dsm_power_reply(DsmReply::Status(1));
        let c = coordinator(&board);

        assert_eq!(c.prepare_for_system_suspend(), Err(Error::Io));
        assert_eq!(testlog::count(Level::Warn, "failed to power off dGPU"), 1);
        assert_eq!(board.bridge_state(), PciPowerState::D0);
    }

    #[test]
    fn test_suspend_prepare_powers_off() {
        let board = MockBoard::new();
        let c = coordinator(&board);
        c.prepare_for_system_suspend().expect("prepare");
        assert_eq!(c.get_power(PowerPath::Bus), Ok(DevicePower::Off));

        c.on_system_resume_complete();
        assert_eq!(c.get_power(PowerPath::Bus), Ok(DevicePower::Off));
    }

    #[test]
    fn test_shutdown_powers_on_and_logs_failure() {
        testlog::capture();
        let board = MockBoard::powered_off();
        let c = coordinator(&board);
        c.on_system_shutdown();
        assert_eq!(board.bridge_state(), PciPowerState::D0);

        let board = MockBoard::powered_off();
        board.fail_transition(Some(PciPowerState::D0));
        let c = coordinator(&board);
        c.on_system_shutdown();
        assert_eq!(testlog::count(Level::Warn, "failed to turn on dGPU"), 1);
        assert!(!c.intent());
    }

    #[test]
    fn test_presence_queries() {
        let board = MockBoard::new();
        let c = coordinator(&board);
        assert_eq!(c.is_present(), Ok(true));
        assert_eq!(c.is_base_present(), Ok(true));

        board.set_presence(false);
        assert_eq!(c.is_present(), Ok(false));

        board.fail_gpio_read(GpioName::DgpuPresence, true);
        assert_eq!(c.is_present(), Err(Error::Io));
    }

    #[test]
    fn test_other_requests_do_not_reconcile() {
        let board = MockBoard::powered_off();
        let c = coordinator(&board);
        let channel: Arc<dyn RequestChannel> = board.clone();
        let _registration = FirmwareEventDispatcher::register(c.clone(), channel);

        assert_eq!(board.send_rqsg(Rqsg::new(0x13, 0x03, 0x00)), Some(Ok(())));
        assert_eq!(board.counters().restores, 0);
        assert_eq!(c.root_port(), ROOT_PORT_ADDR);
    }
}
