//! # Firmware Event Dispatch
//!
//! Routes request segments from the embedded controller to the coordinator.
//! The request channel has a single handler slot; a [`DispatcherRegistration`]
//! occupies it for as long as it lives.

use alloc::sync::Arc;

use shps_hal::{HalResult, Platform, RequestChannel, Rqsg, RqsgHandler};

use crate::coordinator::Coordinator;

/// Target category of dGPU requests
pub const SAM_DGPU_TC: u8 = 0x13;

/// Command id signalling that the dGPU rail came up
pub const SAM_DGPU_CID_POWERON: u8 = 0x02;

/// Request segment handler for the dGPU
pub struct FirmwareEventDispatcher<P: Platform> {
    coordinator: Arc<Coordinator<P>>,
}

impl<P: Platform> FirmwareEventDispatcher<P> {
    /// Create a dispatcher for `coordinator`
    pub fn new(coordinator: Arc<Coordinator<P>>) -> Self {
        Self { coordinator }
    }

    /// Create a dispatcher and install it on `channel`
    pub fn register<C>(coordinator: Arc<Coordinator<P>>, channel: Arc<C>) -> DispatcherRegistration<C>
    where
        C: RequestChannel + ?Sized,
    {
        DispatcherRegistration::new(channel, Arc::new(Self::new(coordinator)))
    }
}

impl<P: Platform> RqsgHandler for FirmwareEventDispatcher<P> {
    fn handle(&self, rqsg: &Rqsg) -> HalResult<()> {
        if rqsg.matches(SAM_DGPU_TC, SAM_DGPU_CID_POWERON) {
            self.coordinator.on_unexpected_power_on();
            return Ok(());
        }

        self.coordinator.counters().record_unhandled_request();
        log::warn!(
            "unimplemented dGPU request: RQSG(0x{:02x}, 0x{:02x}, 0x{:02x})",
            rqsg.tc,
            rqsg.cid,
            rqsg.iid
        );
        Ok(())
    }
}

/// Occupies the request channel's handler slot; clears it on drop
pub struct DispatcherRegistration<C: RequestChannel + ?Sized> {
    channel: Arc<C>,
}

impl<C: RequestChannel + ?Sized> DispatcherRegistration<C> {
    /// Install `handler`, replacing whatever was registered
    pub fn new(channel: Arc<C>, handler: Arc<dyn RqsgHandler>) -> Self {
        channel.set_rqsg_handler(Some(handler));
        Self { channel }
    }
}

impl<C: RequestChannel + ?Sized> Drop for DispatcherRegistration<C> {
    fn drop(&mut self) {
        self.channel.set_rqsg_handler(None);
    }
}

#[cfg(test)]
mod tests {
    use log::Level;
    use shps_hal::mock::{MockBoard, POWER_ON_RQSG};

    use super::*;
    use crate::testutil::{self as testlog, coordinator};

    #[test]
    fn test_signature() {
        assert!(POWER_ON_RQSG.matches(SAM_DGPU_TC, SAM_DGPU_CID_POWERON));
    }

    #[test]
    fn test_registration_cleared_on_drop() {
        let board = MockBoard::new();
        let c = coordinator(&board);

        let registration = FirmwareEventDispatcher::register(c, board.clone());
        assert!(board.has_rqsg_handler());

        drop(registration);
        assert!(!board.has_rqsg_handler());
        assert_eq!(board.send_rqsg(POWER_ON_RQSG), None);
    }

    #[test]
    fn test_unknown_request_logged() {
        testlog::capture();
        let board = MockBoard::new();
        let c = coordinator(&board);
        let _registration = FirmwareEventDispatcher::register(c.clone(), board.clone());

        assert_eq!(board.send_rqsg(Rqsg::new(0x13, 0x05, 0x01)), Some(Ok(())));
        assert_eq!(
            testlog::count(Level::Warn, "unimplemented dGPU request: RQSG(0x13, 0x05, 0x01)"),
            1
        );
        assert_eq!(c.stats().unhandled_requests, 1);
        assert_eq!(board.counters().mutations, 0);
    }

    #[test]
    fn test_power_on_routed_to_coordinator() {
        let board = MockBoard::powered_off();
        let c = coordinator(&board);
        let _registration = FirmwareEventDispatcher::register(c.clone(), board.clone());

        assert_eq!(board.send_rqsg(Rqsg::new(0x13, 0x02, 0x07)), Some(Ok(())));
        assert_eq!(c.stats().unexpected_power_ons, 1);
        assert_eq!(board.counters().restores, 1);
    }
}
