//! # Presence Monitor
//!
//! Threaded handler for edges on the `dgpu_presence` line. Each edge is
//! resolved against the current line value, so bounces and coalesced edges
//! settle on the last observed state.

use alloc::sync::Arc;
use core::sync::atomic::{AtomicU8, Ordering};

use shps_hal::{EdgeHandler, IrqFlags, Platform};

use crate::coordinator::Coordinator;

/// Interrupt label
pub const PRESENCE_IRQ_NAME: &str = "shps_dgpu_presence_irq";

/// Interrupt flags for the presence line
pub const PRESENCE_IRQ_FLAGS: IrqFlags = IrqFlags::SHARED
    .union(IrqFlags::ONESHOT)
    .union(IrqFlags::TRIGGER_BOTH);

/// Physical attachment of the dGPU
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Connected to the base
    Attached,
    /// Pulled from the base
    Detached,
}

impl Presence {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Attached => "attached",
            Self::Detached => "detached",
        }
    }
}

const PRESENCE_NONE: u8 = 0;
const PRESENCE_ATTACHED: u8 = 1;
const PRESENCE_DETACHED: u8 = 2;

/// Presence edge handler
pub struct PresenceMonitor<P: Platform> {
    coordinator: Arc<Coordinator<P>>,
    last: AtomicU8,
}

impl<P: Platform> PresenceMonitor<P> {
    /// Create a monitor with no observed state
    pub fn new(coordinator: Arc<Coordinator<P>>) -> Self {
        Self {
            coordinator,
            last: AtomicU8::new(PRESENCE_NONE),
        }
    }

    /// Last state observed on an edge
    pub fn last(&self) -> Option<Presence> {
        match self.last.load(Ordering::Acquire) {
            PRESENCE_ATTACHED => Some(Presence::Attached),
            PRESENCE_DETACHED => Some(Presence::Detached),
            _ => None,
        }
    }
}

impl<P: Platform> EdgeHandler for PresenceMonitor<P> {
    fn on_edge(&self) {
        self.coordinator.counters().record_presence_edge();

        let presence = match self.coordinator.is_present() {
            Ok(true) => Presence::Attached,
            Ok(false) => Presence::Detached,
            Err(e) => {
                log::warn!("failed to check physical dGPU presence: {}", e);
                return;
            },
        };

        log::info!("dGPU physically {}", presence.as_str());

        let (raw, status) = match presence {
            Presence::Attached => (PRESENCE_ATTACHED, self.coordinator.on_dgpu_attached()),
            Presence::Detached => (PRESENCE_DETACHED, self.coordinator.on_dgpu_detached()),
        };
        self.last.store(raw, Ordering::Release);

        if let Err(e) = status {
            log::warn!("error handling dGPU interrupt: {}", e);
        }
    }
}
