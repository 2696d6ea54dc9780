//! # Coordinator Statistics
//!
//! Lock-free event counters for diagnostics.

use core::sync::atomic::{AtomicU64, Ordering};

/// Live counters, updated from every calling context
#[derive(Default)]
pub struct CoordinatorStats {
    power_ons: AtomicU64,
    power_offs: AtomicU64,
    firmware_sets: AtomicU64,
    self_notifications: AtomicU64,
    unexpected_power_ons: AtomicU64,
    quiescence_timeouts: AtomicU64,
    presence_edges: AtomicU64,
    unhandled_requests: AtomicU64,
}

impl CoordinatorStats {
    /// Zeroed counters
    pub const fn new() -> Self {
        Self {
            power_ons: AtomicU64::new(0),
            power_offs: AtomicU64::new(0),
            firmware_sets: AtomicU64::new(0),
            self_notifications: AtomicU64::new(0),
            unexpected_power_ons: AtomicU64::new(0),
            quiescence_timeouts: AtomicU64::new(0),
            presence_edges: AtomicU64::new(0),
            unhandled_requests: AtomicU64::new(0),
        }
    }

    pub(crate) fn record_power_on(&self) {
        self.power_ons.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_power_off(&self, link_removed: bool) {
        self.power_offs.fetch_add(1, Ordering::Relaxed);
        if !link_removed {
            self.quiescence_timeouts.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_firmware_set(&self) {
        self.firmware_sets.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_self_notification(&self) {
        self.self_notifications.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_unexpected_power_on(&self) {
        self.unexpected_power_ons.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_presence_edge(&self) {
        self.presence_edges.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_unhandled_request(&self) {
        self.unhandled_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of all counters
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            power_ons: self.power_ons.load(Ordering::Relaxed),
            power_offs: self.power_offs.load(Ordering::Relaxed),
            firmware_sets: self.firmware_sets.load(Ordering::Relaxed),
            self_notifications: self.self_notifications.load(Ordering::Relaxed),
            unexpected_power_ons: self.unexpected_power_ons.load(Ordering::Relaxed),
            quiescence_timeouts: self.quiescence_timeouts.load(Ordering::Relaxed),
            presence_edges: self.presence_edges.load(Ordering::Relaxed),
            unhandled_requests: self.unhandled_requests.load(Ordering::Relaxed),
        }
    }
}

/// Coordinator statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Completed bus power-on transitions
    pub power_ons: u64,
    /// Completed bus power-off transitions
    pub power_offs: u64,
    /// Firmware direct-power requests that reached the rail
    pub firmware_sets: u64,
    /// Power-on notifications recognised as self-initiated
    pub self_notifications: u64,
    /// Power-on notifications with no matching intent
    pub unexpected_power_ons: u64,
    /// Power-offs where the link outlived the wait
    pub quiescence_timeouts: u64,
    /// Presence edges handled
    pub presence_edges: u64,
    /// Firmware requests with no handler
    pub unhandled_requests: u64,
}
