//! # Power Transition State
//!
//! Intent and self-transition tracking for the coordinator.
//!
//! The intent lives in [`PowerBook`], which is only reachable under the
//! coordinator lock. The transition phase lives in a lock-free [`PhaseCell`]
//! beside the lock so that a firmware notification fired synchronously from
//! inside a bridge transition can see it without taking the lock again.
//!
//! ```text
//!            begin(PoweringOn)              complete()
//!   Idle ───────────────────────▶ PoweringOn ──────────▶ Idle, intent = on
//!     │                               │
//!     │                               └── drop (error) ─▶ Idle, intent kept
//!     │      begin(PoweringOff)             complete()
//!     └────────────────────────▶ PoweringOff ─────────▶ Idle, intent = off
//! ```
//!
//! The cell can only be written through a [`Transition`], and a transition
//! can only be obtained from `&mut PowerBook`, so at most one exists at a
//! time and only lock holders can create it.

use core::sync::atomic::{AtomicU8, Ordering};

// =============================================================================
// PHASE
// =============================================================================

/// Driver-initiated transition currently in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Phase {
    /// No transition in flight
    Idle        = 0,
    /// Bus power-on in progress
    PoweringOn  = 1,
    /// Bus power-off in progress
    PoweringOff = 2,
}

impl Phase {
    const fn from_raw(raw: u8) -> Self {
        match raw {
            1 => Self::PoweringOn,
            2 => Self::PoweringOff,
            _ => Self::Idle,
        }
    }

    /// Target intent once this transition completes
    const fn target(self) -> Option<bool> {
        match self {
            Self::Idle => None,
            Self::PoweringOn => Some(true),
            Self::PoweringOff => Some(false),
        }
    }
}

/// Lock-free phase storage
pub struct PhaseCell(AtomicU8);

impl PhaseCell {
    /// Create an idle cell
    pub const fn new() -> Self {
        Self(AtomicU8::new(Phase::Idle as u8))
    }

    fn load(&self) -> Phase {
        Phase::from_raw(self.0.load(Ordering::Acquire))
    }

    fn store(&self, phase: Phase) {
        self.0.store(phase as u8, Ordering::Release);
    }

    /// Read-only view for contexts that must not take the lock
    pub fn probe(&self) -> SelfTransitionProbe<'_> {
        SelfTransitionProbe(self)
    }
}

/// Lock-free read access to the phase
#[derive(Clone, Copy)]
pub struct SelfTransitionProbe<'a>(&'a PhaseCell);

impl SelfTransitionProbe<'_> {
    /// Current phase
    pub fn phase(&self) -> Phase {
        self.0.load()
    }

    /// Whether a driver-initiated power-on is in flight
    pub fn is_powering_on(&self) -> bool {
        self.phase() == Phase::PoweringOn
    }
}

// =============================================================================
// INTENT
// =============================================================================

/// Lock-protected power intent
#[derive(Debug)]
pub struct PowerBook {
    intent: bool,
}

impl PowerBook {
    /// No power-on has completed yet
    pub const fn new() -> Self {
        Self { intent: false }
    }

    /// Whether the last completed transition powered the device on
    pub fn intent(&self) -> bool {
        self.intent
    }

    /// Start a transition, publishing its phase to `cell`
    ///
    /// `phase` must not be [`Phase::Idle`]; an idle transition is a no-op
    /// whose completion leaves the intent untouched.
    pub fn begin<'a>(&'a mut self, cell: &'a PhaseCell, phase: Phase) -> Transition<'a> {
        cell.store(phase);
        Transition {
            book: self,
            cell,
            phase,
        }
    }
}

/// In-flight transition; resets the phase to idle when dropped
pub struct Transition<'a> {
    book: &'a mut PowerBook,
    cell: &'a PhaseCell,
    phase: Phase,
}

impl Transition<'_> {
    /// Phase published by this transition
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Mark the transition successful and record the new intent
    pub fn complete(self) {
        if let Some(target) = self.phase.target() {
            self.book.intent = target;
        }
    }
}

impl Drop for Transition<'_> {
    fn drop(&mut self) {
        self.cell.store(Phase::Idle);
    }
}
