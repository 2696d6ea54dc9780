//! # Interrupt Handling
//!
//! Threaded edge interrupts on GPIO lines.

// Interrupt request flags
bitflags::bitflags! {
    /// Flags passed when requesting a threaded interrupt
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct IrqFlags: u32 {
        /// Trigger on rising edge
        const TRIGGER_RISING = 1 << 0;
        /// Trigger on falling edge
        const TRIGGER_FALLING = 1 << 1;
        /// Line may be shared with other handlers
        const SHARED = 1 << 7;
        /// Keep the line masked until the threaded handler returns
        const ONESHOT = 1 << 13;
        /// Both edges
        const TRIGGER_BOTH = Self::TRIGGER_RISING.bits() | Self::TRIGGER_FALLING.bits();
    }
}

/// Threaded edge handler
///
/// Runs in a sleep-permitted context, never in hard interrupt context.
/// Handlers have no caller to report errors to.
pub trait EdgeHandler: Send + Sync {
    /// Called once per delivered edge
    fn on_edge(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_both_edges() {
        assert!(IrqFlags::TRIGGER_BOTH.contains(IrqFlags::TRIGGER_RISING));
        assert!(IrqFlags::TRIGGER_BOTH.contains(IrqFlags::TRIGGER_FALLING));
        assert!(!IrqFlags::TRIGGER_BOTH.contains(IrqFlags::ONESHOT));
    }
}
