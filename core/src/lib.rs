//! # SHPS Core
//!
//! Power-state coordination for a detachable discrete GPU.
//!
//! The dGPU can be powered through two independent paths: the hot-plug
//! device's firmware method, which switches the rail directly, and the D-state
//! of the dGPU's PCIe root port. This crate keeps the two views consistent
//! against user requests, presence interrupts, firmware notifications that
//! race with the driver's own transitions, and system suspend and shutdown.
//!
//! ## Components
//!
//! - **Firmware Power**: direct power via `_DSM`, read back from a GPIO line
//! - **Bus Power**: root-port D0 / D3cold sequences
//! - **Link Quiescence**: bounded wait for link removal before D3cold
//! - **Coordinator**: the lock, the intent and the self-transition phase
//! - **Presence Monitor**: attach/detach edges
//! - **Event Dispatcher**: firmware power-on notifications
//! - **Discovery**: root-port address from the firmware table
//! - **Attributes**: `dgpu_power` and `dgpu_power_dsm`
//! - **Driver**: probe, remove and system power hooks
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                         ShpsDriver                         │
//! │  ┌──────────────┐  ┌────────────────┐  ┌────────────────┐  │
//! │  │ Attributes   │  │ PresenceMonitor│  │ EventDispatcher│  │
//! │  └──────┬───────┘  └───────┬────────┘  └───────┬────────┘  │
//! │         └──────────────────┼───────────────────┘           │
//! │                      ┌─────▼──────┐                        │
//! │                      │ Coordinator│                        │
//! │                      └─────┬──────┘                        │
//! │          ┌─────────────────┼──────────────────┐            │
//! │   ┌──────▼──────┐   ┌──────▼──────┐   ┌───────▼───────┐    │
//! │   │FirmwarePower│   │  BusPower   │   │LinkQuiescence │    │
//! │   └─────────────┘   └─────────────┘   └───────────────┘    │
//! └────────────────────────────────────────────────────────────┘
//!                             shps-hal
//! ```

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]

extern crate alloc;

pub mod attrs;
pub mod bridge;
pub mod config;
pub mod coordinator;
pub mod discovery;
pub mod driver;
pub mod dsm;
pub mod error;
pub mod events;
pub mod link;
pub mod power;
pub mod presence;
pub mod state;
pub mod stats;

#[cfg(test)]
mod testutil;

pub use attrs::{parse_bool, PowerAttribute};
pub use config::{ConfigError, ShpsConfig};
pub use coordinator::{Coordinator, DeviceHandles};
pub use driver::ShpsDriver;
pub use error::{Error, Result};
pub use events::{DispatcherRegistration, FirmwareEventDispatcher};
pub use power::{DevicePower, PowerPath};
pub use presence::{Presence, PresenceMonitor};
pub use state::Phase;
pub use stats::StatsSnapshot;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
