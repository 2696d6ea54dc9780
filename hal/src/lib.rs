//! # SHPS Hardware Abstraction Layer
//!
//! Trait seams for every platform service the dGPU power coordinator talks
//! to. The coordinator never touches hardware directly; a platform
//! implementation (kernel glue, a simulator, or the [`mock`] board) provides
//! these traits.
//!
//! ## Components
//!
//! - **PCI**: root-port D-state control, configuration save/restore, link and
//!   slot status registers
//! - **GPIO**: boolean power-rail and presence lines
//! - **ACPI**: `_DSM` evaluation and the firmware object model
//! - **SAN**: request-segment (RQSG) notifications from the embedded
//!   controller
//! - **IRQ**: threaded edge interrupts on GPIO lines
//! - **Platform**: resource acquisition and delays
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                        shps-hal                          │
//! │  ┌────────┐ ┌────────┐ ┌────────┐ ┌────────┐ ┌────────┐  │
//! │  │  PCI   │ │  GPIO  │ │  ACPI  │ │  SAN   │ │  IRQ   │  │
//! │  └────────┘ └────────┘ └────────┘ └────────┘ └────────┘  │
//! │                    Platform / Delay                      │
//! └──────────────────────────────────────────────────────────┘
//! ```

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![allow(clippy::new_without_default)]

extern crate alloc;

pub mod acpi;
pub mod error;
pub mod gpio;
pub mod irq;
pub mod pci;
pub mod platform;
pub mod san;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use acpi::{AcpiObject, AcpiObjectType, DsmMethod, Guid};
pub use error::{HalError, HalResult};
pub use gpio::{GpioLine, GpioName};
pub use irq::{EdgeHandler, IrqFlags};
pub use pci::{BridgePort, LinkStatus, PciAddr, PciPowerState, SlotStatus};
pub use platform::{Delay, Platform};
pub use san::{RequestChannel, Rqsg, RqsgHandler};
