//! Shared unit-test fixtures.
//!
//! Log records are captured per thread, so tests running in parallel only
//! see their own output.

use std::cell::RefCell;
use std::string::{String, ToString};
use std::sync::Once;
use std::vec::Vec;

use alloc::sync::Arc;

use log::{Level, LevelFilter, Log, Metadata, Record};
use shps_hal::mock::{MockBoard, MockPlatform, ROOT_PORT_ADDR};
use shps_hal::{GpioName, Platform};

use crate::config::ShpsConfig;
use crate::coordinator::{Coordinator, DeviceHandles};

/// Coordinator owning every handle of `board`
pub fn coordinator(board: &Arc<MockBoard>) -> Arc<Coordinator<MockPlatform>> {
    coordinator_with(board, ShpsConfig::default())
}

/// Handles for every resource of `board`
pub fn handles(platform: &MockPlatform) -> DeviceHandles<MockPlatform> {
    DeviceHandles {
        bridge: platform.pci_device(ROOT_PORT_ADDR).expect("bridge"),
        dsm: platform.dsm().expect("dsm"),
        power: platform.gpio(GpioName::DgpuPower).expect("power"),
        presence: platform.gpio(GpioName::DgpuPresence).expect("presence"),
        base_presence: platform.gpio(GpioName::BasePresence).expect("base"),
    }
}

/// Coordinator with a custom configuration
pub fn coordinator_with(board: &Arc<MockBoard>, config: ShpsConfig) -> Arc<Coordinator<MockPlatform>> {
    let platform = board.platform();
    let handles = handles(&platform);
    Arc::new(Coordinator::new(platform, handles, config).expect("coordinator"))
}

thread_local! {
    static RECORDS: RefCell<Vec<(Level, String)>> = RefCell::new(Vec::new());
}

struct Capture;

impl Log for Capture {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &Record<'_>) {
        let line = record.args().to_string();
        RECORDS.with(|r| r.borrow_mut().push((record.level(), line)));
    }

    fn flush(&self) {}
}

static LOGGER: Capture = Capture;
static INIT: Once = Once::new();

/// Install the logger once and clear this thread's records
pub fn capture() {
    INIT.call_once(|| {
        let _ = log::set_logger(&LOGGER);
        log::set_max_level(LevelFilter::Trace);
    });
    RECORDS.with(|r| r.borrow_mut().clear());
}

/// Number of records at `level` containing `needle`
pub fn count(level: Level, needle: &str) -> usize {
    RECORDS.with(|r| {
        r.borrow()
            .iter()
            .filter(|(l, msg)| *l == level && msg.contains(needle))
            .count()
    })
}

/// Number of records at `level`
pub fn count_level(level: Level) -> usize {
    RECORDS.with(|r| r.borrow().iter().filter(|(l, _)| *l == level).count())
}
