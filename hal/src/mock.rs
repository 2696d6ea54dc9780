//! # Mock Board
//!
//! Deterministic in-memory model of the hot-plug hardware: one root port,
//! the three GPIO lines, the `_DSM` method, the SAN request channel and the
//! presence interrupt. Every hardware write is counted so callers can assert
//! on side effects, and delays advance a fake clock instead of sleeping.
//!
//! Firmware behaviour modelled here:
//! - cutting direct power makes the downstream link drop, immediately, after
//!   a number of status polls, or never
//! - leaving D3 on the root port powers the rail and delivers the dGPU
//!   power-on request segment synchronously, before the transition returns

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;

use spin::Mutex;
use static_assertions::assert_impl_all;

use crate::acpi::{AcpiObject, DsmMethod, Guid};
use crate::error::{HalError, HalResult};
use crate::gpio::{mapping, GpioLine, GpioName};
use crate::irq::{EdgeHandler, IrqFlags};
use crate::pci::{BridgePort, LinkStatus, PciAddr, PciPowerState, SlotStatus};
use crate::platform::{Delay, Platform};
use crate::san::{RequestChannel, Rqsg, RqsgHandler};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Root port the dGPU hangs off
pub const ROOT_PORT_ADDR: PciAddr = PciAddr::from_bdf(0x00, 0x1c, 4);

/// The dGPU itself
pub const DGPU_ADDR: PciAddr = PciAddr::from_bdf(0x02, 0x00, 0);

/// Request segment the firmware emits when the dGPU rail comes up
pub const POWER_ON_RQSG: Rqsg = Rqsg::new(0x13, 0x02, 0x00);

/// `_DSM` function returning the address table
const FN_GPU_ADDRS: u64 = 0x02;

/// `_DSM` function setting direct power
const FN_GPU_POWER: u64 = 0x05;

/// Encode an address the way firmware stores it in the address table
pub const fn firmware_address(addr: PciAddr) -> u64 {
    ((addr.bus as u64) << 20) | ((addr.device as u64) << 15) | ((addr.function as u64) << 12)
}

/// Address table as shipped by the firmware
pub fn default_address_table() -> AcpiObject {
    AcpiObject::Package(vec![
        AcpiObject::String(String::from("RP5_PCIE")),
        AcpiObject::Integer(firmware_address(ROOT_PORT_ADDR)),
        AcpiObject::Integer(0),
        AcpiObject::String(String::from("DGPU_PCIE")),
        AcpiObject::Integer(firmware_address(DGPU_ADDR)),
        AcpiObject::Integer(0),
    ])
}

// =============================================================================
// SCRIPTING
// =============================================================================

/// Reply of the direct-power `_DSM` function
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DsmReply {
    /// One-byte buffer; zero applies the request
    Status(u8),
    /// Arbitrary buffer, request not applied
    Bytes(Vec<u8>),
    /// Method ran but returned nothing
    Null,
    /// Method returned an integer instead of a buffer
    WrongType,
    /// Evaluation failed
    Fail(HalError),
}

/// How the downstream link reacts when direct power is cut
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkRemoval {
    /// Link is down on the first status read
    Immediate,
    /// Link stays up for this many link-status reads
    AfterPolls(u32),
    /// Link never drops
    Never,
}

/// Side-effect counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MockCounters {
    /// Every hardware write (bridge or firmware)
    pub mutations: u32,
    /// Direct-power `_DSM` invocations
    pub dsm_power_calls: u32,
    /// Address-table `_DSM` invocations
    pub dsm_addr_calls: u32,
    /// Root-port D-state transitions
    pub power_transitions: u32,
    /// Configuration saves
    pub saves: u32,
    /// Configuration restores
    pub restores: u32,
    /// Device enables
    pub enables: u32,
    /// Device disables
    pub disables: u32,
    /// Bus-master enables
    pub master_sets: u32,
    /// Bus-master disables
    pub master_clears: u32,
    /// Link status reads
    pub link_reads: u32,
    /// Delay calls
    pub sleeps: u32,
    /// Total fake time slept
    pub slept_ms: u64,
    /// Request segments delivered to a handler
    pub rqsg_delivered: u32,
}

struct BoardState {
    bridge: PciPowerState,
    saved: bool,
    enabled: bool,
    master: bool,
    rail: bool,
    presence: bool,
    base_presence: bool,
    link_up: bool,
    link_removal: LinkRemoval,
    link_pending: Option<u32>,
    dsm_power_reply: DsmReply,
    dsm_available: bool,
    address_table: Option<AcpiObject>,
    devices: Vec<PciAddr>,
    gpio_count: usize,
    bridge_refs: u32,
    claimed: Vec<GpioName>,
    failing_reads: Vec<GpioName>,
    failing_acquire: Option<GpioName>,
    failing_transition: Option<PciPowerState>,
    failing_irq: bool,
    failing_link_reads: bool,
    rqsg_handler: Option<Arc<dyn RqsgHandler>>,
    irq_handlers: Vec<(u32, Arc<dyn EdgeHandler>)>,
    next_irq: u32,
    counters: MockCounters,
}

impl BoardState {
    fn mutate(&mut self) {
        self.counters.mutations += 1;
    }

    fn cut_direct_power(&mut self) {
        if self.rail && self.link_up {
            self.link_pending = match self.link_removal {
                LinkRemoval::Immediate => Some(0),
                LinkRemoval::AfterPolls(n) => Some(n),
                LinkRemoval::Never => None,
            };
        }
        self.rail = false;
    }

    fn raise_direct_power(&mut self) {
        self.rail = true;
        self.link_up = true;
        self.link_pending = None;
    }
}

// =============================================================================
// BOARD
// =============================================================================

/// Shared hardware model
pub struct MockBoard {
    state: Mutex<BoardState>,
}

assert_impl_all!(MockBoard: Send, Sync);

impl MockBoard {
    /// Board with the dGPU attached, powered and linked
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(BoardState {
                bridge: PciPowerState::D0,
                saved: false,
                enabled: true,
                master: true,
                rail: true,
                presence: true,
                base_presence: true,
                link_up: true,
                link_removal: LinkRemoval::Immediate,
                link_pending: None,
                dsm_power_reply: DsmReply::Status(0),
                dsm_available: true,
                address_table: Some(default_address_table()),
                devices: vec![ROOT_PORT_ADDR, DGPU_ADDR],
                gpio_count: 6,
                bridge_refs: 0,
                claimed: Vec::new(),
                failing_reads: Vec::new(),
                failing_acquire: None,
                failing_transition: None,
                failing_irq: false,
                failing_link_reads: false,
                rqsg_handler: None,
                irq_handlers: Vec::new(),
                next_irq: 1,
                counters: MockCounters::default(),
            }),
        })
    }

    /// Board with the dGPU attached but the root port in D3cold
    pub fn powered_off() -> Arc<Self> {
        let board = Self::new();
        {
            let mut s = board.state.lock();
            s.bridge = PciPowerState::D3Cold;
            s.rail = false;
            s.link_up = false;
            s.enabled = false;
            s.master = false;
            s.saved = true;
        }
        board
    }

    /// Platform view of this board
    pub fn platform(self: &Arc<Self>) -> MockPlatform {
        MockPlatform {
            board: Arc::clone(self),
        }
    }

    // -------------------------------------------------------------------------
    // Scripting
    // -------------------------------------------------------------------------

    /// Force the bus-layer D-state without side effects
    pub fn set_bridge_state(&self, state: PciPowerState) {
        self.state.lock().bridge = state;
    }

    /// Force the power rail line
    pub fn set_rail(&self, on: bool) {
        self.state.lock().rail = on;
    }

    /// Force the link state
    pub fn set_link_up(&self, up: bool) {
        let mut s = self.state.lock();
        s.link_up = up;
        s.link_pending = None;
    }

    /// Set the presence line without firing an edge
    pub fn set_presence(&self, present: bool) {
        self.state.lock().presence = present;
    }

    /// Configure link behaviour on direct power cut
    pub fn set_link_removal(&self, removal: LinkRemoval) {
        self.state.lock().link_removal = removal;
    }

    /// Configure the direct-power `_DSM` reply
    pub fn set_dsm_power_reply(&self, reply: DsmReply) {
        self.state.lock().dsm_power_reply = reply;
    }

    /// Remove or restore the `_DSM` method
    pub fn set_dsm_available(&self, available: bool) {
        self.state.lock().dsm_available = available;
    }

    /// Replace the address table; `None` makes the method return nothing
    pub fn set_address_table(&self, table: Option<AcpiObject>) {
        self.state.lock().address_table = table;
    }

    /// Replace the set of PCI functions present on the bus
    pub fn set_devices(&self, devices: Vec<PciAddr>) {
        self.state.lock().devices = devices;
    }

    /// Number of GPIO resources firmware describes
    pub fn set_gpio_count(&self, count: usize) {
        self.state.lock().gpio_count = count;
    }

    /// Make reads of a line fail
    pub fn fail_gpio_read(&self, name: GpioName, fail: bool) {
        let mut s = self.state.lock();
        s.failing_reads.retain(|n| *n != name);
        if fail {
            s.failing_reads.push(name);
        }
    }

    /// Make acquisition of a line fail
    pub fn fail_gpio_acquire(&self, name: Option<GpioName>) {
        self.state.lock().failing_acquire = name;
    }

    /// Make transitions into a D-state fail
    pub fn fail_transition(&self, state: Option<PciPowerState>) {
        self.state.lock().failing_transition = state;
    }

    /// Make interrupt requests fail
    pub fn fail_irq(&self, fail: bool) {
        self.state.lock().failing_irq = fail;
    }

    /// Make link and slot status reads fail
    pub fn fail_link_reads(&self, fail: bool) {
        self.state.lock().failing_link_reads = fail;
    }

    // -------------------------------------------------------------------------
    // Inspection
    // -------------------------------------------------------------------------

    /// Current bus-layer D-state
    pub fn bridge_state(&self) -> PciPowerState {
        self.state.lock().bridge
    }

    /// Current rail value
    pub fn rail(&self) -> bool {
        self.state.lock().rail
    }

    /// Current link state
    pub fn link_up(&self) -> bool {
        self.state.lock().link_up
    }

    /// Whether the root port is enabled
    pub fn is_enabled(&self) -> bool {
        self.state.lock().enabled
    }

    /// Whether bus mastering is enabled
    pub fn is_master(&self) -> bool {
        self.state.lock().master
    }

    /// Snapshot of the counters
    pub fn counters(&self) -> MockCounters {
        self.state.lock().counters
    }

    /// Zero all counters
    pub fn reset_counters(&self) {
        self.state.lock().counters = MockCounters::default();
    }

    /// Whether a request segment handler is installed
    pub fn has_rqsg_handler(&self) -> bool {
        self.state.lock().rqsg_handler.is_some()
    }

    /// Number of registered interrupt handlers
    pub fn irq_count(&self) -> usize {
        self.state.lock().irq_handlers.len()
    }

    /// Lines currently claimed
    pub fn claimed_lines(&self) -> Vec<GpioName> {
        self.state.lock().claimed.clone()
    }

    /// Outstanding root-port references
    pub fn bridge_refs(&self) -> u32 {
        self.state.lock().bridge_refs
    }

    // -------------------------------------------------------------------------
    // Events
    // -------------------------------------------------------------------------

    /// Deliver a request segment to the installed handler
    ///
    /// Returns `None` if no handler is installed.
    pub fn send_rqsg(&self, rqsg: Rqsg) -> Option<HalResult<()>> {
        log::trace!("mock: RQSG({:#04x}, {:#04x}, {:#04x})", rqsg.tc, rqsg.cid, rqsg.iid);
        let handler = {
            let mut s = self.state.lock();
            let handler = s.rqsg_handler.clone();
            if handler.is_some() {
                s.counters.rqsg_delivered += 1;
            }
            handler
        };
        handler.map(|h| h.handle(&rqsg))
    }

    /// Change the presence line and deliver one edge to every handler
    pub fn fire_presence_edge(&self, present: bool) {
        let handlers: Vec<Arc<dyn EdgeHandler>> = {
            let mut s = self.state.lock();
            s.presence = present;
            s.irq_handlers.iter().map(|(_, h)| Arc::clone(h)).collect()
        };
        for handler in handlers {
            handler.on_edge();
        }
    }

    /// Power the root port from outside the driver (e.g. a bus-layer resume)
    pub fn simulate_external_power_on(&self) {
        let was_off = {
            let mut s = self.state.lock();
            let was_off = s.bridge.is_d3();
            s.bridge = PciPowerState::D0;
            s.raise_direct_power();
            was_off
        };
        if was_off {
            self.send_rqsg(POWER_ON_RQSG);
        }
    }
}

impl RequestChannel for MockBoard {
    fn set_rqsg_handler(&self, handler: Option<Arc<dyn RqsgHandler>>) {
        // Old handler may own handles that lock the board when dropped.
        let old = core::mem::replace(&mut self.state.lock().rqsg_handler, handler);
        drop(old);
    }
}

// =============================================================================
// PLATFORM
// =============================================================================

/// Platform backed by a [`MockBoard`]
#[derive(Clone)]
pub struct MockPlatform {
    board: Arc<MockBoard>,
}

impl MockPlatform {
    /// Underlying board
    pub fn board(&self) -> &Arc<MockBoard> {
        &self.board
    }
}

impl Delay for MockPlatform {
    fn sleep_ms(&self, ms: u32) {
        let mut s = self.board.state.lock();
        s.counters.sleeps += 1;
        s.counters.slept_ms += u64::from(ms);
    }
}

impl Platform for MockPlatform {
    type Bridge = MockBridge;
    type Gpio = MockGpio;
    type Dsm = MockDsm;
    type Irq = MockIrq;

    fn name(&self) -> &'static str {
        "mock"
    }

    fn gpio_count(&self) -> usize {
        self.board.state.lock().gpio_count
    }

    fn dsm(&self) -> HalResult<MockDsm> {
        Ok(MockDsm {
            board: Arc::clone(&self.board),
        })
    }

    fn pci_device(&self, addr: PciAddr) -> HalResult<MockBridge> {
        let mut s = self.board.state.lock();
        if !s.devices.contains(&addr) {
            return Err(HalError::NotFound);
        }
        s.bridge_refs += 1;
        Ok(MockBridge {
            board: Arc::clone(&self.board),
            addr,
        })
    }

    fn gpio(&self, name: GpioName) -> HalResult<MockGpio> {
        let mut s = self.board.state.lock();
        let described = mapping(name).is_some_and(|m| usize::from(m.value_index) < s.gpio_count);
        if !described || s.failing_acquire == Some(name) {
            return Err(HalError::NotFound);
        }
        if s.claimed.contains(&name) {
            return Err(HalError::Busy);
        }
        s.claimed.push(name);
        Ok(MockGpio {
            board: Arc::clone(&self.board),
            name,
        })
    }

    fn request_irq(
        &self,
        line: &MockGpio,
        _label: &'static str,
        flags: IrqFlags,
        handler: Arc<dyn EdgeHandler>,
    ) -> HalResult<MockIrq> {
        let mut s = self.board.state.lock();
        if s.failing_irq || line.name != GpioName::DgpuPresence {
            return Err(HalError::Io);
        }
        if !flags.intersects(IrqFlags::TRIGGER_BOTH) {
            return Err(HalError::NotSupported);
        }
        let id = s.next_irq;
        s.next_irq += 1;
        s.irq_handlers.push((id, handler));
        Ok(MockIrq {
            board: Arc::clone(&self.board),
            id,
        })
    }
}

// =============================================================================
// HANDLES
// =============================================================================

/// Root-port handle
pub struct MockBridge {
    board: Arc<MockBoard>,
    addr: PciAddr,
}

impl BridgePort for MockBridge {
    fn address(&self) -> PciAddr {
        self.addr
    }

    fn current_state(&self) -> PciPowerState {
        self.board.state.lock().bridge
    }

    fn set_power_state(&mut self, state: PciPowerState) -> HalResult<()> {
        let powered_up = {
            let mut s = self.board.state.lock();
            s.mutate();
            s.counters.power_transitions += 1;
            if s.failing_transition == Some(state) {
                return Err(HalError::Io);
            }
            let was_off = s.bridge.is_d3();
            s.bridge = state;
            if state == PciPowerState::D0 && was_off {
                s.raise_direct_power();
                true
            } else {
                false
            }
        };
        // Firmware _ON runs inside the transition.
        if powered_up {
            self.board.send_rqsg(POWER_ON_RQSG);
        }
        Ok(())
    }

    fn save_state(&mut self) -> HalResult<()> {
        let mut s = self.board.state.lock();
        s.mutate();
        s.counters.saves += 1;
        s.saved = true;
        Ok(())
    }

    fn restore_state(&mut self) {
        let mut s = self.board.state.lock();
        s.mutate();
        s.counters.restores += 1;
    }

    fn enable_device(&mut self) -> HalResult<()> {
        let mut s = self.board.state.lock();
        s.mutate();
        s.counters.enables += 1;
        if s.bridge.is_d3() {
            return Err(HalError::Io);
        }
        s.enabled = true;
        Ok(())
    }

    fn disable_device(&mut self) {
        let mut s = self.board.state.lock();
        s.mutate();
        s.counters.disables += 1;
        s.enabled = false;
    }

    fn is_enabled(&self) -> bool {
        self.board.state.lock().enabled
    }

    fn set_master(&mut self) {
        let mut s = self.board.state.lock();
        s.mutate();
        s.counters.master_sets += 1;
        s.master = true;
    }

    fn clear_master(&mut self) {
        let mut s = self.board.state.lock();
        s.mutate();
        s.counters.master_clears += 1;
        s.master = false;
    }

    fn read_link_status(&self) -> HalResult<LinkStatus> {
        let mut s = self.board.state.lock();
        s.counters.link_reads += 1;
        if s.failing_link_reads {
            return Err(HalError::Io);
        }
        if s.link_up {
            match s.link_pending {
                Some(0) => {
                    s.link_up = false;
                    s.link_pending = None;
                },
                Some(n) => s.link_pending = Some(n - 1),
                None => {},
            }
        }
        Ok(if s.link_up {
            LinkStatus::DLL_LINK_ACTIVE
        } else {
            LinkStatus::empty()
        })
    }

    fn read_slot_status(&self) -> HalResult<SlotStatus> {
        let s = self.board.state.lock();
        if s.failing_link_reads {
            return Err(HalError::Io);
        }
        Ok(if s.link_up {
            SlotStatus::PRESENCE_DETECT
        } else {
            SlotStatus::empty()
        })
    }
}

impl Drop for MockBridge {
    fn drop(&mut self) {
        let mut s = self.board.state.lock();
        s.bridge_refs = s.bridge_refs.saturating_sub(1);
    }
}

/// GPIO line handle
pub struct MockGpio {
    board: Arc<MockBoard>,
    name: GpioName,
}

impl GpioLine for MockGpio {
    fn name(&self) -> GpioName {
        self.name
    }

    fn get_value(&self) -> HalResult<bool> {
        let s = self.board.state.lock();
        if s.failing_reads.contains(&self.name) {
            return Err(HalError::Io);
        }
        Ok(match self.name {
            GpioName::DgpuPower => s.rail,
            GpioName::DgpuPresence => s.presence,
            GpioName::BasePresence => s.base_presence,
        })
    }
}

impl Drop for MockGpio {
    fn drop(&mut self) {
        let name = self.name;
        self.board.state.lock().claimed.retain(|n| *n != name);
    }
}

/// `_DSM` evaluator
pub struct MockDsm {
    board: Arc<MockBoard>,
}

impl DsmMethod for MockDsm {
    fn evaluate(
        &self,
        _uuid: &Guid,
        _revision: u64,
        function: u64,
        arg: Option<&AcpiObject>,
    ) -> HalResult<Option<AcpiObject>> {
        let mut s = self.board.state.lock();
        if !s.dsm_available {
            return Err(HalError::MethodNotPresent);
        }
        match function {
            FN_GPU_ADDRS => {
                s.counters.dsm_addr_calls += 1;
                Ok(s.address_table.clone())
            },
            FN_GPU_POWER => {
                s.mutate();
                s.counters.dsm_power_calls += 1;
                match s.dsm_power_reply.clone() {
                    DsmReply::Status(status) => {
                        if status == 0 {
                            match arg.and_then(AcpiObject::as_integer) {
                                Some(0) => s.cut_direct_power(),
                                Some(_) => s.raise_direct_power(),
                                None => return Err(HalError::UnexpectedType),
                            }
                        }
                        Ok(Some(AcpiObject::Buffer(vec![status])))
                    },
                    DsmReply::Bytes(bytes) => Ok(Some(AcpiObject::Buffer(bytes))),
                    DsmReply::Null => Ok(None),
                    DsmReply::WrongType => Ok(Some(AcpiObject::Integer(0))),
                    DsmReply::Fail(err) => Err(err),
                }
            },
            _ => Err(HalError::NotSupported),
        }
    }
}

/// Interrupt registration
pub struct MockIrq {
    board: Arc<MockBoard>,
    id: u32,
}

impl Drop for MockIrq {
    fn drop(&mut self) {
        let id = self.id;
        let removed = {
            let mut s = self.board.state.lock();
            let (removed, kept): (Vec<_>, Vec<_>) =
                s.irq_handlers.drain(..).partition(|(i, _)| *i == id);
            s.irq_handlers = kept;
            removed
        };
        drop(removed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_firmware_address_encoding() {
        assert_eq!(firmware_address(ROOT_PORT_ADDR), (0x1c << 15) | (4 << 12));
        assert_eq!(firmware_address(DGPU_ADDR), 0x02 << 20);
    }

    #[test]
    fn test_leaving_d3_delivers_power_on() {
        struct Count(Mutex<u32>);
        impl RqsgHandler for Count {
            fn handle(&self, rqsg: &Rqsg) -> HalResult<()> {
                assert_eq!(*rqsg, POWER_ON_RQSG);
                *self.0.lock() += 1;
                Ok(())
            }
        }

        let board = MockBoard::powered_off();
        let count = Arc::new(Count(Mutex::new(0)));
        board.set_rqsg_handler(Some(count.clone()));

        let mut bridge = board.platform().pci_device(ROOT_PORT_ADDR).expect("bridge");
        bridge.set_power_state(PciPowerState::D0).expect("d0");
        assert_eq!(*count.0.lock(), 1);
        assert!(board.rail());

        // Already on: no second notification
        bridge.set_power_state(PciPowerState::D0).expect("d0");
        assert_eq!(*count.0.lock(), 1);
    }

    #[test]
    fn test_link_drops_after_polls() {
        let board = MockBoard::new();
        board.set_link_removal(LinkRemoval::AfterPolls(2));
        let platform = board.platform();
        let bridge = platform.pci_device(ROOT_PORT_ADDR).expect("bridge");
        let dsm = platform.dsm().expect("dsm");

        dsm.evaluate(&Guid::new(0, 0, 0, [0; 8]), 1, FN_GPU_POWER, Some(&AcpiObject::Integer(0)))
            .expect("dsm");
        assert!(!board.rail());
        assert!(bridge.read_link_status().expect("lnksta").contains(LinkStatus::DLL_LINK_ACTIVE));
        assert!(bridge.read_link_status().expect("lnksta").contains(LinkStatus::DLL_LINK_ACTIVE));
        assert!(bridge.read_link_status().expect("lnksta").is_empty());
        assert!(bridge.read_slot_status().expect("sltsta").is_empty());
    }

    #[test]
    fn test_gpio_exclusive_claim() {
        let board = MockBoard::new();
        let platform = board.platform();
        let line = platform.gpio(GpioName::DgpuPower).expect("gpio");
        assert_eq!(platform.gpio(GpioName::DgpuPower).err(), Some(HalError::Busy));
        drop(line);
        assert!(board.claimed_lines().is_empty());
        assert!(platform.gpio(GpioName::DgpuPower).is_ok());
    }

    #[test]
    fn test_irq_released_on_drop() {
        struct Nop;
        impl EdgeHandler for Nop {
            fn on_edge(&self) {}
        }

        let board = MockBoard::new();
        let platform = board.platform();
        let line = platform.gpio(GpioName::DgpuPresence).expect("gpio");
        let irq = platform
            .request_irq(&line, "test", IrqFlags::TRIGGER_BOTH, Arc::new(Nop))
            .expect("irq");
        assert_eq!(board.irq_count(), 1);
        drop(irq);
        assert_eq!(board.irq_count(), 0);
    }

    #[test]
    fn test_fake_clock() {
        let board = MockBoard::new();
        let platform = board.platform();
        platform.sleep_ms(50);
        platform.sleep_ms(50);
        let c = board.counters();
        assert_eq!((c.sleeps, c.slept_ms), (2, 100));
    }
}
