//! # SAN Request Segments
//!
//! Notifications the embedded controller forwards to ACPI as request
//! segments. The hot-plug driver receives them through a single handler
//! slot on the request channel.

use alloc::sync::Arc;

use crate::error::HalResult;

/// Request segment (target category, command id, instance id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rqsg {
    /// Target category
    pub tc: u8,
    /// Command id
    pub cid: u8,
    /// Instance id
    pub iid: u8,
}

impl Rqsg {
    /// Create a new request segment
    pub const fn new(tc: u8, cid: u8, iid: u8) -> Self {
        Self { tc, cid, iid }
    }

    /// Check the category/command signature, ignoring the instance
    pub const fn matches(&self, tc: u8, cid: u8) -> bool {
        self.tc == tc && self.cid == cid
    }
}

/// Receiver of request segments
///
/// May be invoked synchronously from inside a bridge power transition.
pub trait RqsgHandler: Send + Sync {
    /// Handle one request segment
    fn handle(&self, rqsg: &Rqsg) -> HalResult<()>;
}

/// Request channel with exactly one handler slot
pub trait RequestChannel: Send + Sync {
    /// Install a handler, replacing any previous one; `None` clears the slot
    fn set_rqsg_handler(&self, handler: Option<Arc<dyn RqsgHandler>>);
}
