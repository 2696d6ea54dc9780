//! # ACPI Device-Specific Methods
//!
//! Minimal firmware object model and `_DSM` evaluation.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::error::{HalError, HalResult};

// =============================================================================
// GUID
// =============================================================================

/// 128-bit firmware GUID in mixed-endian `GUID_INIT` layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Guid {
    /// First group
    pub data1: u32,
    /// Second group
    pub data2: u16,
    /// Third group
    pub data3: u16,
    /// Trailing eight bytes
    pub data4: [u8; 8],
}

impl Guid {
    /// Create a GUID from its groups
    pub const fn new(data1: u32, data2: u16, data3: u16, data4: [u8; 8]) -> Self {
        Self {
            data1,
            data2,
            data3,
            data4,
        }
    }

    /// Byte representation as passed to firmware
    pub fn to_bytes(&self) -> [u8; 16] {
        let mut out = [0u8; 16];
        out[0..4].copy_from_slice(&self.data1.to_le_bytes());
        out[4..6].copy_from_slice(&self.data2.to_le_bytes());
        out[6..8].copy_from_slice(&self.data3.to_le_bytes());
        out[8..16].copy_from_slice(&self.data4);
        out
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = &self.data4;
        write!(
            f,
            "{:08x}-{:04x}-{:04x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
            self.data1, self.data2, self.data3, d[0], d[1], d[2], d[3], d[4], d[5], d[6], d[7]
        )
    }
}

// =============================================================================
// OBJECT MODEL
// =============================================================================

/// Firmware object type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcpiObjectType {
    /// Integer
    Integer,
    /// String
    String,
    /// Buffer
    Buffer,
    /// Package
    Package,
}

/// Firmware object
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcpiObject {
    /// 64-bit integer
    Integer(u64),
    /// ASCII string
    String(String),
    /// Raw byte buffer
    Buffer(Vec<u8>),
    /// Ordered list of objects
    Package(Vec<AcpiObject>),
}

impl AcpiObject {
    /// Type tag of this object
    pub fn object_type(&self) -> AcpiObjectType {
        match self {
            Self::Integer(_) => AcpiObjectType::Integer,
            Self::String(_) => AcpiObjectType::String,
            Self::Buffer(_) => AcpiObjectType::Buffer,
            Self::Package(_) => AcpiObjectType::Package,
        }
    }

    /// Integer value, if this is an integer
    pub fn as_integer(&self) -> Option<u64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// String value, if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Buffer contents, if this is a buffer
    pub fn as_buffer(&self) -> Option<&[u8]> {
        match self {
            Self::Buffer(b) => Some(b.as_slice()),
            _ => None,
        }
    }

    /// Package elements, if this is a package
    pub fn as_package(&self) -> Option<&[AcpiObject]> {
        match self {
            Self::Package(p) => Some(p.as_slice()),
            _ => None,
        }
    }
}

// =============================================================================
// DSM TRAIT
// =============================================================================

/// `_DSM` evaluator bound to one firmware device
pub trait DsmMethod: Send + Sync {
    /// Evaluate a `_DSM` function
    ///
    /// Returns `Ok(None)` when the method ran but produced no object.
    fn evaluate(
        &self,
        uuid: &Guid,
        revision: u64,
        function: u64,
        arg: Option<&AcpiObject>,
    ) -> HalResult<Option<AcpiObject>>;

    /// Evaluate a `_DSM` function and require a result of the given type
    ///
    /// A missing result maps to [`HalError::Io`], a result of another type to
    /// [`HalError::UnexpectedType`].
    fn evaluate_typed(
        &self,
        uuid: &Guid,
        revision: u64,
        function: u64,
        arg: Option<&AcpiObject>,
        expected: AcpiObjectType,
    ) -> HalResult<AcpiObject> {
        match self.evaluate(uuid, revision, function, arg)? {
            None => Err(HalError::Io),
            Some(obj) if obj.object_type() == expected => Ok(obj),
            Some(_) => Err(HalError::UnexpectedType),
        }
    }
}
