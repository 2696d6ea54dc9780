//! # Address Discovery
//!
//! The firmware describes the PCI location of the dGPU and its root port in
//! an address table returned by the hot-plug device's `_DSM`. The table is
//! a flat package of `(name, address, flags)` triples.

use shps_hal::{AcpiObject, AcpiObjectType, DsmMethod, HalError, PciAddr, Platform};

use crate::dsm::{SHPS_DSM_GPU_ADDRS, SHPS_DSM_REVISION, SHPS_DSM_UUID};
use crate::error::{Error, Result};

/// Table entry of the dGPU root port
pub const SHPS_RP_NAME: &str = "RP5_PCIE";

/// Table entry of the dGPU
pub const SHPS_DGPU_NAME: &str = "DGPU_PCIE";

/// Significant bytes of an entry name
const NAME_LEN: usize = 64;

const ADDR_BUS_MASK: u64 = 0x0FF0_0000;
const ADDR_BUS_SHIFT: u32 = 20;
const ADDR_DEV_MASK: u64 = 0x000F_8000;
const ADDR_DEV_SHIFT: u32 = 15;
const ADDR_FN_MASK: u64 = 0x0000_7000;
const ADDR_FN_SHIFT: u32 = 12;

/// Decode a firmware-encoded address; zero means absent
pub fn decode_address(raw: u64) -> Option<PciAddr> {
    if raw == 0 {
        return None;
    }

    let bus = ((raw & ADDR_BUS_MASK) >> ADDR_BUS_SHIFT) as u8;
    let dev = ((raw & ADDR_DEV_MASK) >> ADDR_DEV_SHIFT) as u8;
    let fun = ((raw & ADDR_FN_MASK) >> ADDR_FN_SHIFT) as u8;

    Some(PciAddr::from_bdf(bus, dev, fun))
}

fn name_matches(entry: &str, name: &str) -> bool {
    let a = entry.as_bytes();
    let b = name.as_bytes();
    a[..a.len().min(NAME_LEN)] == b[..b.len().min(NAME_LEN)]
}

/// Find `name` in an address table
///
/// Every complete triple is type-checked, even after a match; a trailing
/// partial triple is ignored. The last matching entry wins.
pub fn find_address(table: &[AcpiObject], name: &str) -> Result<PciAddr> {
    let mut raw = 0;

    for entry in table.chunks_exact(3) {
        let (entry_name, addr) = match entry {
            [AcpiObject::String(n), AcpiObject::Integer(a), AcpiObject::Integer(_)] => (n, *a),
            _ => return Err(Error::MalformedTable),
        };

        if name_matches(entry_name, name) {
            raw = addr;
        }
    }

    decode_address(raw).ok_or(Error::NotFound)
}

/// Look up `name` through the address-table `_DSM`
pub fn lookup_address<D: DsmMethod + ?Sized>(dsm: &D, name: &str) -> Result<PciAddr> {
    let table = dsm
        .evaluate_typed(
            &SHPS_DSM_UUID,
            SHPS_DSM_REVISION,
            SHPS_DSM_GPU_ADDRS,
            None,
            AcpiObjectType::Package,
        )
        .map_err(|e| match e {
            HalError::MethodNotPresent => Error::MethodNotPresent,
            _ => Error::Io,
        })?;

    match table.as_package() {
        Some(entries) => find_address(entries, name),
        None => Err(Error::Io),
    }
}

/// Resolve and open the dGPU root port
pub fn root_port<P: Platform>(platform: &P, dsm: &P::Dsm) -> Result<P::Bridge> {
    let addr = lookup_address(dsm, SHPS_RP_NAME)?;
    log::debug!("dGPU root port at {}", addr);

    platform.pci_device(addr).map_err(|e| match e {
        HalError::NotFound => Error::NotFound,
        other => Error::from(other),
    })
}
