//! Fuse and lock byte presentation
//!
//! Reads the configuration bytes from a target in programming mode and
//! reports them against the factory defaults of its database record.

mod palette;
mod report;

pub use palette::Palette;
pub use report::{render, Comparison, Verdict};

use core::fmt::Write;

use crate::chip::DeviceDescriptor;
use crate::error::Result;
use crate::programmer::HvppMaster;
use crate::protocol::read_fuse_and_lock;

/// Read the fuse and lock bytes of `device` and report them
///
/// Records without authoritative defaults always have their extended byte
/// read, since nothing says whether the part has one.
pub fn present<M, W>(
    master: &mut M,
    device: &DeviceDescriptor,
    verdict: Verdict,
    palette: Palette,
    out: &mut W,
) -> Result<Comparison>
where
    M: HvppMaster + ?Sized,
    W: Write + ?Sized,
{
    let read_extended = !device.is_supported() || device.has_extended_fuse();
    let snapshot = read_fuse_and_lock(master, read_extended);
    Ok(render(out, device, &snapshot, verdict, palette)?)
}
