//! Device capability flags

use bitflags::bitflags;

bitflags! {
    /// Capability flags for AVR devices
    ///
    /// These flags describe how much of a database record can be trusted
    /// and which fuse bytes the device actually has.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DeviceFlags: u8 {
        /// Factory defaults and bit maps are verified against the datasheet
        const SUPPORTED      = 1 << 0;
        /// Device has an extended fuse byte
        const FUSE_EXTENDED  = 1 << 1;
    }
}

impl Default for DeviceFlags {
    fn default() -> Self {
        DeviceFlags::empty()
    }
}
