//! AVR device type definitions

use core::fmt;
use core::ops::{Index, IndexMut};

use super::flags::DeviceFlags;

/// Names of the eight bits of one fuse or lock byte
///
/// Slot 0 is bit 0. `None` marks an unnamed or reserved bit.
pub type BitNames = [Option<&'static str>; 8];

/// One of the configuration bytes of an AVR target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FuseByte {
    /// Fuse low byte
    Low,
    /// Fuse high byte
    High,
    /// Extended fuse byte
    Extended,
    /// Lock bits
    Lock,
}

impl FuseByte {
    /// All bytes in snapshot order
    pub const ALL: [FuseByte; 4] = [
        FuseByte::Low,
        FuseByte::High,
        FuseByte::Extended,
        FuseByte::Lock,
    ];

    /// Position of this byte in a [`FuseLockSnapshot`]
    pub const fn index(self) -> usize {
        match self {
            FuseByte::Low => 0,
            FuseByte::High => 1,
            FuseByte::Extended => 2,
            FuseByte::Lock => 3,
        }
    }

    /// Lower-case name, as used on the command channel
    pub const fn name(self) -> &'static str {
        match self {
            FuseByte::Low => "low",
            FuseByte::High => "high",
            FuseByte::Extended => "extended",
            FuseByte::Lock => "lock",
        }
    }
}

impl fmt::Display for FuseByte {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fuse and lock bytes captured from a target
///
/// Stored as `[low, high, extended, lock]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FuseLockSnapshot(pub [u8; 4]);

impl FuseLockSnapshot {
    /// Build a snapshot from individual bytes
    pub const fn new(low: u8, high: u8, extended: u8, lock: u8) -> Self {
        Self([low, high, extended, lock])
    }

    /// Fuse low byte
    pub const fn low(&self) -> u8 {
        self.0[0]
    }

    /// Fuse high byte
    pub const fn high(&self) -> u8 {
        self.0[1]
    }

    /// Extended fuse byte (0xFF when not read)
    pub const fn extended(&self) -> u8 {
        self.0[2]
    }

    /// Lock byte
    pub const fn lock(&self) -> u8 {
        self.0[3]
    }
}

impl Index<FuseByte> for FuseLockSnapshot {
    type Output = u8;

    fn index(&self, byte: FuseByte) -> &u8 {
        &self.0[byte.index()]
    }
}

impl IndexMut<FuseByte> for FuseLockSnapshot {
    fn index_mut(&mut self, byte: FuseByte) -> &mut u8 {
        &mut self.0[byte.index()]
    }
}

/// AVR device definition
///
/// Records are immutable and live in the static [`DEVICES`](super::DEVICES)
/// table. Related parts share their bit-name arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceDescriptor {
    /// 24-bit signature (byte 0 in bits 16-23)
    pub signature: u32,
    /// Part name (e.g., "ATmega328P")
    pub name: &'static str,
    /// Capability flags
    pub flags: DeviceFlags,
    /// Factory default fuse low byte
    pub fuse_low: u8,
    /// Factory default fuse high byte
    pub fuse_high: u8,
    /// Factory default extended fuse byte
    pub fuse_extended: u8,
    /// Factory default lock byte
    pub lock: u8,
    /// Bit names of the fuse low byte
    pub fuse_low_bits: &'static BitNames,
    /// Bit names of the fuse high byte
    pub fuse_high_bits: &'static BitNames,
    /// Bit names of the extended fuse byte (`None` if the part has none)
    pub fuse_extended_bits: Option<&'static BitNames>,
    /// Bit names of the lock byte
    pub lock_bits: &'static BitNames,
}

impl DeviceDescriptor {
    /// Whether the factory defaults and bit maps are authoritative
    pub fn is_supported(&self) -> bool {
        self.flags.contains(DeviceFlags::SUPPORTED)
    }

    /// Whether the device has an extended fuse byte
    pub fn has_extended_fuse(&self) -> bool {
        self.flags.contains(DeviceFlags::FUSE_EXTENDED)
    }

    /// Factory defaults as a snapshot
    pub const fn defaults(&self) -> FuseLockSnapshot {
        FuseLockSnapshot::new(self.fuse_low, self.fuse_high, self.fuse_extended, self.lock)
    }

    /// Factory default of one byte
    pub const fn default_of(&self, byte: FuseByte) -> u8 {
        match byte {
            FuseByte::Low => self.fuse_low,
            FuseByte::High => self.fuse_high,
            FuseByte::Extended => self.fuse_extended,
            FuseByte::Lock => self.lock,
        }
    }

    /// Bit names of one byte, if the record has them
    pub fn bit_names(&self, byte: FuseByte) -> Option<&'static BitNames> {
        match byte {
            FuseByte::Low => Some(self.fuse_low_bits),
            FuseByte::High => Some(self.fuse_high_bits),
            FuseByte::Extended => self.fuse_extended_bits,
            FuseByte::Lock => Some(self.lock_bits),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_index() {
        let mut snap = FuseLockSnapshot::new(0x62, 0xD9, 0xFF, 0x3F);
        assert_eq!(snap[FuseByte::Low], 0x62);
        assert_eq!(snap[FuseByte::High], 0xD9);
        assert_eq!(snap[FuseByte::Lock], 0x3F);

        snap[FuseByte::Extended] = 0xFD;
        assert_eq!(snap.extended(), 0xFD);
    }

    #[test]
    fn test_fuse_byte_order() {
        for (i, byte) in FuseByte::ALL.iter().enumerate() {
            assert_eq!(byte.index(), i);
        }
    }

    #[test]
    fn test_fuse_byte_display() {
        use std::string::ToString;

        assert_eq!(FuseByte::Extended.to_string(), "extended");
        assert_eq!(FuseByte::Lock.to_string(), FuseByte::Lock.name());
    }
}
