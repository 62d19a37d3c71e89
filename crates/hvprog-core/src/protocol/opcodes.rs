//! High-voltage parallel programming command bytes
//!
//! Loaded with XA1/XA0 = 10 before the address/data phase of each
//! operation.

/// Chip erase (flash, EEPROM and lock bits)
pub const CHIP_ERASE: u8 = 0b1000_0000;
/// Write fuse bits
pub const WRITE_FUSE: u8 = 0b0100_0000;
/// Read signature bytes and calibration byte
pub const READ_SIGNATURE: u8 = 0b0000_1000;
/// Read fuse and lock bits
pub const READ_FUSE_LOCK: u8 = 0b0000_0100;
/// Read flash
pub const READ_FLASH: u8 = 0b0000_0010;

/// Value returned for the extended fuse byte when it is not read
pub const EXTENDED_NOT_PRESENT: u8 = 0xFF;
