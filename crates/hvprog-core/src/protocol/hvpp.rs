//! High-voltage parallel programming protocol implementation
//!
//! This module implements the target-facing operations as described in the
//! "Parallel Programming" chapter of the ATmega datasheets.
//!
//! Every function assumes the target is already in programming mode (see
//! [`power::enter_programming`](crate::power::enter_programming)). The
//! session controller guarantees this; nothing here checks it.
//!
//! ## Ready/busy handshake
//!
//! Write operations end with a negative WR pulse, after which the target
//! pulls RDY/BSY low until the operation completes. [`wait_ready`] first
//! waits for the line to drop and only then for it to rise again. Skipping
//! the first phase can sample RDY/BSY before the target reacted and report
//! completion of an operation that has not started.

use super::opcodes;
use crate::chip::{FuseByte, FuseLockSnapshot};
use crate::error::Result;
use crate::programmer::signals::{
    load_address_high, load_address_low, load_command, load_data_low, read_byte, read_data,
    read_word, select_read_byte, wr_pulse,
};
use crate::programmer::{HvppMaster, Line};

/// Wait for a write operation to complete
///
/// Polls RDY/BSY until it goes low, then until it goes high again. There is
/// no timeout: the loop only ends early if the backend reports an error.
pub fn wait_ready<M: HvppMaster + ?Sized>(master: &mut M) -> Result<()> {
    while master.rdy_bsy()? {
        core::hint::spin_loop();
    }
    while !master.rdy_bsy()? {
        core::hint::spin_loop();
    }
    Ok(())
}

/// Read the 24-bit device signature
///
/// Signature byte 0 ends up in bits 16-23, byte 2 in bits 0-7.
pub fn read_signature<M: HvppMaster + ?Sized>(master: &mut M) -> u32 {
    load_command(master, opcodes::READ_SIGNATURE);

    let mut signature = 0u32;
    for address in 0..3u8 {
        load_address_low(master, address);
        signature = (signature << 8) | u32::from(read_byte(master));
    }

    log::debug!("hvpp: signature {:06X}", signature);
    signature
}

/// Read fuse low/high/extended and lock bytes
///
/// The extended byte is only read when `read_extended` is set; otherwise
/// it is reported as 0xFF, which is also what parts without an extended
/// fuse return.
pub fn read_fuse_and_lock<M: HvppMaster + ?Sized>(
    master: &mut M,
    read_extended: bool,
) -> FuseLockSnapshot {
    load_command(master, opcodes::READ_FUSE_LOCK);

    let mut snapshot = FuseLockSnapshot::default();
    for byte in FuseByte::ALL {
        snapshot[byte] = if byte == FuseByte::Extended && !read_extended {
            opcodes::EXTENDED_NOT_PRESENT
        } else {
            select_read_byte(master, byte);
            read_data(master)
        };
    }

    // Leave BS2/BS1 selecting the low byte
    master.set_line(Line::Bs2, false);
    master.set_line(Line::Bs1, false);

    log::debug!(
        "hvpp: fuses low={:02X} high={:02X} ext={:02X} lock={:02X}",
        snapshot.low(),
        snapshot.high(),
        snapshot.extended(),
        snapshot.lock()
    );
    snapshot
}

/// Program one fuse byte with the given BS2/BS1 selection
///
/// A bit value of 0 programs the fuse bit, 1 erases it.
fn program_fuse<M: HvppMaster + ?Sized>(
    master: &mut M,
    byte: FuseByte,
    (bs2, bs1): (bool, bool),
    bits: u8,
) -> Result<()> {
    log::debug!("hvpp: program fuse {} {:02X}", byte, bits);
    load_command(master, opcodes::WRITE_FUSE);
    load_data_low(master, bits);
    master.set_line(Line::Bs2, bs2);
    master.set_line(Line::Bs1, bs1);
    wr_pulse(master);
    let result = wait_ready(master);
    master.set_line(Line::Bs2, false);
    master.set_line(Line::Bs1, false);
    result
}

/// Program the fuse low byte
pub fn program_fuse_low<M: HvppMaster + ?Sized>(master: &mut M, bits: u8) -> Result<()> {
    program_fuse(master, FuseByte::Low, (false, false), bits)
}

/// Program the fuse high byte
pub fn program_fuse_high<M: HvppMaster + ?Sized>(master: &mut M, bits: u8) -> Result<()> {
    program_fuse(master, FuseByte::High, (false, true), bits)
}

/// Program the extended fuse byte
pub fn program_fuse_extended<M: HvppMaster + ?Sized>(master: &mut M, bits: u8) -> Result<()> {
    program_fuse(master, FuseByte::Extended, (true, false), bits)
}

/// Erase the chip
///
/// Erases flash and EEPROM and clears the lock bits in a single operation.
pub fn erase_chip<M: HvppMaster + ?Sized>(master: &mut M) -> Result<()> {
    log::debug!("hvpp: chip erase");
    load_command(master, opcodes::CHIP_ERASE);
    wr_pulse(master);
    wait_ready(master)
}

/// Read one word of flash
///
/// `address` is a word address.
pub fn read_flash_word<M: HvppMaster + ?Sized>(master: &mut M, address: u16) -> u16 {
    load_command(master, opcodes::READ_FLASH);
    load_address_high(master, (address >> 8) as u8);
    load_address_low(master, address as u8);
    read_word(master)
}
