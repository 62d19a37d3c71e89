//! Signal primitives for high-voltage parallel programming
//!
//! Each primitive performs exactly one bus transaction: it selects the
//! target register with XA1/XA0/BS1, moves one byte across the data bus and
//! strobes it with XTAL1 (loads) or OE (reads). These are standalone
//! functions usable with any [`HvppMaster`] implementation.
//!
//! Primitives cannot fail. Wrong wiring or timing shows up later as a target
//! that never signals ready, not as an error here.
//!
//! | XA1 | XA0 | Action on XTAL1 pulse |
//! |-----|-----|-----------------------|
//! | 0   | 0   | Load address (BS1 selects low/high byte) |
//! | 0   | 1   | Load data (BS1 selects low/high byte) |
//! | 1   | 0   | Load command |
//! | 1   | 1   | No action, idle |

use super::traits::{Direction, HvppMaster, Line};
use crate::chip::FuseByte;

/// Give XTAL1 a positive pulse
pub fn xtal1_pulse<M: HvppMaster + ?Sized>(master: &mut M) {
    let width = master.timing().strobe_ns;
    master.set_line(Line::Xtal1, true);
    master.delay_ns(width);
    master.set_line(Line::Xtal1, false);
    master.delay_ns(width);
}

/// Give WR a negative pulse
pub fn wr_pulse<M: HvppMaster + ?Sized>(master: &mut M) {
    let width = master.timing().strobe_ns;
    master.set_line(Line::Wr, false);
    master.delay_ns(width);
    master.set_line(Line::Wr, true);
    master.delay_ns(width);
}

/// Set XA1, XA0 and BS1
fn select<M: HvppMaster + ?Sized>(master: &mut M, xa1: bool, xa0: bool, bs1: bool) {
    master.set_line(Line::Xa1, xa1);
    master.set_line(Line::Xa0, xa0);
    master.set_line(Line::Bs1, bs1);
}

/// Drive a byte, strobe it into the target and return the bus to zero
fn load<M: HvppMaster + ?Sized>(master: &mut M, value: u8) {
    master.set_bus_direction(Direction::Output);
    master.write_bus(value);
    xtal1_pulse(master);
    master.write_bus(0);
}

/// Load a command byte
pub fn load_command<M: HvppMaster + ?Sized>(master: &mut M, command: u8) {
    log::trace!("hvpp: load command 0x{:02X}", command);
    select(master, true, false, false);
    load(master, command);
}

/// Load the low address byte
pub fn load_address_low<M: HvppMaster + ?Sized>(master: &mut M, address: u8) {
    log::trace!("hvpp: load address low 0x{:02X}", address);
    select(master, false, false, false);
    load(master, address);
}

/// Load the high address byte
pub fn load_address_high<M: HvppMaster + ?Sized>(master: &mut M, address: u8) {
    log::trace!("hvpp: load address high 0x{:02X}", address);
    select(master, false, false, true);
    load(master, address);
}

/// Load the low data byte
pub fn load_data_low<M: HvppMaster + ?Sized>(master: &mut M, data: u8) {
    log::trace!("hvpp: load data low 0x{:02X}", data);
    select(master, false, true, false);
    load(master, data);
}

/// Load the high data byte
pub fn load_data_high<M: HvppMaster + ?Sized>(master: &mut M, data: u8) {
    log::trace!("hvpp: load data high 0x{:02X}", data);
    select(master, false, true, true);
    load(master, data);
}

/// Read the bus with the current BS1/BS2 selection
pub fn read_data<M: HvppMaster + ?Sized>(master: &mut M) -> u8 {
    let settle = master.timing().read_settle_ns;
    master.set_bus_direction(Direction::Input);
    master.set_line(Line::Oe, false);
    master.delay_ns(settle);
    let data = master.read_bus();
    master.set_line(Line::Oe, true);
    log::trace!("hvpp: read data 0x{:02X}", data);
    data
}

/// Read a byte with BS1 low (signature, calibration and low flash bytes)
pub fn read_byte<M: HvppMaster + ?Sized>(master: &mut M) -> u8 {
    master.set_line(Line::Bs1, false);
    read_data(master)
}

/// Read a flash word, low byte first
pub fn read_word<M: HvppMaster + ?Sized>(master: &mut M) -> u16 {
    let settle = master.timing().read_settle_ns;
    master.set_bus_direction(Direction::Input);
    master.set_line(Line::Bs1, false);
    master.set_line(Line::Oe, false);
    master.delay_ns(settle);
    let low = master.read_bus();
    master.set_line(Line::Bs1, true);
    master.delay_ns(settle);
    let high = master.read_bus();
    master.set_line(Line::Oe, true);
    master.set_line(Line::Bs1, false);
    let word = u16::from(low) | (u16::from(high) << 8);
    log::trace!("hvpp: read word 0x{:04X}", word);
    word
}

/// Select which fuse/lock byte a read returns
///
/// | Byte     | BS2 | BS1 |
/// |----------|-----|-----|
/// | Low      | 0   | 0   |
/// | High     | 1   | 1   |
/// | Extended | 1   | 0   |
/// | Lock     | 0   | 1   |
pub fn select_read_byte<M: HvppMaster + ?Sized>(master: &mut M, byte: FuseByte) {
    let (bs2, bs1) = match byte {
        FuseByte::Low => (false, false),
        FuseByte::High => (true, true),
        FuseByte::Extended => (true, false),
        FuseByte::Lock => (false, true),
    };
    master.set_line(Line::Bs2, bs2);
    master.set_line(Line::Bs1, bs1);
}
