//! Programmer trait definitions
//!
//! The high-voltage parallel interface is driven entirely in software, so
//! the only thing a backend has to provide is control over individual
//! lines and the 8-bit data bus, plus delays that are at least as long as
//! requested. All protocol knowledge lives in [`signals`](super::signals),
//! [`protocol`](crate::protocol) and [`power`](crate::power).

use super::timing::Timing;
use crate::error::Result;

/// Control, status and power lines of the programming socket
///
/// Levels are electrical levels at the target pin: `true` is high. The
/// active-low strobes (WR, OE) are asserted by driving them low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Line {
    /// XA0 - XTAL action bit 0
    Xa0,
    /// XA1 - XTAL action bit 1
    Xa1,
    /// BS1 - byte select 1
    Bs1,
    /// BS2 - byte select 2
    Bs2,
    /// PAGEL - program memory page load
    Pagel,
    /// XTAL1 - clock strobe for command/address/data loads
    Xtal1,
    /// WR - write pulse (active low)
    Wr,
    /// OE - output enable (active low)
    Oe,
    /// RDY/BSY - target status, high when ready
    RdyBsy,
    /// 5V supply enable
    Vcc,
    /// 12V on RESET enable
    Vpp,
    /// Pull target RESET to 0V
    ResetPull,
}

impl Line {
    /// Every line, in declaration order
    pub const ALL: [Line; 12] = [
        Line::Xa0,
        Line::Xa1,
        Line::Bs1,
        Line::Bs2,
        Line::Pagel,
        Line::Xtal1,
        Line::Wr,
        Line::Oe,
        Line::RdyBsy,
        Line::Vcc,
        Line::Vpp,
        Line::ResetPull,
    ];

    /// Position of this line in [`Line::ALL`]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Lines that are driven while the target is in programming mode
    pub const CONTROL: [Line; 8] = [
        Line::Xa0,
        Line::Xa1,
        Line::Bs1,
        Line::Bs2,
        Line::Pagel,
        Line::Xtal1,
        Line::Wr,
        Line::Oe,
    ];

    /// Power switching outputs
    pub const POWER: [Line; 3] = [Line::Vcc, Line::Vpp, Line::ResetPull];

    /// Signal name as printed on the target datasheet
    pub const fn name(self) -> &'static str {
        match self {
            Line::Xa0 => "XA0",
            Line::Xa1 => "XA1",
            Line::Bs1 => "BS1",
            Line::Bs2 => "BS2",
            Line::Pagel => "PAGEL",
            Line::Xtal1 => "XTAL1",
            Line::Wr => "WR",
            Line::Oe => "OE",
            Line::RdyBsy => "RDY/BSY",
            Line::Vcc => "VCC_EN",
            Line::Vpp => "VPP_EN",
            Line::ResetPull => "RST_PULL",
        }
    }
}

/// Direction of a line or of the data bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// High impedance, sampled
    Input,
    /// Driven by the programmer
    Output,
}

/// Line-control capability of a high-voltage parallel programmer
///
/// Setting a line's level does not change its direction; a line set while
/// it is an input takes that level once it becomes an output.
///
/// ## Example: GPIO backend
///
/// ```ignore
/// impl HvppMaster for MyGpio {
///     fn set_line(&mut self, line: Line, high: bool) {
///         self.pin(line).set_level(high);
///     }
///
///     fn rdy_bsy(&mut self) -> Result<bool> {
///         Ok(self.pin(Line::RdyBsy).is_high())
///     }
///     // ...
/// }
/// ```
pub trait HvppMaster {
    /// Set the direction of a single line
    fn set_direction(&mut self, line: Line, dir: Direction);

    /// Set the output level of a single line
    fn set_line(&mut self, line: Line, high: bool);

    /// Set the direction of all eight data lines
    fn set_bus_direction(&mut self, dir: Direction);

    /// Put a byte on the data bus (bit n on DATAn)
    fn write_bus(&mut self, value: u8);

    /// Sample the data bus
    fn read_bus(&mut self) -> u8;

    /// Sample the RDY/BSY line (`true` = ready)
    ///
    /// Hardware backends poll this without bound. A backend that can tell
    /// the target will never become ready returns
    /// [`Error::TargetTimeout`](crate::error::Error::TargetTimeout).
    fn rdy_bsy(&mut self) -> Result<bool>;

    /// Timing parameters this backend was configured with
    fn timing(&self) -> &Timing;

    /// Wait at least `us` microseconds
    fn delay_us(&mut self, us: u32);

    /// Wait at least `ns` nanoseconds
    fn delay_ns(&mut self, ns: u32);

    /// Return every line to its reset state
    ///
    /// Data bus and control lines become inputs, RDY/BSY is released and
    /// all power outputs are switched off. This must leave no line able to
    /// feed current into an unpowered target.
    fn release_all(&mut self) {
        self.set_bus_direction(Direction::Input);
        self.write_bus(0);
        for line in Line::CONTROL {
            self.set_direction(line, Direction::Input);
            self.set_line(line, false);
        }
        self.set_direction(Line::RdyBsy, Direction::Input);
        for line in Line::POWER {
            self.set_line(line, false);
        }
    }
}

// Blanket impl for boxed masters to allow trait objects
#[cfg(feature = "alloc")]
impl HvppMaster for alloc::boxed::Box<dyn HvppMaster + Send> {
    fn set_direction(&mut self, line: Line, dir: Direction) {
        (**self).set_direction(line, dir)
    }

    fn set_line(&mut self, line: Line, high: bool) {
        (**self).set_line(line, high)
    }

    fn set_bus_direction(&mut self, dir: Direction) {
        (**self).set_bus_direction(dir)
    }

    fn write_bus(&mut self, value: u8) {
        (**self).write_bus(value)
    }

    fn read_bus(&mut self) -> u8 {
        (**self).read_bus()
    }

    fn rdy_bsy(&mut self) -> Result<bool> {
        (**self).rdy_bsy()
    }

    fn timing(&self) -> &Timing {
        (**self).timing()
    }

    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }

    fn delay_ns(&mut self, ns: u32) {
        (**self).delay_ns(ns)
    }

    fn release_all(&mut self) {
        (**self).release_all()
    }
}
