//! Programming socket on RP2040 GPIO
//!
//! Every socket signal is a [`Flex`] pin so the data bus and the control
//! lines can be released to high impedance whenever the target is not in
//! programming mode. Power switch enables are plain outputs for the whole
//! lifetime of the firmware.

use embassy_rp::gpio::{Flex, Level, Pull};
use embassy_time::{block_for, Duration};
use hvprog_core::error::Result;
use hvprog_core::programmer::{Direction, HvppMaster, Line, Timing};

/// System clock frequency in MHz (default embassy-rp clock setup)
const SYS_CLK_MHZ: u32 = 125;

fn level(high: bool) -> Level {
    if high {
        Level::High
    } else {
        Level::Low
    }
}

/// HVPP socket wired to RP2040 pins
pub struct PicoHvpp {
    /// DATA0..DATA7
    data: [Flex<'static>; 8],
    /// Signals indexed by [`Line::index`]
    lines: [Flex<'static>; 12],
    timing: Timing,
}

impl PicoHvpp {
    /// Take ownership of the socket pins
    ///
    /// All pins start as floating inputs, power switches as low outputs.
    pub fn new(
        mut data: [Flex<'static>; 8],
        mut lines: [Flex<'static>; 12],
        timing: Timing,
    ) -> Self {
        for pin in data.iter_mut() {
            pin.set_pull(Pull::None);
            pin.set_as_input();
        }
        for line in Line::ALL {
            let pin = &mut lines[line.index()];
            pin.set_low();
            if Line::POWER.contains(&line) {
                pin.set_as_output();
            } else {
                pin.set_pull(Pull::None);
                pin.set_as_input();
            }
        }

        Self {
            data,
            lines,
            timing,
        }
    }

    fn pin(&mut self, line: Line) -> &mut Flex<'static> {
        &mut self.lines[line.index()]
    }
}

impl HvppMaster for PicoHvpp {
    fn set_direction(&mut self, line: Line, dir: Direction) {
        if Line::POWER.contains(&line) {
            return;
        }
        match dir {
            Direction::Output => self.pin(line).set_as_output(),
            Direction::Input => self.pin(line).set_as_input(),
        }
    }

    fn set_line(&mut self, line: Line, high: bool) {
        self.pin(line).set_level(level(high));
    }

    fn set_bus_direction(&mut self, dir: Direction) {
        for pin in self.data.iter_mut() {
            match dir {
                Direction::Output => pin.set_as_output(),
                Direction::Input => pin.set_as_input(),
            }
        }
    }

    fn write_bus(&mut self, value: u8) {
        for (bit, pin) in self.data.iter_mut().enumerate() {
            pin.set_level(level(value & (1 << bit) != 0));
        }
    }

    fn read_bus(&mut self) -> u8 {
        self.data
            .iter()
            .enumerate()
            .fold(0, |acc, (bit, pin)| acc | (u8::from(pin.is_high()) << bit))
    }

    fn rdy_bsy(&mut self) -> Result<bool> {
        Ok(self.pin(Line::RdyBsy).is_high())
    }

    fn timing(&self) -> &Timing {
        &self.timing
    }

    fn delay_us(&mut self, us: u32) {
        block_for(Duration::from_micros(u64::from(us)));
    }

    fn delay_ns(&mut self, ns: u32) {
        // Below the timer tick, so count cycles; rounds up to at least one
        cortex_m::asm::delay(ns.saturating_mul(SYS_CLK_MHZ) / 1000 + 1);
    }
}
