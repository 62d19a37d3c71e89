//! Power and mode sequencing
//!
//! Moves the target between unpowered, running and high-voltage programming
//! mode. The entry sequence follows the datasheet procedure for targets
//! whose RESET pin may already be configured as an I/O: 12V must reach
//! RESET within a few clock cycles of VCC, with the Prog_enable pattern
//! already stable on PAGEL/XA1/XA0/BS1.

use crate::error::Result;
use crate::programmer::signals::xtal1_pulse;
use crate::programmer::{Direction, HvppMaster, Line};

/// Put the target into high-voltage programming mode
///
/// The configured [`Timing`](crate::programmer::Timing) is validated
/// first; nothing is driven if it is below the target minimums.
pub fn enter_programming<M: HvppMaster + ?Sized>(master: &mut M) -> Result<()> {
    let timing = *master.timing();
    timing.validate()?;

    log::debug!("power: entering programming mode");

    master.set_line(Line::Vcc, true);
    master.set_line(Line::ResetPull, true);
    master.delay_us(timing.power_settle_us);

    // Levels before directions so no strobe glitches when the pins start driving
    for line in Line::CONTROL {
        master.set_line(line, false);
    }
    master.set_line(Line::Oe, true);
    master.set_line(Line::Wr, true);
    for line in Line::CONTROL {
        master.set_direction(line, Direction::Output);
    }
    master.set_direction(Line::RdyBsy, Direction::Input);

    for _ in 0..timing.priming_pulses {
        xtal1_pulse(master);
    }

    // Prog_enable
    master.set_line(Line::Pagel, false);
    master.set_line(Line::Xa1, false);
    master.set_line(Line::Xa0, false);
    master.set_line(Line::Bs1, false);
    master.set_line(Line::Wr, false);
    master.delay_ns(timing.prog_enable_settle_ns);

    master.set_line(Line::ResetPull, false);
    master.set_line(Line::Vpp, true);
    master.delay_us(timing.vpp_settle_us);

    master.set_line(Line::Wr, true);
    Ok(())
}

/// Leave programming mode and switch everything off
///
/// Runs unconditionally, whatever state the lines are in.
pub fn exit_programming<M: HvppMaster + ?Sized>(master: &mut M) {
    log::debug!("power: leaving programming mode");
    let settle = master.timing().exit_settle_us;
    master.set_line(Line::Vpp, false);
    master.set_line(Line::ResetPull, true);
    master.delay_us(settle);
    master.release_all();
}

/// Power the target and let it run its application
pub fn power_up<M: HvppMaster + ?Sized>(master: &mut M) {
    log::debug!("power: power up");
    let hold = master.timing().run_reset_us;
    master.set_line(Line::Vcc, true);
    master.set_line(Line::ResetPull, true);
    master.set_direction(Line::RdyBsy, Direction::Input);
    master.delay_us(hold);
    master.set_line(Line::ResetPull, false);
}

/// Remove power from a running target
pub fn power_down<M: HvppMaster + ?Sized>(master: &mut M) {
    log::debug!("power: power down");
    master.set_line(Line::RdyBsy, false);
    master.set_direction(Line::RdyBsy, Direction::Output);
    master.set_line(Line::Vcc, false);
}
