//! Programming-mode timing parameters
//!
//! The minimum values are dictated by the target silicon. Backends use a
//! [`Timing`] to size their delays and must never wait less than it says.

use crate::error::{Error, Result};

/// Minimum time VCC must be applied before programming mode entry (µs)
pub const MIN_POWER_SETTLE_US: u32 = 100;
/// Minimum time the Prog_enable pattern must be stable before 12V (ns)
pub const MIN_PROG_ENABLE_SETTLE_NS: u32 = 100;
/// Minimum time after applying 12V to RESET before the first command (µs)
pub const MIN_VPP_SETTLE_US: u32 = 50;
/// Minimum time after removing 12V before lines may be released (µs)
pub const MIN_EXIT_SETTLE_US: u32 = 1000;
/// Minimum number of XTAL1 pulses while RESET is held low
pub const MIN_PRIMING_PULSES: u32 = 6;

/// Delays and pulse widths used by the signal primitives and the sequencer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// VCC settle time before driving control lines (µs)
    pub power_settle_us: u32,
    /// Prog_enable pattern settle time before 12V (ns)
    pub prog_enable_settle_ns: u32,
    /// 12V settle time before the first command (µs)
    pub vpp_settle_us: u32,
    /// Settle time after removing 12V on exit (µs)
    pub exit_settle_us: u32,
    /// Reset hold time when powering up into run mode (µs)
    pub run_reset_us: u32,
    /// XTAL1/WR strobe pulse width (ns)
    pub strobe_ns: u32,
    /// Time between asserting OE and sampling the bus (ns)
    pub read_settle_ns: u32,
    /// Number of XTAL1 priming pulses during entry
    pub priming_pulses: u32,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            power_settle_us: 200,
            prog_enable_settle_ns: 1000,
            vpp_settle_us: MIN_VPP_SETTLE_US,
            exit_settle_us: MIN_EXIT_SETTLE_US,
            run_reset_us: 1000,
            strobe_ns: 250,
            read_settle_ns: 1000,
            priming_pulses: MIN_PRIMING_PULSES,
        }
    }
}

impl Timing {
    /// Set the VCC settle time in microseconds
    pub fn with_power_settle_us(mut self, us: u32) -> Self {
        self.power_settle_us = us;
        self
    }

    /// Set the 12V settle time in microseconds
    pub fn with_vpp_settle_us(mut self, us: u32) -> Self {
        self.vpp_settle_us = us;
        self
    }

    /// Set the exit settle time in microseconds
    pub fn with_exit_settle_us(mut self, us: u32) -> Self {
        self.exit_settle_us = us;
        self
    }

    /// Set the strobe pulse width in nanoseconds
    pub fn with_strobe_ns(mut self, ns: u32) -> Self {
        self.strobe_ns = ns;
        self
    }

    /// Set the bus read settle time in nanoseconds
    pub fn with_read_settle_ns(mut self, ns: u32) -> Self {
        self.read_settle_ns = ns;
        self
    }

    /// Set the number of XTAL1 priming pulses
    pub fn with_priming_pulses(mut self, pulses: u32) -> Self {
        self.priming_pulses = pulses;
        self
    }

    /// Check every parameter against the target minimums
    pub fn validate(&self) -> Result<()> {
        let ok = self.power_settle_us >= MIN_POWER_SETTLE_US
            && self.prog_enable_settle_ns >= MIN_PROG_ENABLE_SETTLE_NS
            && self.vpp_settle_us >= MIN_VPP_SETTLE_US
            && self.exit_settle_us >= MIN_EXIT_SETTLE_US
            && self.strobe_ns > 0
            && self.priming_pulses >= MIN_PRIMING_PULSES;

        if ok {
            Ok(())
        } else {
            log::error!("timing below target minimum: {:?}", self);
            Err(Error::InvalidTiming)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert_eq!(Timing::default().validate(), Ok(()));
    }

    #[test]
    fn test_rejects_short_waits() {
        let t = Timing::default().with_power_settle_us(99);
        assert_eq!(t.validate(), Err(Error::InvalidTiming));

        let t = Timing::default().with_vpp_settle_us(10);
        assert_eq!(t.validate(), Err(Error::InvalidTiming));

        let t = Timing::default().with_exit_settle_us(999);
        assert_eq!(t.validate(), Err(Error::InvalidTiming));

        let t = Timing::default().with_strobe_ns(0);
        assert_eq!(t.validate(), Err(Error::InvalidTiming));

        let t = Timing::default().with_priming_pulses(5);
        assert_eq!(t.validate(), Err(Error::InvalidTiming));
    }

    #[test]
    fn test_longer_waits_are_fine() {
        let t = Timing::default()
            .with_power_settle_us(10_000)
            .with_exit_settle_us(5_000)
            .with_priming_pulses(10);
        assert_eq!(t.validate(), Ok(()));
    }
}
