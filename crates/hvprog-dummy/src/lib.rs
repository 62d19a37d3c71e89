//! hvprog-dummy - Simulated AVR target for testing
//!
//! This crate provides an [`HvppMaster`] whose "socket" holds an in-memory
//! AVR. The simulated part decodes the electrical sequence it is given, the
//! same way silicon would: it only enters programming mode when the entry
//! sequence meets the minimum waits, latches command, address and data
//! bytes on XTAL1 rising edges, executes writes on WR falling edges and
//! answers reads while OE is low. Delays are recorded, not slept.
//!
//! Writes keep RDY/BSY low for a configurable number of polls. In hang mode
//! a write never completes and polling eventually fails with
//! [`Error::TargetTimeout`].

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

mod config;
#[cfg(all(test, feature = "std"))]
mod scenarios;

#[cfg(feature = "alloc")]
pub use config::parse_options;
pub use config::{DummyConfig, DEFAULT_SIGNATURE};

#[cfg(feature = "alloc")]
use alloc::{vec, vec::Vec};

use hvprog_core::chip::FuseLockSnapshot;
use hvprog_core::error::{Error, Result};
use hvprog_core::programmer::{
    Direction, HvppMaster, Line, Timing, MIN_EXIT_SETTLE_US, MIN_POWER_SETTLE_US,
    MIN_PRIMING_PULSES, MIN_PROG_ENABLE_SETTLE_NS, MIN_VPP_SETTLE_US,
};
use hvprog_core::protocol::opcodes;

/// Flash size of the simulated part in words
pub const FLASH_WORDS: usize = 0x1_0000;

/// Electrical state of the simulated target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetState {
    /// No supply
    Off,
    /// Supplied, RESET held
    Reset,
    /// Supplied and running its application
    Running,
    /// In high-voltage programming mode
    Programming,
}

/// A timing requirement the simulated target saw broken
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    /// 12V applied too soon after VCC
    PowerSettle,
    /// Too few XTAL1 pulses while RESET was held
    PrimingPulses,
    /// Prog_enable pattern missing or not yet stable when 12V arrived
    ProgEnable,
    /// Command loaded too soon after 12V
    VppSettle,
    /// VCC removed too soon after 12V
    ExitSettle,
}

/// Simulated AVR behind a high-voltage parallel programming socket
#[cfg(feature = "alloc")]
pub struct DummyAvr {
    config: DummyConfig,
    fuses: FuseLockSnapshot,
    flash: Vec<u16>,

    levels: [bool; 12],
    directions: [Direction; 12],
    bus: u8,
    bus_direction: Direction,

    state: TargetState,
    now_ns: u64,
    vcc_on_at: u64,
    vpp_on_at: u64,
    vpp_off_at: Option<u64>,
    pattern_since: Option<u64>,
    priming: u32,

    command: u8,
    address: u16,
    data: u8,

    busy_polls: u32,
    hung: bool,
    last_ready: bool,
    unchanged_polls: u32,

    violations: Vec<Violation>,
    bus_reads: usize,
    wr_strobes: usize,
    writes: usize,
}

#[cfg(feature = "alloc")]
impl DummyAvr {
    /// Create a simulated target with the given configuration
    pub fn new(config: DummyConfig) -> Self {
        Self {
            fuses: config.fuses,
            config,
            flash: vec![0xFFFF; FLASH_WORDS],
            levels: [false; 12],
            directions: [Direction::Input; 12],
            bus: 0,
            bus_direction: Direction::Input,
            state: TargetState::Off,
            now_ns: 0,
            vcc_on_at: 0,
            vpp_on_at: 0,
            vpp_off_at: None,
            pattern_since: Some(0),
            priming: 0,
            command: 0,
            address: 0,
            data: 0,
            busy_polls: 0,
            hung: false,
            last_ready: true,
            unchanged_polls: 0,
            violations: Vec::new(),
            bus_reads: 0,
            wr_strobes: 0,
            writes: 0,
        }
    }

    /// Create a simulated ATmega328P at factory defaults
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Get the configuration
    pub fn config(&self) -> &DummyConfig {
        &self.config
    }

    /// Current fuse and lock bytes
    pub fn fuses(&self) -> FuseLockSnapshot {
        self.fuses
    }

    /// Overwrite the fuse and lock bytes
    pub fn set_fuses(&mut self, fuses: FuseLockSnapshot) {
        self.fuses = fuses;
    }

    /// Flash contents, one entry per word
    pub fn flash(&self) -> &[u16] {
        &self.flash
    }

    /// Mutable flash contents
    pub fn flash_mut(&mut self) -> &mut [u16] {
        &mut self.flash
    }

    /// Electrical state of the target
    pub fn state(&self) -> TargetState {
        self.state
    }

    /// Timing violations seen so far
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Number of data bus samples taken
    pub fn bus_reads(&self) -> usize {
        self.bus_reads
    }

    /// Number of WR falling edges while WR was driven
    pub fn wr_strobes(&self) -> usize {
        self.wr_strobes
    }

    /// Number of writes (fuse programming, chip erase) executed
    pub fn writes(&self) -> usize {
        self.writes
    }

    /// Simulated time elapsed, in nanoseconds
    pub fn elapsed_ns(&self) -> u64 {
        self.now_ns
    }

    /// Current level of a line
    pub fn level(&self, line: Line) -> bool {
        self.levels[line.index()]
    }

    /// Current direction of a line
    pub fn direction(&self, line: Line) -> Direction {
        self.directions[line.index()]
    }

    /// Current direction of the data bus
    pub fn bus_direction(&self) -> Direction {
        self.bus_direction
    }

    /// Whether the programmer drives nothing and supplies nothing
    pub fn is_released(&self) -> bool {
        self.bus_direction == Direction::Input
            && Line::CONTROL
                .iter()
                .chain(core::iter::once(&Line::RdyBsy))
                .all(|&line| self.direction(line) == Direction::Input)
            && Line::POWER.iter().all(|&line| !self.level(line))
    }

    fn is_output(&self, line: Line) -> bool {
        self.direction(line) == Direction::Output
    }

    fn violate(&mut self, violation: Violation) {
        log::warn!("dummy: {:?} at {} ns", violation, self.now_ns);
        self.violations.push(violation);
    }

    fn held_state(&self) -> TargetState {
        if !self.level(Line::Vcc) {
            TargetState::Off
        } else if self.level(Line::ResetPull) || self.level(Line::Vpp) {
            TargetState::Reset
        } else {
            TargetState::Running
        }
    }

    fn update_pattern(&mut self) {
        let valid = !self.level(Line::Pagel)
            && !self.level(Line::Xa1)
            && !self.level(Line::Xa0)
            && !self.level(Line::Bs1);
        if !valid {
            self.pattern_since = None;
        } else if self.pattern_since.is_none() {
            self.pattern_since = Some(self.now_ns);
        }
    }

    fn power_changed(&mut self, line: Line, high: bool) {
        match (line, high) {
            (Line::Vcc, true) => {
                self.vcc_on_at = self.now_ns;
                self.priming = 0;
            }
            (Line::Vcc, false) => {
                if let Some(off) = self.vpp_off_at.take() {
                    if self.now_ns - off < u64::from(MIN_EXIT_SETTLE_US) * 1000 {
                        self.violate(Violation::ExitSettle);
                    }
                }
                self.busy_polls = 0;
                self.hung = false;
            }
            (Line::Vpp, true) => {
                if self.try_enter() {
                    return;
                }
            }
            (Line::Vpp, false) => {
                if self.state == TargetState::Programming {
                    log::debug!("dummy: left programming mode");
                    self.vpp_off_at = Some(self.now_ns);
                }
            }
            _ => {
                if self.state == TargetState::Programming {
                    return;
                }
            }
        }
        self.state = self.held_state();
    }

    fn try_enter(&mut self) -> bool {
        if self.state == TargetState::Off || !self.level(Line::Vcc) {
            return false;
        }

        let mut ok = true;
        if self.now_ns - self.vcc_on_at < u64::from(MIN_POWER_SETTLE_US) * 1000 {
            self.violate(Violation::PowerSettle);
            ok = false;
        }
        if self.priming < MIN_PRIMING_PULSES {
            self.violate(Violation::PrimingPulses);
            ok = false;
        }
        let settled = self
            .pattern_since
            .map(|since| self.now_ns - since >= u64::from(MIN_PROG_ENABLE_SETTLE_NS))
            .unwrap_or(false);
        if !settled {
            self.violate(Violation::ProgEnable);
            ok = false;
        }

        if ok {
            log::debug!("dummy: entered programming mode");
            self.state = TargetState::Programming;
            self.vpp_on_at = self.now_ns;
            self.command = 0;
            self.address = 0;
            self.data = 0;
        }
        ok
    }

    fn xtal1_rising(&mut self) {
        match self.state {
            TargetState::Reset => {
                if self.level(Line::ResetPull) && !self.level(Line::Vpp) {
                    self.priming += 1;
                }
            }
            TargetState::Programming => {
                if self.now_ns - self.vpp_on_at < u64::from(MIN_VPP_SETTLE_US) * 1000 {
                    self.violate(Violation::VppSettle);
                    return;
                }
                self.latch();
            }
            _ => {}
        }
    }

    fn latch(&mut self) {
        let value = match self.bus_direction {
            Direction::Output => self.bus,
            Direction::Input => 0xFF,
        };
        let bs1 = self.level(Line::Bs1);
        match (self.level(Line::Xa1), self.level(Line::Xa0)) {
            (true, false) => {
                log::trace!("dummy: command {:02X}", value);
                self.command = value;
            }
            (false, false) if bs1 => {
                self.address = (self.address & 0x00FF) | (u16::from(value) << 8)
            }
            (false, false) => self.address = (self.address & 0xFF00) | u16::from(value),
            // High data bytes only matter for flash page loads
            (false, true) if bs1 => {}
            (false, true) => self.data = value,
            (true, true) => {}
        }
    }

    fn wr_falling(&mut self) {
        self.wr_strobes += 1;
        if self.state != TargetState::Programming {
            return;
        }
        if self.hung || self.busy_polls > 0 {
            log::warn!("dummy: WR strobed while busy, ignored");
            return;
        }

        match self.command {
            opcodes::WRITE_FUSE => {
                let index = match (self.level(Line::Bs2), self.level(Line::Bs1)) {
                    (false, false) => 0,
                    (false, true) => 1,
                    (true, false) => 2,
                    (true, true) => {
                        log::warn!("dummy: fuse write with BS2/BS1 = 11 ignored");
                        return;
                    }
                };
                log::debug!("dummy: fuse byte {} <- {:02X}", index, self.data);
                self.fuses.0[index] = self.data;
            }
            opcodes::CHIP_ERASE => {
                log::debug!("dummy: chip erase");
                self.fuses.0[3] = 0xFF;
                self.flash.fill(0xFFFF);
            }
            other => {
                log::warn!("dummy: WR with command {:02X} ignored", other);
                return;
            }
        }

        self.writes += 1;
        self.unchanged_polls = 0;
        if self.config.hang {
            self.hung = true;
        } else {
            self.busy_polls = self.config.busy_polls.max(1);
        }
    }

    fn output_byte(&self) -> u8 {
        if self.state != TargetState::Programming || self.level(Line::Oe) {
            return 0xFF;
        }

        let bs1 = self.level(Line::Bs1);
        match self.command {
            opcodes::READ_SIGNATURE if !bs1 => match self.address & 0xFF {
                0 => (self.config.signature >> 16) as u8,
                1 => (self.config.signature >> 8) as u8,
                2 => self.config.signature as u8,
                _ => 0xFF,
            },
            opcodes::READ_FUSE_LOCK => match (self.level(Line::Bs2), bs1) {
                (false, false) => self.fuses.low(),
                (true, true) => self.fuses.high(),
                (true, false) => self.fuses.extended(),
                (false, true) => self.fuses.lock(),
            },
            opcodes::READ_FLASH => {
                let word = self.flash[usize::from(self.address)];
                if bs1 {
                    (word >> 8) as u8
                } else {
                    word as u8
                }
            }
            _ => 0xFF,
        }
    }
}

#[cfg(feature = "alloc")]
impl HvppMaster for DummyAvr {
    fn set_direction(&mut self, line: Line, dir: Direction) {
        self.directions[line.index()] = dir;
    }

    fn set_line(&mut self, line: Line, high: bool) {
        let index = line.index();
        if self.levels[index] == high {
            return;
        }
        self.levels[index] = high;

        match line {
            Line::Vcc | Line::Vpp | Line::ResetPull => self.power_changed(line, high),
            Line::Xtal1 if high && self.is_output(line) => self.xtal1_rising(),
            Line::Wr if !high && self.is_output(line) => self.wr_falling(),
            Line::Pagel | Line::Xa1 | Line::Xa0 | Line::Bs1 => self.update_pattern(),
            _ => {}
        }
    }

    fn set_bus_direction(&mut self, dir: Direction) {
        self.bus_direction = dir;
    }

    fn write_bus(&mut self, value: u8) {
        self.bus = value;
    }

    fn read_bus(&mut self) -> u8 {
        self.bus_reads += 1;
        match self.bus_direction {
            Direction::Output => self.bus,
            Direction::Input => self.output_byte(),
        }
    }

    fn rdy_bsy(&mut self) -> Result<bool> {
        if self.is_output(Line::RdyBsy) {
            return Ok(self.level(Line::RdyBsy));
        }

        let ready = match self.state {
            TargetState::Off => false,
            _ if self.hung => false,
            _ if self.busy_polls > 0 => {
                self.busy_polls -= 1;
                false
            }
            _ => true,
        };

        if ready == self.last_ready {
            self.unchanged_polls += 1;
            if self.unchanged_polls > self.config.poll_limit {
                log::warn!(
                    "dummy: RDY/BSY stuck {} after {} polls",
                    if ready { "high" } else { "low" },
                    self.unchanged_polls
                );
                return Err(Error::TargetTimeout);
            }
        } else {
            self.last_ready = ready;
            self.unchanged_polls = 0;
        }
        Ok(ready)
    }

    fn timing(&self) -> &Timing {
        &self.config.timing
    }

    fn delay_us(&mut self, us: u32) {
        self.now_ns += u64::from(us) * 1000;
    }

    fn delay_ns(&mut self, ns: u32) {
        self.now_ns += u64::from(ns);
    }
}
