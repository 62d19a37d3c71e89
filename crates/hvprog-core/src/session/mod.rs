//! Command session
//!
//! A [`Session`] owns the programmer backend and tracks what the target is
//! doing. It takes one command line at a time, drives the target through
//! the [`power`](crate::power) sequencer and the [`protocol`](crate::protocol)
//! engine, and writes the response lines to any [`core::fmt::Write`] sink.
//!
//! | From        | `enter`     | `exit` | `run`   |
//! |-------------|-------------|--------|---------|
//! | Idle        | Programming | error  | Running |
//! | Running     | Programming | Idle   | error   |
//! | Programming | error       | Idle   | Running |
//!
//! An `enter` that does not recognize the target falls back to the mode it
//! started from. `fuse` is only accepted in programming mode.

pub mod command;
pub mod response;

use core::fmt::{self, Write};

use crate::chip::{lookup, DeviceDescriptor};
use crate::error::{Error, Result};
use crate::fuse::{self, Comparison, Palette, Verdict};
use crate::power;
use crate::programmer::HvppMaster;
use crate::protocol;

use command::{parse, Command, FuseArg};
use response::{respond, Status};

/// Low fuse value written by `fuse low`
const FUSE_LOW_PLACEHOLDER: u8 = 0xE0;

/// What the controller is currently doing with the target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionMode {
    /// Target unpowered, all lines released
    #[default]
    Idle,
    /// Target powered and running its application
    Running,
    /// Target held in high-voltage programming mode
    Programming,
}

impl SessionMode {
    /// Lowercase name for logs
    pub const fn as_str(self) -> &'static str {
        match self {
            SessionMode::Idle => "idle",
            SessionMode::Running => "running",
            SessionMode::Programming => "programming",
        }
    }
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Command interpreter and target state machine
pub struct Session<M> {
    master: M,
    mode: SessionMode,
    target: Option<&'static DeviceDescriptor>,
    palette: Palette,
}

impl<M: HvppMaster> Session<M> {
    /// Create a session, releasing every line of the backend
    pub fn new(mut master: M) -> Self {
        master.release_all();
        Self {
            master,
            mode: SessionMode::Idle,
            target: None,
            palette: Palette::COLOR,
        }
    }

    /// Enable or disable ANSI colors in fuse output
    pub fn with_color(mut self, color: bool) -> Self {
        self.palette = Palette::new(color);
        self
    }

    /// Current mode
    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    /// Device recognized on entry into programming mode
    pub fn current_target(&self) -> Option<&'static DeviceDescriptor> {
        self.target
    }

    /// Borrow the backend
    pub fn master(&self) -> &M {
        &self.master
    }

    /// Mutably borrow the backend
    pub fn master_mut(&mut self) -> &mut M {
        &mut self.master
    }

    /// Consume the session and return the backend
    pub fn into_master(self) -> M {
        self.master
    }

    /// Execute one command line
    ///
    /// Every outcome, including rejected commands and backend failures, is
    /// reported as response lines. The only error returned is
    /// [`Error::Output`] when `out` itself fails.
    pub fn execute<W: Write + ?Sized>(&mut self, line: &str, out: &mut W) -> Result<()> {
        let command = match parse(line) {
            Ok(Some(command)) => command,
            Ok(None) => return Ok(()),
            Err(e) => {
                log::debug!("session: rejected line {:?}: {}", line.trim(), e);
                respond(out, Status::Error, format_args!("{}", e))?;
                return Ok(());
            }
        };

        log::debug!("session: {:?} in {} mode", command, self.mode);
        let result = match command {
            Command::Enter => self.cmd_enter(out),
            Command::Exit => self.cmd_exit(out),
            Command::Run => self.cmd_run(out),
            Command::Fuse(arg) => self.cmd_fuse(arg, out),
        };

        match result {
            Err(Error::Output) => Err(Error::Output),
            Err(e) => {
                log::warn!("session: command failed in {} mode: {}", self.mode, e);
                respond(out, Status::Error, format_args!("{}", e))?;
                Ok(())
            }
            Ok(()) => Ok(()),
        }
    }

    fn set_mode(&mut self, mode: SessionMode) {
        if self.mode != mode {
            log::debug!("session: {} -> {}", self.mode, mode);
        }
        self.mode = mode;
    }

    /// Put the target back into `mode` after an aborted entry
    fn restore_after_entry(&mut self, mode: SessionMode) {
        power::exit_programming(&mut self.master);
        if mode == SessionMode::Running {
            power::power_up(&mut self.master);
        }
    }

    fn cmd_enter<W: Write + ?Sized>(&mut self, out: &mut W) -> Result<()> {
        if self.mode == SessionMode::Programming {
            respond(
                out,
                Status::Error,
                format_args!("Already in programming mode"),
            )?;
            return Ok(());
        }

        // Fails only on timing validation, before any line is driven
        power::enter_programming(&mut self.master)?;

        let previous = self.mode;
        let signature = protocol::read_signature(&mut self.master);
        let device = lookup(signature);

        // Mode, target and power are settled before any response is written
        match device {
            Some(device) => {
                log::info!("session: found {} ({:06X})", device.name, signature);
                self.target = Some(device);
                self.set_mode(SessionMode::Programming);
            }
            None => {
                log::info!("session: unknown signature {:06X}", signature);
                self.restore_after_entry(previous);
            }
        }

        respond(out, Status::Signature, format_args!("{:06X}", signature))?;
        match device {
            Some(device) => {
                respond(out, Status::Device, format_args!("{}", device.name))?;
                respond(
                    out,
                    Status::Ok,
                    format_args!("Entered programming mode for device"),
                )?;
            }
            None => {
                let message = if previous == SessionMode::Running {
                    "Device not recognized, back to running mode"
                } else {
                    "Device not recognized, power down"
                };
                respond(out, Status::Error, format_args!("{}", message))?;
            }
        }
        Ok(())
    }

    fn cmd_exit<W: Write + ?Sized>(&mut self, out: &mut W) -> Result<()> {
        match self.mode {
            SessionMode::Idle => {
                respond(
                    out,
                    Status::Error,
                    format_args!("Not in programming or running mode"),
                )?;
            }
            SessionMode::Running => {
                power::power_down(&mut self.master);
                self.set_mode(SessionMode::Idle);
                respond(out, Status::Ok, format_args!("Power down"))?;
            }
            SessionMode::Programming => {
                power::exit_programming(&mut self.master);
                self.set_mode(SessionMode::Idle);
                respond(
                    out,
                    Status::Ok,
                    format_args!("Programming mode left, power down"),
                )?;
            }
        }
        self.target = None;
        Ok(())
    }

    fn cmd_run<W: Write + ?Sized>(&mut self, out: &mut W) -> Result<()> {
        match self.mode {
            SessionMode::Running => {
                respond(out, Status::Error, format_args!("Already in running mode"))?;
            }
            SessionMode::Idle => {
                power::power_up(&mut self.master);
                self.set_mode(SessionMode::Running);
                respond(out, Status::Ok, format_args!("Running"))?;
            }
            SessionMode::Programming => {
                power::exit_programming(&mut self.master);
                power::power_up(&mut self.master);
                self.set_mode(SessionMode::Running);
                respond(
                    out,
                    Status::Ok,
                    format_args!("Programming mode left, running"),
                )?;
            }
        }
        self.target = None;
        Ok(())
    }

    fn cmd_fuse<W: Write + ?Sized>(&mut self, arg: Option<&str>, out: &mut W) -> Result<()> {
        let device = match (self.mode, self.target) {
            (SessionMode::Programming, Some(device)) => device,
            _ => {
                respond(out, Status::Error, format_args!("Not in programming mode"))?;
                return Ok(());
            }
        };

        let Some(arg) = arg else {
            fuse::present(
                &mut self.master,
                device,
                Verdict::Inspect,
                self.palette,
                out,
            )?;
            return Ok(());
        };

        match FuseArg::from_keyword(arg) {
            Some(FuseArg::Reset) => self.fuse_reset(device, out),
            Some(FuseArg::Low) => {
                respond(
                    out,
                    Status::Status,
                    format_args!("Programming low fuse bits"),
                )?;
                protocol::program_fuse_low(&mut self.master, FUSE_LOW_PLACEHOLDER)?;
                respond(out, Status::Ok, format_args!("Done"))?;
                Ok(())
            }
            Some(other) => {
                respond(
                    out,
                    Status::Warning,
                    format_args!("Programming {} fuse bits is not implemented", other.keyword()),
                )?;
                Ok(())
            }
            None => {
                respond(
                    out,
                    Status::Error,
                    format_args!(
                        "Invalid argument '{}'; expected 'low', 'high', 'extended', 'lock' or 'reset'",
                        arg
                    ),
                )?;
                Ok(())
            }
        }
    }

    fn fuse_reset<W: Write + ?Sized>(
        &mut self,
        device: &'static DeviceDescriptor,
        out: &mut W,
    ) -> Result<()> {
        let before = fuse::present(
            &mut self.master,
            device,
            Verdict::PreReset,
            self.palette,
            out,
        )?;
        if before != Comparison::Differs {
            return Ok(());
        }

        respond(
            out,
            Status::Status,
            format_args!("Programming low fuse bits"),
        )?;
        protocol::program_fuse_low(&mut self.master, device.fuse_low)?;
        respond(
            out,
            Status::Status,
            format_args!("Programming high fuse bits"),
        )?;
        protocol::program_fuse_high(&mut self.master, device.fuse_high)?;
        if device.has_extended_fuse() {
            respond(
                out,
                Status::Status,
                format_args!("Programming extended fuse bits"),
            )?;
            protocol::program_fuse_extended(&mut self.master, device.fuse_extended)?;
        }

        let after = fuse::present(
            &mut self.master,
            device,
            Verdict::PostReset,
            self.palette,
            out,
        )?;
        if after == Comparison::Default {
            log::info!("session: fuses of {} restored to defaults", device.name);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::programmer::{Direction, Line, Timing};
    use std::string::String;

    /// Floating bus: every read returns 0xFF, RDY/BSY never changes
    struct Floating {
        timing: Timing,
        reads: usize,
        /// Line level and direction changes
        changes: usize,
    }

    impl Floating {
        fn new(timing: Timing) -> Self {
            Self {
                timing,
                reads: 0,
                changes: 0,
            }
        }
    }

    /// Sink that rejects every write
    struct Full;

    impl Write for Full {
        fn write_str(&mut self, _s: &str) -> fmt::Result {
            Err(fmt::Error)
        }
    }

    impl HvppMaster for Floating {
        fn set_direction(&mut self, _line: Line, _dir: Direction) {
            self.changes += 1;
        }
        fn set_line(&mut self, _line: Line, _high: bool) {
            self.changes += 1;
        }
        fn set_bus_direction(&mut self, _dir: Direction) {}
        fn write_bus(&mut self, _value: u8) {}
        fn read_bus(&mut self) -> u8 {
            self.reads += 1;
            0xFF
        }
        fn rdy_bsy(&mut self) -> Result<bool> {
            Ok(true)
        }
        fn timing(&self) -> &Timing {
            &self.timing
        }
        fn delay_us(&mut self, _us: u32) {}
        fn delay_ns(&mut self, _ns: u32) {}
    }

    fn session() -> Session<Floating> {
        Session::new(Floating::new(Timing::default()))
    }

    fn run(session: &mut Session<Floating>, line: &str) -> String {
        let mut out = String::new();
        session.execute(line, &mut out).unwrap();
        out
    }

    #[test]
    fn test_starts_idle() {
        let s = session();
        assert_eq!(s.mode(), SessionMode::Idle);
        assert!(s.current_target().is_none());
    }

    #[test]
    fn test_parse_errors_are_reported() {
        let mut s = session();
        assert_eq!(
            run(&mut s, "flash"),
            "error     \tUnrecognized command 'flash'\n"
        );
        assert_eq!(
            run(&mut s, "enter 1"),
            "error     \tCommand does not accept arguments\n"
        );
        assert_eq!(run(&mut s, ""), "");
        assert_eq!(s.mode(), SessionMode::Idle);
    }

    #[test]
    fn test_mode_errors() {
        let mut s = session();
        assert_eq!(
            run(&mut s, "exit"),
            "error     \tNot in programming or running mode\n"
        );
        assert_eq!(run(&mut s, "run"), "ok        \tRunning\n");
        assert_eq!(run(&mut s, "run"), "error     \tAlready in running mode\n");
        assert_eq!(s.mode(), SessionMode::Running);
        assert_eq!(run(&mut s, "exit"), "ok        \tPower down\n");
        assert_eq!(s.mode(), SessionMode::Idle);
    }

    #[test]
    fn test_fuse_needs_programming_mode() {
        let mut s = session();
        assert_eq!(run(&mut s, "fuse"), "error     \tNot in programming mode\n");
        assert_eq!(
            run(&mut s, "fuse whatever"),
            "error     \tNot in programming mode\n"
        );
        assert_eq!(s.master().reads, 0);
    }

    #[test]
    fn test_unknown_signature_falls_back() {
        let mut s = session();
        assert_eq!(
            run(&mut s, "enter"),
            "signature \tFFFFFF\nerror     \tDevice not recognized, power down\n"
        );
        assert_eq!(s.mode(), SessionMode::Idle);

        run(&mut s, "run");
        assert_eq!(
            run(&mut s, "enter"),
            "signature \tFFFFFF\nerror     \tDevice not recognized, back to running mode\n"
        );
        assert_eq!(s.mode(), SessionMode::Running);
        assert!(s.current_target().is_none());
    }

    #[test]
    fn test_invalid_timing_is_reported() {
        let mut s = Session::new(Floating::new(Timing::default().with_priming_pulses(1)));
        assert_eq!(
            run(&mut s, "enter"),
            "error     \tTiming below target minimum\n"
        );
        assert_eq!(s.mode(), SessionMode::Idle);
        assert_eq!(s.master().changes, 0);
        assert_eq!(s.into_master().reads, 0);
    }

    #[test]
    fn test_invalid_timing_keeps_target_running() {
        let mut s = Session::new(Floating::new(Timing::default().with_priming_pulses(1)));
        run(&mut s, "run");
        let changes = s.master().changes;

        assert_eq!(
            run(&mut s, "enter"),
            "error     \tTiming below target minimum\n"
        );
        assert_eq!(s.mode(), SessionMode::Running);
        assert_eq!(s.master().changes, changes);
    }

    #[test]
    fn test_failed_output_after_unknown_signature() {
        let mut s = session();
        run(&mut s, "run");

        assert_eq!(s.execute("enter", &mut Full), Err(Error::Output));
        assert_eq!(s.mode(), SessionMode::Running);
        assert!(s.current_target().is_none());
    }
}
