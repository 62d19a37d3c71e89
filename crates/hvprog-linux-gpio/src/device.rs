//! Linux GPIO high-voltage parallel programming backend
//!
//! This module provides the `LinuxGpioHvpp` struct that implements the
//! `HvppMaster` trait using Linux's GPIO character device interface
//! (gpiocdev). Every socket signal, including the eight data lines, is a
//! separate GPIO line on one chip.
//!
//! Line directions are changed by reconfiguring the whole request, so
//! the configuration is rebuilt from the cached levels and directions each
//! time. Power switching lines are always outputs.

use std::thread;
use std::time::Duration;

use gpiocdev::line::{Offset, Value};
use gpiocdev::request::{Config, Request};

use hvprog_core::error::{Error as CoreError, Result as CoreResult};
use hvprog_core::programmer::{Direction, HvppMaster, Line, Timing};

use crate::error::{LinuxGpioError, Result};

/// Programmer option key of each signal, in [`Line::ALL`] order
const LINE_KEYS: [&str; 12] = [
    "xa0", "xa1", "bs1", "bs2", "pagel", "xtal1", "wr", "oe", "rdy", "vcc", "vpp", "rst",
];

const DATA_KEYS: [&str; 8] = ["d0", "d1", "d2", "d3", "d4", "d5", "d6", "d7"];

fn level(high: bool) -> Value {
    if high {
        Value::Active
    } else {
        Value::Inactive
    }
}

fn is_power(line: Line) -> bool {
    Line::POWER.contains(&line)
}

/// Configuration for opening a Linux GPIO programmer
#[derive(Debug, Clone)]
pub struct LinuxGpioHvppConfig {
    /// Device path (e.g., "/dev/gpiochip0")
    pub device: String,
    /// Data bus line offsets, DATA0 first
    pub data: [Offset; 8],
    /// Signal line offsets, indexed by [`Line::index`]
    pub lines: [Offset; 12],
    /// Delays and pulse widths
    pub timing: Timing,
}

impl LinuxGpioHvppConfig {
    /// Create a configuration with default timing
    pub fn new(device: impl Into<String>, data: [Offset; 8], lines: [Offset; 12]) -> Self {
        Self {
            device: device.into(),
            data,
            lines,
            timing: Timing::default(),
        }
    }

    /// Set the timing parameters
    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    /// GPIO offset of a signal
    pub fn offset(&self, line: Line) -> Offset {
        self.lines[line.index()]
    }

    /// Check for a device path, distinct offsets and valid timing
    pub fn validate(&self) -> Result<()> {
        if self.device.is_empty() {
            return Err(LinuxGpioError::NoDevice);
        }

        let named = DATA_KEYS
            .iter()
            .zip(self.data.iter())
            .chain(LINE_KEYS.iter().zip(self.lines.iter()));
        let mut seen: Vec<(Offset, &'static str)> = Vec::with_capacity(20);
        for (&name, &offset) in named {
            if let Some(&(_, first)) = seen.iter().find(|(o, _)| *o == offset) {
                return Err(LinuxGpioError::DuplicateLine {
                    offset,
                    first,
                    second: name,
                });
            }
            seen.push((offset, name));
        }

        self.timing
            .validate()
            .map_err(LinuxGpioError::InvalidTiming)
    }
}

/// Linux GPIO high-voltage parallel programmer
pub struct LinuxGpioHvpp {
    /// GPIO line request handle
    request: Request,
    data: [Offset; 8],
    lines: [Offset; 12],
    levels: [bool; 12],
    directions: [Direction; 12],
    bus: u8,
    bus_direction: Direction,
    timing: Timing,
    /// Set once any line operation failed
    faulted: bool,
}

impl LinuxGpioHvpp {
    /// Open the GPIO chip and claim every line
    ///
    /// All signals start as inputs and all power switches off.
    pub fn open(config: &LinuxGpioHvppConfig) -> Result<Self> {
        config.validate()?;

        log::debug!("linux_gpio_hvpp: Opening device {}", config.device);

        let mut directions = [Direction::Input; 12];
        for line in Line::POWER {
            directions[line.index()] = Direction::Output;
        }

        let gpio = Self::build_config(
            &config.data,
            &config.lines,
            &[false; 12],
            &directions,
            0,
            Direction::Input,
        );
        let request = Request::from_config(gpio)
            .on_chip(&config.device)
            .with_consumer("hvprog")
            .request()
            .map_err(|source| LinuxGpioError::LineRequestFailed {
                path: config.device.clone(),
                source,
            })?;

        log::info!(
            "linux_gpio_hvpp: Opened {} (data={:?}, xa0={}, xa1={}, bs1={}, bs2={}, pagel={}, \
             xtal1={}, wr={}, oe={}, rdy={}, vcc={}, vpp={}, rst={})",
            config.device,
            config.data,
            config.offset(Line::Xa0),
            config.offset(Line::Xa1),
            config.offset(Line::Bs1),
            config.offset(Line::Bs2),
            config.offset(Line::Pagel),
            config.offset(Line::Xtal1),
            config.offset(Line::Wr),
            config.offset(Line::Oe),
            config.offset(Line::RdyBsy),
            config.offset(Line::Vcc),
            config.offset(Line::Vpp),
            config.offset(Line::ResetPull),
        );

        Ok(Self {
            request,
            data: config.data,
            lines: config.lines,
            levels: [false; 12],
            directions,
            bus: 0,
            bus_direction: Direction::Input,
            timing: config.timing,
            faulted: false,
        })
    }

    fn build_config(
        data: &[Offset; 8],
        lines: &[Offset; 12],
        levels: &[bool; 12],
        directions: &[Direction; 12],
        bus: u8,
        bus_direction: Direction,
    ) -> Config {
        let mut cfg = Config::default();
        for (bit, &offset) in data.iter().enumerate() {
            match bus_direction {
                Direction::Output => cfg.with_line(offset).as_output(level(bus & (1 << bit) != 0)),
                Direction::Input => cfg.with_line(offset).as_input(),
            };
        }
        for line in Line::ALL {
            let i = line.index();
            match directions[i] {
                Direction::Output => cfg.with_line(lines[i]).as_output(level(levels[i])),
                Direction::Input => cfg.with_line(lines[i]).as_input(),
            };
        }
        cfg
    }

    fn reconfigure(&mut self) {
        let cfg = Self::build_config(
            &self.data,
            &self.lines,
            &self.levels,
            &self.directions,
            self.bus,
            self.bus_direction,
        );
        if let Err(e) = self.request.reconfigure(&cfg) {
            log::error!("linux_gpio_hvpp: Failed to reconfigure lines: {}", e);
            self.faulted = true;
        }
    }

    fn drive(&mut self, offset: Offset, high: bool, name: &str) {
        if let Err(e) = self.request.set_value(offset, level(high)) {
            log::error!("linux_gpio_hvpp: Failed to set {}: {}", name, e);
            self.faulted = true;
        }
    }

    fn sample(&mut self, offset: Offset, name: &str) -> Option<bool> {
        match self.request.value(offset) {
            Ok(Value::Active) => Some(true),
            Ok(Value::Inactive) => Some(false),
            Err(e) => {
                log::error!("linux_gpio_hvpp: Failed to get {}: {}", name, e);
                self.faulted = true;
                None
            }
        }
    }
}

impl HvppMaster for LinuxGpioHvpp {
    fn set_direction(&mut self, line: Line, dir: Direction) {
        if is_power(line) {
            return;
        }
        let i = line.index();
        if self.directions[i] != dir {
            self.directions[i] = dir;
            self.reconfigure();
        }
    }

    fn set_line(&mut self, line: Line, high: bool) {
        let i = line.index();
        self.levels[i] = high;
        if self.directions[i] == Direction::Output {
            self.drive(self.lines[i], high, line.name());
        }
    }

    fn set_bus_direction(&mut self, dir: Direction) {
        if self.bus_direction != dir {
            self.bus_direction = dir;
            self.reconfigure();
        }
    }

    fn write_bus(&mut self, value: u8) {
        self.bus = value;
        if self.bus_direction == Direction::Output {
            for bit in 0..8 {
                self.drive(self.data[bit], value & (1 << bit) != 0, DATA_KEYS[bit]);
            }
        }
    }

    fn read_bus(&mut self) -> u8 {
        let mut value = 0u8;
        for bit in 0..8 {
            if self.sample(self.data[bit], DATA_KEYS[bit]) == Some(true) {
                value |= 1 << bit;
            }
        }
        value
    }

    fn rdy_bsy(&mut self) -> CoreResult<bool> {
        if self.faulted {
            return Err(CoreError::Io);
        }
        if self.directions[Line::RdyBsy.index()] == Direction::Output {
            return Ok(self.levels[Line::RdyBsy.index()]);
        }
        self.sample(self.lines[Line::RdyBsy.index()], Line::RdyBsy.name())
            .ok_or(CoreError::Io)
    }

    fn timing(&self) -> &Timing {
        &self.timing
    }

    fn delay_us(&mut self, us: u32) {
        thread::sleep(Duration::from_micros(u64::from(us)));
    }

    fn delay_ns(&mut self, ns: u32) {
        thread::sleep(Duration::from_nanos(u64::from(ns)));
    }
}

impl Drop for LinuxGpioHvpp {
    fn drop(&mut self) {
        log::debug!("linux_gpio_hvpp: Releasing lines");
        self.release_all();
    }
}

fn parse_offset(key: &str, value: &str) -> Result<Offset> {
    value
        .parse()
        .map_err(|_| LinuxGpioError::InvalidParameter(format!("{}={}", key, value)))
}

fn parse_u32(key: &str, value: &str) -> Result<u32> {
    value
        .parse()
        .map_err(|_| LinuxGpioError::InvalidParameter(format!("{}={}", key, value)))
}

/// Parse programmer options into a configuration
///
/// # Options
///
/// - `dev=/dev/gpiochip0` or `gpiochip=0` - GPIO chip (exactly one)
/// - `data=<n>` - DATA0..DATA7 on lines n..n+7
/// - `d0=<n>` .. `d7=<n>` - individual data lines, override `data`
/// - `xa0`, `xa1`, `bs1`, `bs2`, `pagel`, `xtal1`, `wr`, `oe`, `rdy` -
///   control and status lines
/// - `vcc`, `vpp`, `rst` - 5V enable, 12V enable and reset pull switches
/// - `strobe_ns`, `read_settle_ns`, `power_settle_us` - timing overrides
pub fn parse_options(options: &[(&str, &str)]) -> Result<LinuxGpioHvppConfig> {
    let mut device = String::new();
    let mut gpiochip: Option<u32> = None;
    let mut data_base: Option<Offset> = None;
    let mut data: [Option<Offset>; 8] = [None; 8];
    let mut lines: [Option<Offset>; 12] = [None; 12];
    let mut timing = Timing::default();

    for &(key, value) in options {
        if let Some(i) = LINE_KEYS.iter().position(|k| *k == key) {
            lines[i] = Some(parse_offset(key, value)?);
            continue;
        }
        if let Some(bit) = DATA_KEYS.iter().position(|k| *k == key) {
            data[bit] = Some(parse_offset(key, value)?);
            continue;
        }
        match key {
            "dev" => device = value.to_string(),
            "gpiochip" => gpiochip = Some(parse_u32(key, value)?),
            "data" => data_base = Some(parse_offset(key, value)?),
            "strobe_ns" => timing = timing.with_strobe_ns(parse_u32(key, value)?),
            "read_settle_ns" => timing = timing.with_read_settle_ns(parse_u32(key, value)?),
            "power_settle_us" => timing = timing.with_power_settle_us(parse_u32(key, value)?),
            _ => log::warn!("linux_gpio_hvpp: Unknown option: {}={}", key, value),
        }
    }

    // Handle dev vs gpiochip
    if device.is_empty() {
        match gpiochip {
            Some(n) => device = format!("/dev/gpiochip{}", n),
            None => return Err(LinuxGpioError::NoDevice),
        }
    } else if gpiochip.is_some() {
        return Err(LinuxGpioError::InvalidParameter(
            "only one of 'dev' or 'gpiochip' can be specified".to_string(),
        ));
    }

    let mut data_offsets = [0; 8];
    for bit in 0..8 {
        data_offsets[bit] = match (data[bit], data_base) {
            (Some(offset), _) => offset,
            (None, Some(base)) => base + bit as Offset,
            (None, None) => return Err(LinuxGpioError::MissingParameter("data (or d0..d7)")),
        };
    }

    let mut line_offsets = [0; 12];
    for (i, offset) in lines.iter().enumerate() {
        line_offsets[i] = offset.ok_or(LinuxGpioError::MissingParameter(LINE_KEYS[i]))?;
    }

    let config = LinuxGpioHvppConfig::new(device, data_offsets, line_offsets).with_timing(timing);
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    const WIRING: [(&str, &str); 13] = [
        ("data", "2"),
        ("xa0", "10"),
        ("xa1", "11"),
        ("bs1", "12"),
        ("bs2", "13"),
        ("pagel", "14"),
        ("xtal1", "15"),
        ("wr", "16"),
        ("oe", "17"),
        ("rdy", "18"),
        ("vcc", "19"),
        ("vpp", "20"),
        ("rst", "21"),
    ];

    /// `WIRING` followed by `extra`; a repeated key keeps its last value
    fn with(extra: &[(&'static str, &'static str)]) -> Vec<(&'static str, &'static str)> {
        WIRING.iter().chain(extra.iter()).copied().collect()
    }

    #[test]
    fn test_parse_full_wiring() {
        let config = parse_options(&with(&[("dev", "/dev/gpiochip1")])).unwrap();
        assert_eq!(config.device, "/dev/gpiochip1");
        assert_eq!(config.data, [2, 3, 4, 5, 6, 7, 8, 9]);
        assert_eq!(config.offset(Line::Xa0), 10);
        assert_eq!(config.offset(Line::RdyBsy), 18);
        assert_eq!(config.offset(Line::ResetPull), 21);
        assert_eq!(config.timing, Timing::default());
    }

    #[test]
    fn test_gpiochip_number() {
        let config = parse_options(&with(&[("gpiochip", "0")])).unwrap();
        assert_eq!(config.device, "/dev/gpiochip0");
    }

    #[test]
    fn test_individual_data_lines_override() {
        let config = parse_options(&with(&[("gpiochip", "0"), ("d7", "30")])).unwrap();
        assert_eq!(config.data, [2, 3, 4, 5, 6, 7, 8, 30]);
    }

    #[test]
    fn test_timing_options() {
        let config = parse_options(&with(&[
            ("gpiochip", "0"),
            ("strobe_ns", "2000"),
            ("power_settle_us", "500"),
        ]))
        .unwrap();
        assert_eq!(config.timing.strobe_ns, 2000);
        assert_eq!(config.timing.power_settle_us, 500);

        let err = parse_options(&with(&[("gpiochip", "0"), ("power_settle_us", "10")]));
        assert!(matches!(err, Err(LinuxGpioError::InvalidTiming(_))));
    }

    #[test]
    fn test_missing_device() {
        assert!(matches!(
            parse_options(&WIRING),
            Err(LinuxGpioError::NoDevice)
        ));
    }

    #[test]
    fn test_dev_and_gpiochip_conflict() {
        let result = parse_options(&with(&[("dev", "/dev/gpiochip0"), ("gpiochip", "0")]));
        assert!(matches!(result, Err(LinuxGpioError::InvalidParameter(_))));
    }

    #[test]
    fn test_missing_line() {
        let options: Vec<_> = with(&[("gpiochip", "0")])
            .into_iter()
            .filter(|(k, _)| *k != "vpp")
            .collect();
        assert!(matches!(
            parse_options(&options),
            Err(LinuxGpioError::MissingParameter("vpp"))
        ));
    }

    #[test]
    fn test_invalid_offset() {
        let result = parse_options(&with(&[("gpiochip", "0"), ("wr", "x")]));
        assert!(matches!(result, Err(LinuxGpioError::InvalidParameter(_))));
    }

    #[test]
    fn test_later_option_wins() {
        let options = with(&[("gpiochip", "0"), ("oe", "22"), ("oe", "23")]);
        let config = parse_options(&options).unwrap();
        assert_eq!(config.offset(Line::Oe), 23);
    }

    #[test]
    fn test_duplicate_offset() {
        // DATA0..7 occupy 2..9, so oe=5 collides with d3
        let result = parse_options(&with(&[("gpiochip", "0"), ("oe", "5")]));
        match result {
            Err(LinuxGpioError::DuplicateLine {
                offset,
                first,
                second,
            }) => {
                assert_eq!(offset, 5);
                assert_eq!(first, "d3");
                assert_eq!(second, "oe");
            }
            other => panic!("unexpected result: {:?}", other.map(|c| c.device)),
        }
    }
}
