//! Simulated target configuration

#[cfg(feature = "alloc")]
use alloc::{format, string::String};

use hvprog_core::chip::{DeviceDescriptor, FuseLockSnapshot};
use hvprog_core::programmer::Timing;

/// Signature of the default simulated part (ATmega328P)
pub const DEFAULT_SIGNATURE: u32 = 0x1E950F;

/// Configuration for the simulated target
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Signature bytes returned by the signature read
    pub signature: u32,
    /// Fuse and lock bytes at power on
    pub fuses: FuseLockSnapshot,
    /// Number of RDY/BSY polls a write keeps the target busy (at least 1)
    pub busy_polls: u32,
    /// Never finish a write
    pub hang: bool,
    /// Consecutive polls of an unchanged RDY/BSY before giving up
    pub poll_limit: u32,
    /// Timing reported to the protocol layer
    pub timing: Timing,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            signature: DEFAULT_SIGNATURE,
            fuses: FuseLockSnapshot::new(0x62, 0xD9, 0xFF, 0xFF),
            busy_polls: 3,
            hang: false,
            poll_limit: 10_000,
            timing: Timing::default(),
        }
    }
}

impl DummyConfig {
    /// Simulate `device` with its fuses at factory defaults
    pub fn for_device(device: &DeviceDescriptor) -> Self {
        Self {
            signature: device.signature,
            fuses: device.defaults(),
            ..Self::default()
        }
    }

    /// Set the signature
    pub fn with_signature(mut self, signature: u32) -> Self {
        self.signature = signature;
        self
    }

    /// Set the initial fuse and lock bytes
    pub fn with_fuses(mut self, fuses: FuseLockSnapshot) -> Self {
        self.fuses = fuses;
        self
    }

    /// Set how long writes keep the target busy
    pub fn with_busy_polls(mut self, polls: u32) -> Self {
        self.busy_polls = polls;
        self
    }

    /// Make every write hang
    pub fn with_hang(mut self, hang: bool) -> Self {
        self.hang = hang;
        self
    }

    /// Set the poll limit
    pub fn with_poll_limit(mut self, limit: u32) -> Self {
        self.poll_limit = limit;
        self
    }
}

#[cfg(feature = "alloc")]
fn parse_hex<T>(
    key: &str,
    value: &str,
    parse: fn(&str, u32) -> Result<T, core::num::ParseIntError>,
) -> Result<T, String> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    parse(digits, 16).map_err(|_| format!("invalid hex value for {}: '{}'", key, value))
}

#[cfg(feature = "alloc")]
fn parse_bool(key: &str, value: &str) -> Result<bool, String> {
    match value {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(format!("invalid boolean for {}: '{}'", key, value)),
    }
}

/// Build a configuration from programmer options
///
/// Recognized keys:
/// - `device=<name>` - simulate a database part at factory defaults
/// - `signature=<hex>` - override the signature
/// - `low=`, `high=`, `extended=`, `lock=` `<hex>` - initial byte values
/// - `busy=<polls>` - busy time of a write
/// - `hang=<bool>` - never finish writes
/// - `poll_limit=<n>` - polls before RDY/BSY is reported stuck
///
/// Options apply in order, so byte values given after `device=` override
/// its defaults.
#[cfg(feature = "alloc")]
pub fn parse_options(options: &[(&str, &str)]) -> Result<DummyConfig, String> {
    let mut config = DummyConfig::default();

    for &(key, value) in options {
        match key {
            "device" => {
                let device = hvprog_core::chip::find_by_name(value)
                    .ok_or_else(|| format!("unknown device '{}'", value))?;
                config = DummyConfig {
                    busy_polls: config.busy_polls,
                    hang: config.hang,
                    poll_limit: config.poll_limit,
                    ..DummyConfig::for_device(device)
                };
            }
            "signature" => {
                config.signature = parse_hex(key, value, u32::from_str_radix)?;
                if config.signature > 0xFF_FFFF {
                    return Err(format!("signature out of range: '{}'", value));
                }
            }
            "low" => config.fuses.0[0] = parse_hex(key, value, u8::from_str_radix)?,
            "high" => config.fuses.0[1] = parse_hex(key, value, u8::from_str_radix)?,
            "extended" => config.fuses.0[2] = parse_hex(key, value, u8::from_str_radix)?,
            "lock" => config.fuses.0[3] = parse_hex(key, value, u8::from_str_radix)?,
            "busy" => {
                config.busy_polls = value
                    .parse()
                    .map_err(|_| format!("invalid busy poll count: '{}'", value))?;
            }
            "hang" => config.hang = parse_bool(key, value)?,
            "poll_limit" => {
                config.poll_limit = value
                    .parse()
                    .map_err(|_| format!("invalid poll limit: '{}'", value))?;
            }
            _ => return Err(format!("unknown option '{}'", key)),
        }
    }

    Ok(config)
}
