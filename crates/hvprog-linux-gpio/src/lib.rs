//! hvprog-linux-gpio - Linux GPIO high-voltage parallel programmer
//!
//! This crate drives an AVR high-voltage parallel programming socket from
//! plain GPIO lines using the Linux character device GPIO interface
//! (gpiocdev). It needs twenty lines on one chip: the eight data lines,
//! nine control/status lines and three power switch enables.
//!
//! # Example
//!
//! ```no_run
//! use hvprog_core::protocol::hvpp;
//! use hvprog_core::power;
//! use hvprog_linux_gpio::{LinuxGpioHvpp, LinuxGpioHvppConfig};
//!
//! let config = LinuxGpioHvppConfig::new(
//!     "/dev/gpiochip0",
//!     [2, 3, 4, 5, 6, 7, 8, 9],
//!     [10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21],
//! );
//! let mut gpio = LinuxGpioHvpp::open(&config)?;
//!
//! power::enter_programming(&mut gpio)?;
//! println!("Signature: {:06X}", hvpp::read_signature(&mut gpio));
//! power::exit_programming(&mut gpio);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Usage with hvprog CLI
//!
//! ```bash
//! hvprog console -p linux_gpio:gpiochip=0,data=2,xa0=10,xa1=11,bs1=12,bs2=13,pagel=14,xtal1=15,wr=16,oe=17,rdy=18,vcc=19,vpp=20,rst=21
//! ```
//!
//! # Wiring
//!
//! | Target pin | Option  | Direction |
//! |------------|---------|-----------|
//! | DATA0..7   | `data` or `d0`..`d7` | bidirectional |
//! | XA0, XA1, BS1, BS2, PAGEL, XTAL1 | `xa0` .. `xtal1` | output |
//! | WR, OE     | `wr`, `oe` | output, active low |
//! | RDY/BSY    | `rdy`   | input |
//! | VCC switch | `vcc`   | output, high = 5V on |
//! | 12V switch | `vpp`   | output, high = 12V on RESET |
//! | RESET pull | `rst`   | output, high = RESET held at 0V |
//!
//! The 12V and reset pull switches must never both be on; the power
//! sequencer never requests it, but the driver circuit should make it
//! impossible as well.
//!
//! # System Requirements
//!
//! - Linux kernel 4.8+ with GPIO character device support (kernel 5.5+ for v2 API)
//! - Access to `/dev/gpiochipN` devices (may require root or udev rules)

pub mod device;
pub mod error;

// Re-exports
pub use device::{parse_options, LinuxGpioHvpp, LinuxGpioHvppConfig};
pub use error::{LinuxGpioError, Result};

/// Open a Linux GPIO programmer and return a boxed HvppMaster
///
/// This is a convenience function for use in the CLI programmer dispatch.
/// See [`parse_options`] for the accepted options.
pub fn open_linux_gpio_hvpp(
    options: &[(&str, &str)],
) -> std::result::Result<
    Box<dyn hvprog_core::programmer::HvppMaster + Send>,
    Box<dyn std::error::Error>,
> {
    let config = parse_options(options)?;
    let gpio = LinuxGpioHvpp::open(&config)?;
    Ok(Box::new(gpio))
}
