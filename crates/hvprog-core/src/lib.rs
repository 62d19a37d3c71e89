//! hvprog-core - Core library for AVR high-voltage parallel programming
//!
//! This crate implements the high-voltage parallel programming (HVPP)
//! protocol used by classic 8-bit AVR microcontrollers: the bit-level
//! command/address/data loading, the ready/busy handshake, the power and
//! 12V reset sequencing, a database of known devices, and the command
//! session that ties them together. It is `no_std` so the same code runs
//! on the programmer's own microcontroller and on a Linux host.
//!
//! # Features
//!
//! - `std` - Enable standard library support (includes `alloc`)
//! - `alloc` - Enable boxed backends (`Box<dyn HvppMaster>`)
//!
//! # Example
//!
//! ```ignore
//! use hvprog_core::session::Session;
//!
//! fn console<M: hvprog_core::programmer::HvppMaster>(master: M, lines: &[&str]) {
//!     let mut session = Session::new(master);
//!     let mut out = String::new();
//!     for line in lines {
//!         session.execute(line, &mut out).unwrap();
//!     }
//!     print!("{}", out);
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(any(feature = "std", test))]
extern crate std;

pub mod chip;
pub mod error;
pub mod fuse;
pub mod power;
pub mod programmer;
pub mod protocol;
pub mod session;

pub use error::{Error, Result};
