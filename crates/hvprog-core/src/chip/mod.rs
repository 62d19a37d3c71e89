//! AVR device types and database
//!
//! This module provides types for describing AVR targets, their factory
//! fuse/lock configuration and the names of individual fuse bits, as well
//! as the compiled-in database of known devices.

mod database;
mod flags;
mod types;

pub use database::*;
pub use flags::DeviceFlags;
pub use types::*;
