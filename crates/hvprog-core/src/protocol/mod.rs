//! Protocol implementations
//!
//! This module contains the high-voltage parallel programming command
//! sequences built from the signal primitives.

pub mod hvpp;
pub mod opcodes;

pub use hvpp::*;
