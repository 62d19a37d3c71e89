//! Programmer traits and abstractions
//!
//! This module defines the line-control trait that every backend
//! implements, the timing parameters backends honor, and the signal
//! primitives built on top of them.

pub mod signals;
mod timing;
mod traits;

pub use timing::*;
pub use traits::*;
