//! Automation backends
//!
//! The COM backend talks to the real server and exists on Windows only. The
//! simulated server in [`crate::sim`] implements the same boundary on every
//! platform.

#[cfg(windows)]
mod com;

#[cfg(windows)]
pub use com::{ComApartment, DispatchObject};
