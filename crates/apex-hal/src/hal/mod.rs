//! HAL trait definitions and implementations.
//!
//! This module defines the privileged execution trait and provides both a
//! real (LinuxHal) and a fake (FakeHal) implementation.

pub mod fake_hal;
pub mod linux_hal;
pub mod privileged_ops;

pub use fake_hal::{FakeHal, FakeOutcome, Operation};
pub use linux_hal::{Elevation, LinuxHal};
pub use privileged_ops::{ExecutionResult, PrivilegedOps};
