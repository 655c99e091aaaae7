//! Apex hardware/process abstraction layer.
//!
//! Every privileged external command goes through [`PrivilegedOps`] so the
//! installation workflow can be exercised against [`FakeHal`] without root
//! privileges or a real block device.

pub mod credential;
pub mod error;
pub mod hal;
pub mod path;
pub mod procfs;
pub mod sysfs;

pub use credential::Credential;
pub use error::{HalError, HalResult};
pub use hal::{
    Elevation, ExecutionResult, FakeHal, FakeOutcome, LinuxHal, Operation, PrivilegedOps,
};
