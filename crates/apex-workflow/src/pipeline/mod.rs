//! The fixed installation step pipeline.
//!
//! Steps are static data; [`Pipeline`] walks them in order against a
//! [`apex_hal::PrivilegedOps`] implementation, stopping at the first failure.

mod plan;
mod progress;
mod run;
mod steps;
mod template;

#[cfg(test)]
mod tests;

pub use plan::{build_plan, InstallPlan, PlannedStep};
pub use progress::Progress;
pub use run::{Pipeline, PipelineStatus};
pub use steps::{install_steps, step_programs, Step, INSTALL_STEPS, MOUNT_ROOT};
pub use template::{render_args, substitute, DRIVE_TOKEN, IMAGE_TOKEN};
