//! Apex installation workflow.
//!
//! This crate holds the orchestration core: credential handling, image
//! discovery, the fixed install step pipeline and the post-install menu.
//! Front ends supply validated input and consume [`InstallEvent`]s.

pub mod cancel;
pub mod credential;
pub mod events;
pub mod locator;
pub mod pipeline;
pub mod post_install;
pub mod preflight;
pub mod session;

#[cfg(test)]
mod test_env;

pub use apex_error::{InstallError, InstallResult};
pub use cancel::CancelFlag;
pub use credential::CredentialHolder;
pub use events::{EventSink, InstallEvent};
pub use locator::{ImageLocator, ImageSource, DEFAULT_SEARCH_PATHS};
pub use pipeline::{build_plan, install_steps, InstallPlan, Pipeline, PipelineStatus, Step};
pub use post_install::{run_post_install, PostInstallChoice};
pub use session::SessionConfig;
