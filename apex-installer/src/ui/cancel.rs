//! Ctrl+C cancellation handling.

use apex_workflow::CancelFlag;
use std::sync::OnceLock;

static HANDLER_SET: OnceLock<()> = OnceLock::new();

/// Route Ctrl+C to `flag`. The pipeline stops before its next step; the
/// running command is left to finish.
pub fn install_ctrlc_handler(flag: CancelFlag) -> anyhow::Result<()> {
    if HANDLER_SET.get().is_some() {
        return Ok(());
    }

    ctrlc::set_handler(move || {
        flag.request();
        log::warn!("Cancellation requested (Ctrl+C); stopping after the current step.");
    })?;

    let _ = HANDLER_SET.set(());
    Ok(())
}
