//! Confirmation helpers for destructive operations.

use anyhow::{Context, Result};
use dialoguer::Input;

/// The operator must retype the device path exactly.
pub fn typed_confirmation_matches(expected: &str, typed: &str) -> bool {
    !expected.is_empty() && typed.trim() == expected
}

pub fn confirm_device_erase(drive: &str) -> Result<bool> {
    let typed: String = Input::new()
        .with_prompt(format!(
            "⚠️ ALL DATA ON {} WILL BE ERASED. Type the device path to continue",
            drive
        ))
        .allow_empty(true)
        .interact_text()
        .context("Failed to read confirmation input")?;
    Ok(typed_confirmation_matches(drive, &typed))
}

pub fn confirm_and_run_with<C, A>(prompt: &str, confirm: C, action: A) -> Result<bool>
where
    C: FnOnce(&str) -> Result<bool>,
    A: FnOnce() -> Result<()>,
{
    if confirm(prompt)? {
        action()?;
        Ok(true)
    } else {
        Ok(false)
    }
}
