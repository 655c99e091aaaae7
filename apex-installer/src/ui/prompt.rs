//! Interactive input collection.

use super::style::{self, emoji};
use super::validation;
use anyhow::{Context, Result};
use apex_error::InstallError;
use apex_workflow::{CredentialHolder, PostInstallChoice};
use dialoguer::{Confirm, Input, Password, Select};
use std::io::BufRead;
use zeroize::Zeroizing;

/// Ask for the secret until a non-empty one is entered.
pub fn prompt_secret(holder: &mut CredentialHolder) -> Result<()> {
    loop {
        let secret = Zeroizing::new(
            Password::new()
                .with_prompt("Password for privileged commands")
                .allow_empty_password(true)
                .interact()
                .context("Failed to read password")?,
        );
        match holder.capture(secret.as_str()) {
            Ok(_) => return Ok(()),
            Err(err @ InstallError::EmptyCredential) => {
                eprintln!("{}", style::with(emoji::ERROR, &err.to_string()));
            }
            Err(err) => return Err(err.into()),
        }
    }
}

/// Read the secret from the first line of `reader` (scripted runs).
pub fn read_secret_line<R: BufRead>(mut reader: R, holder: &mut CredentialHolder) -> Result<()> {
    let mut line = Zeroizing::new(String::new());
    reader
        .read_line(&mut line)
        .context("Failed to read password from stdin")?;
    let secret = line.trim_end_matches(['\n', '\r']);
    holder.capture(secret)?;
    Ok(())
}

pub fn prompt_drive() -> Result<String> {
    let drive: String = Input::new()
        .with_prompt("Target disk (e.g. /dev/sda)")
        .validate_with(|input: &String| validation::validate_disk_path(input))
        .interact_text()
        .context("Failed to read target disk")?;
    Ok(drive.trim().to_string())
}

pub fn prompt_search_defaults() -> Result<bool> {
    Confirm::new()
        .with_prompt("Search for airootfs.sfs in the default locations?")
        .default(true)
        .interact()
        .context("Failed to read answer")
}

pub fn prompt_image_path() -> Result<String> {
    let path: String = Input::new()
        .with_prompt("Path to the SquashFS image")
        .validate_with(|input: &String| validation::validate_image_path(input))
        .interact_text()
        .context("Failed to read image path")?;
    Ok(path.trim().to_string())
}

pub fn prompt_post_install() -> Result<PostInstallChoice> {
    let items: Vec<String> = PostInstallChoice::ALL
        .iter()
        .enumerate()
        .map(|(i, choice)| format!("{}) {}", i + 1, choice))
        .collect();
    let picked = Select::new()
        .with_prompt("Installation complete. What next?")
        .items(&items)
        .default(0)
        .interact_opt()
        .context("Failed to read post-install choice")?;
    // Esc / q leaves the menu, same as an unrecognised answer.
    Ok(picked
        .and_then(|i| PostInstallChoice::ALL.get(i).copied())
        .unwrap_or(PostInstallChoice::Exit))
}
