//! Validated inputs of one installation session.

use apex_error::{InstallError, InstallResult};
use apex_hal::path::uses_plain_suffix;
use apex_hal::Credential;

/// Characters a shell (or the step templater) would interpret.
const FORBIDDEN_CHARS: &[char] = &[
    ';', '&', '|', '$', '`', '<', '>', '(', ')', '{', '}', '[', ']', '*', '?', '!', '~', '\'',
    '"', '\\', '#',
];

/// Everything the pipeline needs, constructed once from validated input.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    credential: Credential,
    drive: String,
    image_path: String,
}

impl SessionConfig {
    pub fn new(credential: Credential, drive: &str, image_path: &str) -> InstallResult<Self> {
        if credential.is_empty() {
            return Err(InstallError::EmptyCredential);
        }
        let drive = validate_drive(drive)?;
        let image_path = validate_image_path(image_path)?;
        Ok(Self {
            credential,
            drive,
            image_path,
        })
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn drive(&self) -> &str {
        &self.drive
    }

    pub fn image_path(&self) -> &str {
        &self.image_path
    }
}

/// Validate a target device path and return it trimmed.
pub fn validate_drive(drive: &str) -> InstallResult<String> {
    let trimmed = drive.trim();
    if trimmed.is_empty() {
        return Err(InstallError::MissingInput("target drive".to_string()));
    }
    if !trimmed.starts_with("/dev/") || trimmed.len() == "/dev/".len() {
        return Err(InstallError::InvalidInput(format!(
            "drive must be a device path under /dev/, got {}",
            trimmed
        )));
    }
    check_shell_safe("drive", trimmed)?;
    // Steps address partitions as `{drive}1` / `{drive}2`.
    if !uses_plain_suffix(trimmed) {
        return Err(InstallError::InvalidInput(format!(
            "{} names its partitions with a 'p' suffix, which the install steps do not support",
            trimmed
        )));
    }
    Ok(trimmed.to_string())
}

/// Validate a SquashFS image path and return it trimmed.
pub fn validate_image_path(path: &str) -> InstallResult<String> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Err(InstallError::MissingInput("SquashFS image path".to_string()));
    }
    if !trimmed.starts_with('/') {
        return Err(InstallError::InvalidInput(format!(
            "image path must be absolute, got {}",
            trimmed
        )));
    }
    check_shell_safe("image path", trimmed)?;
    Ok(trimmed.to_string())
}

/// Reject whitespace, control characters and shell metacharacters.
pub fn check_shell_safe(label: &str, value: &str) -> InstallResult<()> {
    if let Some(bad) = value
        .chars()
        .find(|c| c.is_whitespace() || c.is_control() || FORBIDDEN_CHARS.contains(c))
    {
        return Err(InstallError::InvalidInput(format!(
            "{} contains forbidden character {:?}",
            label, bad
        )));
    }
    Ok(())
}
