//! Input validation guard rails for operator-provided paths.

use apex_workflow::session;
use std::path::Path;

pub fn validate_disk_path(disk: &str) -> Result<(), String> {
    let trimmed = disk.trim();
    session::validate_drive(trimmed).map_err(|e| e.to_string())?;
    if !Path::new(trimmed).exists() {
        return Err(format!("Disk device not found: {}", trimmed));
    }
    Ok(())
}

/// Syntax only; existence is checked with an elevated probe later because
/// the live medium's mount points are often root-only.
pub fn validate_image_path(path: &str) -> Result<(), String> {
    session::validate_image_path(path)
        .map(|_| ())
        .map_err(|e| e.to_string())
}
