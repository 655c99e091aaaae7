//! Read-only host checks run before anything destructive.

use crate::pipeline::{step_programs, MOUNT_ROOT};
use anyhow::{Context, Result};
use apex_hal::{procfs, sysfs};
use log::info;
use std::env;
use std::fs;
use std::os::unix::fs::FileTypeExt;
use std::path::{Path, PathBuf};

const MIN_TARGET_DISK_GB: u64 = 8;
const SYS_BLOCK: &str = "/sys/class/block";
const MOUNTINFO: &str = "/proc/self/mountinfo";
const DEVELOPER_MODE_ENV: &str = "APEX_DEVELOPER_MODE";

#[derive(Clone, Debug)]
pub struct PreflightConfig {
    pub target_disk: Option<PathBuf>,
    pub required_binaries: Vec<String>,
    pub min_target_disk_gb: u64,
    pub mount_root: PathBuf,
    pub sys_block: PathBuf,
    pub mountinfo_path: PathBuf,
}

impl Default for PreflightConfig {
    fn default() -> Self {
        Self {
            target_disk: None,
            required_binaries: Vec::new(),
            min_target_disk_gb: MIN_TARGET_DISK_GB,
            mount_root: PathBuf::from(MOUNT_ROOT),
            sys_block: PathBuf::from(SYS_BLOCK),
            mountinfo_path: PathBuf::from(MOUNTINFO),
        }
    }
}

impl PreflightConfig {
    /// Checks for an install onto `target_disk` elevated through
    /// `elevate_program`.
    pub fn for_install(target_disk: Option<PathBuf>, elevate_program: &str) -> Self {
        let mut required_binaries = vec![elevate_program.to_string()];
        required_binaries.extend(step_programs().into_iter().map(str::to_string));
        Self {
            target_disk,
            required_binaries,
            ..Self::default()
        }
    }
}

pub fn run(cfg: &PreflightConfig) -> Result<()> {
    info!("Running preflight checks");
    check_binaries(&cfg.required_binaries)?;

    let mountinfo = fs::read_to_string(&cfg.mountinfo_path)
        .with_context(|| format!("failed to read {}", cfg.mountinfo_path.display()))?;
    check_mount_root_free(&mountinfo, &cfg.mount_root)?;

    if let Some(ref disk) = cfg.target_disk {
        check_target_disk(disk, &cfg.sys_block, &mountinfo, cfg.min_target_disk_gb)?;
    }
    info!("Preflight checks passed");
    Ok(())
}

fn check_binaries(bins: &[String]) -> Result<()> {
    let path = env::var_os("PATH").unwrap_or_default();
    let entries = env::split_paths(&path).collect::<Vec<_>>();
    for bin in bins {
        let Some(found) = find_in_paths(bin, &entries) else {
            anyhow::bail!("Required binary '{}' not found in PATH", bin);
        };
        ensure_executable(&found).with_context(|| {
            format!(
                "Required binary '{}' was found at {} but is not executable",
                bin,
                found.display()
            )
        })?;
    }
    Ok(())
}

fn ensure_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let md = fs::metadata(path).with_context(|| format!("failed to stat {}", path.display()))?;
    if !md.is_file() {
        anyhow::bail!("{} is not a regular file", path.display());
    }
    if md.permissions().mode() & 0o111 == 0 {
        anyhow::bail!("{} is not executable", path.display());
    }
    Ok(())
}

fn find_in_paths(binary: &str, paths: &[PathBuf]) -> Option<PathBuf> {
    paths
        .iter()
        .map(|dir| dir.join(binary))
        .find(|candidate| candidate.exists())
}

fn check_mount_root_free(mountinfo: &str, mount_root: &Path) -> Result<()> {
    if procfs::mountinfo::is_mount_point(mountinfo, mount_root) {
        anyhow::bail!(
            "{} is already a mount point; unmount it before installing",
            mount_root.display()
        );
    }
    Ok(())
}

fn check_target_disk(
    path: &Path,
    sys_block: &Path,
    mountinfo: &str,
    min_target_disk_gb: u64,
) -> Result<()> {
    let metadata = fs::metadata(path)
        .with_context(|| format!("target disk {} not accessible", path.display()))?;
    if !metadata.file_type().is_block_device() {
        anyhow::bail!(
            "Target disk {} is not a block device; please provide the correct device path",
            path.display()
        );
    }
    check_disk_state(path, sys_block, mountinfo, min_target_disk_gb)
}

/// sysfs and mount-table checks for a device already known to be a block
/// device.
fn check_disk_state(
    path: &Path,
    sys_block: &Path,
    mountinfo: &str,
    min_target_disk_gb: u64,
) -> Result<()> {
    let name = sysfs::block::device_basename(path)?;
    let sys_path = sys_block.join(&name);
    if !sys_path.exists() {
        anyhow::bail!(
            "Target disk {} is not recognized in {}; is this a valid /dev block device name?",
            path.display(),
            sys_block.display()
        );
    }
    if sysfs::block::is_partition(&sys_path) {
        anyhow::bail!(
            "Target disk {} appears to be a partition; please pass the whole disk (e.g. /dev/sda, not /dev/sda1)",
            path.display()
        );
    }

    let mounted = procfs::mountinfo::mounted_under_device(mountinfo, path);
    if !mounted.is_empty() {
        anyhow::bail!(
            "Target disk {} has mounted filesystems: {}. Unmount them before continuing.",
            path.display(),
            mounted.join(", ")
        );
    }

    if env::var_os(DEVELOPER_MODE_ENV).is_none() {
        if let Some(root_source) = procfs::mountinfo::root_mount_source(mountinfo) {
            if let (Some(root_disk), Some(target_disk)) = (
                base_block_device(&root_source),
                base_block_device(&path.to_string_lossy()),
            ) {
                if root_disk == target_disk {
                    anyhow::bail!(
                        "Target disk {} is the current root/boot media ({}); refusing to continue.",
                        path.display(),
                        root_disk
                    );
                }
            }
        }
    }

    let size_bytes = sysfs::block::block_device_size_bytes(&sys_path)
        .with_context(|| format!("failed to read size for {}", path.display()))?;
    let size_gib = size_bytes as f64 / (1024.0 * 1024.0 * 1024.0);
    if size_gib < min_target_disk_gb as f64 {
        anyhow::bail!(
            "Target disk {} is too small: {:.1} GiB ({} GiB required)",
            path.display(),
            size_gib,
            min_target_disk_gb
        );
    }
    Ok(())
}

fn base_block_device(device: &str) -> Option<String> {
    let name = device.strip_prefix("/dev/")?;
    let base = if name.starts_with("nvme") || name.starts_with("mmcblk") || name.starts_with("loop")
    {
        match name.rfind('p') {
            Some(idx)
                if idx + 1 < name.len() && name[idx + 1..].chars().all(|c| c.is_ascii_digit()) =>
            {
                &name[..idx]
            }
            _ => name,
        }
    } else {
        let trimmed = name.trim_end_matches(|c: char| c.is_ascii_digit());
        if trimmed.is_empty() {
            name
        } else {
            trimmed
        }
    };
    Some(format!("/dev/{}", base))
}
