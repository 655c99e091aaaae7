use std::time::Duration;

/// Where the target root filesystem is assembled.
pub const MOUNT_ROOT: &str = "/mnt";

/// One privileged command of the install sequence.
///
/// `args` may contain the `{drive}` and `{imagePath}` placeholders; they are
/// substituted right before the step runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub name: &'static str,
    pub program: &'static str,
    pub args: &'static [&'static str],
    /// Progress reported once this step succeeds.
    pub milestone: Option<u8>,
    pub timeout: Duration,
}

const fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}

const fn mins(n: u64) -> Duration {
    Duration::from_secs(n * 60)
}

const BOOTLOADER_SCRIPT: &str = "grub-install --target=x86_64-efi --efi-directory=/boot/efi \
--bootloader-id=GRUB --recheck && grub-mkconfig -o /boot/grub/grub.cfg && mkinitcpio -P";

/// Canonical install sequence. Order is significant and never changes at
/// runtime.
pub const INSTALL_STEPS: [Step; 15] = [
    Step {
        name: "Wipe signatures",
        program: "wipefs",
        args: &["--all", "{drive}"],
        milestone: None,
        timeout: secs(60),
    },
    Step {
        name: "Create GPT label",
        program: "parted",
        args: &["-s", "{drive}", "mklabel", "gpt"],
        milestone: None,
        timeout: mins(5),
    },
    Step {
        name: "Create EFI partition",
        program: "parted",
        args: &["-s", "{drive}", "mkpart", "primary", "fat32", "1MiB", "551MiB"],
        milestone: None,
        timeout: mins(5),
    },
    Step {
        name: "Flag EFI partition",
        program: "parted",
        args: &["-s", "{drive}", "set", "1", "esp", "on"],
        milestone: None,
        timeout: mins(5),
    },
    Step {
        name: "Create root partition",
        program: "parted",
        args: &["-s", "{drive}", "mkpart", "primary", "ext4", "551MiB", "100%"],
        milestone: None,
        timeout: mins(5),
    },
    Step {
        name: "Format EFI partition",
        program: "mkfs.vfat",
        args: &["{drive}1"],
        milestone: None,
        timeout: mins(10),
    },
    Step {
        name: "Format root partition",
        program: "mkfs.ext4",
        args: &["{drive}2"],
        milestone: None,
        timeout: mins(10),
    },
    Step {
        name: "Mount root",
        program: "mount",
        args: &["{drive}2", MOUNT_ROOT],
        milestone: Some(25),
        timeout: secs(60),
    },
    Step {
        name: "Create EFI mount point",
        program: "mkdir",
        args: &["-p", "/mnt/boot/efi"],
        milestone: None,
        timeout: secs(30),
    },
    Step {
        name: "Mount EFI",
        program: "mount",
        args: &["{drive}1", "/mnt/boot/efi"],
        milestone: None,
        timeout: secs(60),
    },
    Step {
        name: "Extract root image",
        program: "unsquashfs",
        args: &["-f", "-d", MOUNT_ROOT, "{imagePath}"],
        milestone: Some(50),
        timeout: mins(120),
    },
    Step {
        name: "Generate fstab",
        program: "sh",
        args: &["-c", "genfstab -U -p /mnt >> /mnt/etc/fstab"],
        milestone: Some(75),
        timeout: mins(2),
    },
    Step {
        name: "Install bootloader",
        program: "arch-chroot",
        args: &[MOUNT_ROOT, "/bin/bash", "-c", BOOTLOADER_SCRIPT],
        milestone: Some(80),
        timeout: mins(30),
    },
    Step {
        name: "Unmount EFI",
        program: "umount",
        args: &["-l", "/mnt/boot/efi"],
        milestone: None,
        timeout: mins(2),
    },
    Step {
        name: "Unmount root",
        program: "umount",
        args: &["-l", MOUNT_ROOT],
        milestone: Some(100),
        timeout: mins(2),
    },
];

pub fn install_steps() -> &'static [Step] {
    &INSTALL_STEPS
}

/// Distinct programs the sequence needs on the host, plus those hidden
/// behind `sh -c`.
pub fn step_programs() -> Vec<&'static str> {
    let mut programs: Vec<&'static str> = Vec::new();
    for step in INSTALL_STEPS.iter() {
        if !programs.contains(&step.program) {
            programs.push(step.program);
        }
    }
    programs.push("genfstab");
    programs
}
