//! Terminal action offered after a successful install.

use crate::events::EventSink;
use crate::pipeline::MOUNT_ROOT;
use apex_error::InstallResult;
use apex_hal::{Credential, PrivilegedOps};
use std::fmt;
use std::time::Duration;

const REBOOT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostInstallChoice {
    Chroot,
    Reboot,
    Exit,
}

impl PostInstallChoice {
    pub const ALL: [PostInstallChoice; 3] = [
        PostInstallChoice::Chroot,
        PostInstallChoice::Reboot,
        PostInstallChoice::Exit,
    ];

    /// Parse a menu answer (`1`, `2` or `3`).
    pub fn from_input(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(PostInstallChoice::Chroot),
            "2" => Some(PostInstallChoice::Reboot),
            "3" => Some(PostInstallChoice::Exit),
            _ => None,
        }
    }

    /// Like [`PostInstallChoice::from_input`], but anything unrecognised
    /// means exit.
    pub fn select(input: &str) -> Self {
        Self::from_input(input).unwrap_or_else(|| {
            log::warn!("Unrecognised choice {:?}; exiting.", input.trim());
            PostInstallChoice::Exit
        })
    }
}

impl fmt::Display for PostInstallChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PostInstallChoice::Chroot => "Chroot into the new system",
            PostInstallChoice::Reboot => "Reboot",
            PostInstallChoice::Exit => "Exit",
        };
        f.write_str(label)
    }
}

/// Run the chosen action once and report its outcome.
pub fn run_post_install<H: PrivilegedOps + ?Sized>(
    hal: &H,
    credential: &Credential,
    choice: PostInstallChoice,
    events: &EventSink,
) -> InstallResult<()> {
    match choice {
        PostInstallChoice::Chroot => {
            events.log("Entering chroot. Type 'exit' to leave.");
            let args = [MOUNT_ROOT.to_string(), "/bin/bash".to_string()];
            hal.run_interactive("arch-chroot", &args, credential)?
                .into_checked("arch-chroot", Duration::ZERO)?;
            events.log("Left chroot.");
        }
        PostInstallChoice::Reboot => {
            events.log("Rebooting...");
            hal.run_privileged_checked("reboot", &[], credential, REBOOT_TIMEOUT)?;
        }
        PostInstallChoice::Exit => events.log("Exiting..."),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use apex_error::InstallError;
    use apex_hal::{FakeHal, Operation};

    #[test]
    fn menu_answers_map_to_choices() {
        assert_eq!(PostInstallChoice::from_input("1"), Some(PostInstallChoice::Chroot));
        assert_eq!(PostInstallChoice::from_input(" 2\n"), Some(PostInstallChoice::Reboot));
        assert_eq!(PostInstallChoice::from_input("3"), Some(PostInstallChoice::Exit));
        assert_eq!(PostInstallChoice::from_input("4"), None);
    }

    #[test]
    fn unknown_answer_falls_back_to_exit() {
        assert_eq!(PostInstallChoice::select("yes please"), PostInstallChoice::Exit);
    }

    #[test]
    fn chroot_is_interactive() {
        let hal = FakeHal::new();
        let cred = Credential::new("pw");
        run_post_install(&hal, &cred, PostInstallChoice::Chroot, &EventSink::log_only()).unwrap();

        assert_eq!(
            hal.operations(),
            vec![Operation::Interactive {
                program: "arch-chroot".to_string(),
                args: vec!["/mnt".to_string(), "/bin/bash".to_string()],
            }]
        );
    }

    #[test]
    fn reboot_runs_once() {
        let hal = FakeHal::new();
        let cred = Credential::new("pw");
        run_post_install(&hal, &cred, PostInstallChoice::Reboot, &EventSink::log_only()).unwrap();

        assert_eq!(hal.operation_count(), 1);
        assert!(hal.has_operation(|op| op.program() == "reboot" && op.args().is_empty()));
    }

    #[test]
    fn exit_touches_nothing() {
        let hal = FakeHal::new();
        let cred = Credential::new("pw");
        run_post_install(&hal, &cred, PostInstallChoice::Exit, &EventSink::log_only()).unwrap();
        assert_eq!(hal.operation_count(), 0);
    }

    #[test]
    fn failed_reboot_is_reported() {
        let hal = FakeHal::new();
        hal.fail_command("reboot", None, 1, "Failed to talk to init daemon");
        let cred = Credential::new("pw");

        let err = run_post_install(&hal, &cred, PostInstallChoice::Reboot, &EventSink::log_only())
            .unwrap_err();
        assert!(matches!(err, InstallError::CommandFailed { exit_code: Some(1), .. }));
    }
}
