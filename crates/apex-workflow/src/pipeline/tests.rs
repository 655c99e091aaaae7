use super::*;
use crate::cancel::CancelFlag;
use crate::events::{EventSink, InstallEvent};
use crate::locator::{ImageLocator, ImageSource, DEFAULT_SEARCH_PATHS};
use crate::post_install::{run_post_install, PostInstallChoice};
use crate::session::SessionConfig;
use apex_error::InstallError;
use apex_hal::{Credential, FakeHal, FakeOutcome, Operation};
use std::sync::mpsc;
use std::time::Duration;

const IMAGE: &str = "/run/archiso/bootmnt/arch/x86_64/airootfs.sfs";

fn session(drive: &str) -> SessionConfig {
    SessionConfig::new(Credential::new("pw"), drive, IMAGE).unwrap()
}

fn privileged(hal: &FakeHal) -> Vec<(String, Vec<String>)> {
    hal.operations()
        .into_iter()
        .filter_map(|op| match op {
            Operation::Privileged { program, args, .. } => Some((program, args)),
            Operation::Interactive { .. } => None,
        })
        .collect()
}

fn progress_events(events: &[InstallEvent]) -> Vec<u8> {
    events
        .iter()
        .filter_map(|e| match e {
            InstallEvent::Progress(p) => Some(*p),
            _ => None,
        })
        .collect()
}

#[test]
fn canonical_sequence_has_fifteen_steps_with_fixed_milestones() {
    let steps = install_steps();
    assert_eq!(steps.len(), 15);
    let milestones: Vec<(usize, u8)> = steps
        .iter()
        .enumerate()
        .filter_map(|(i, s)| s.milestone.map(|m| (i, m)))
        .collect();
    assert_eq!(milestones, vec![(7, 25), (10, 50), (11, 75), (12, 80), (14, 100)]);
}

#[test]
fn successful_run_executes_every_step_once_in_order() {
    let hal = FakeHal::new();
    let session = session("/dev/sdx");
    let mut pipeline = Pipeline::new(&hal, &session);

    pipeline.run().unwrap();

    assert_eq!(pipeline.status(), &PipelineStatus::Completed);
    assert_eq!(pipeline.step_index(), 15);
    assert_eq!(pipeline.progress(), 100);
    let programs: Vec<String> = privileged(&hal).into_iter().map(|(p, _)| p).collect();
    let expected: Vec<&str> = install_steps().iter().map(|s| s.program).collect();
    assert_eq!(programs, expected);
}

#[test]
fn placeholders_are_substituted_for_partitions() {
    let hal = FakeHal::new();
    let session = session("/dev/sdx");
    Pipeline::new(&hal, &session).run().unwrap();

    let ops = privileged(&hal);
    assert_eq!(ops[0].1, vec!["--all", "/dev/sdx"]);
    assert_eq!(ops[5].1, vec!["/dev/sdx1"]);
    assert_eq!(ops[6].1, vec!["/dev/sdx2"]);
    assert_eq!(ops[7].1, vec!["/dev/sdx2", "/mnt"]);
    assert_eq!(ops[8].1, vec!["-p", "/mnt/boot/efi"]);
    assert_eq!(ops[10].1, vec!["-f", "-d", "/mnt", IMAGE]);
    assert_eq!(
        ops[11].1,
        vec!["-c", "genfstab -U -p /mnt >> /mnt/etc/fstab"]
    );
}

#[test]
fn progress_is_reported_only_at_milestones() {
    let hal = FakeHal::new();
    let session = session("/dev/sdx");
    let (tx, rx) = mpsc::channel();
    Pipeline::new(&hal, &session)
        .with_events(EventSink::new(tx))
        .run()
        .unwrap();

    let events: Vec<InstallEvent> = rx.try_iter().collect();
    assert_eq!(progress_events(&events), vec![0, 25, 50, 75, 80, 100]);
    assert_eq!(events.last(), Some(&InstallEvent::Completed));
}

#[test]
fn extraction_failure_stops_before_fstab() {
    let hal = FakeHal::new();
    hal.fail_command("unsquashfs", None, 1, "FATAL ERROR: failed to read image");
    let session = session("/dev/sdx");
    let (tx, rx) = mpsc::channel();
    let mut pipeline = Pipeline::new(&hal, &session).with_events(EventSink::new(tx));

    let err = pipeline.run().unwrap_err();

    assert_eq!(err.exit_code(), Some(1));
    assert!(matches!(
        pipeline.status(),
        PipelineStatus::Failed { step_index: 10, .. }
    ));
    assert_eq!(pipeline.step_index(), 10);
    assert_eq!(pipeline.progress(), 25);
    assert_eq!(privileged(&hal).len(), 11);
    assert!(!hal.has_operation(|op| op.program() == "sh"));

    let events: Vec<InstallEvent> = rx.try_iter().collect();
    assert!(events.contains(&InstallEvent::Log(
        "Error: Command failed with exit code 1".to_string()
    )));
    assert!(events.contains(&InstallEvent::Log(
        "Error output: FATAL ERROR: failed to read image".to_string()
    )));
    assert!(matches!(
        events.last(),
        Some(InstallEvent::Failed { step_index: 10, .. })
    ));
}

#[test]
fn esp_mount_failure_stops_before_extraction() {
    let hal = FakeHal::new();
    hal.fail_command("mount", Some("/mnt/boot/efi"), 32, "mount: unknown filesystem type");
    let session = session("/dev/sdx");
    let mut pipeline = Pipeline::new(&hal, &session);

    assert!(pipeline.run().is_err());
    assert!(matches!(
        pipeline.status(),
        PipelineStatus::Failed { step_index: 9, .. }
    ));
    assert_eq!(pipeline.progress(), 25);
    assert!(!hal.has_operation(|op| op.program() == "unsquashfs"));
}

#[test]
fn spawn_failure_on_first_step_leaves_progress_at_zero() {
    let hal = FakeHal::new();
    hal.set_outcome("wipefs", None, FakeOutcome::SpawnError("sudo: not found".to_string()));
    let session = session("/dev/sdx");
    let mut pipeline = Pipeline::new(&hal, &session);

    let err = pipeline.run().unwrap_err();
    assert!(matches!(err, InstallError::SpawnError { .. }));
    assert_eq!(pipeline.progress(), 0);
    assert_eq!(pipeline.step_index(), 0);
    assert_eq!(hal.operation_count(), 1);
}

#[test]
fn signal_termination_is_a_failure() {
    let hal = FakeHal::new();
    hal.set_outcome("mkfs.ext4", None, FakeOutcome::Signal(9));
    let session = session("/dev/sdx");
    let mut pipeline = Pipeline::new(&hal, &session);

    let err = pipeline.run().unwrap_err();
    assert!(matches!(
        err,
        InstallError::CommandFailed { exit_code: None, signal: Some(9), .. }
    ));
    assert_eq!(pipeline.step_index(), 6);
}

#[test]
fn timeout_fails_the_step() {
    let hal = FakeHal::new();
    hal.set_outcome("unsquashfs", None, FakeOutcome::Timeout);
    let session = session("/dev/sdx");
    let mut pipeline = Pipeline::new(&hal, &session);

    let err = pipeline.run().unwrap_err();
    assert_eq!(
        err,
        InstallError::TimedOut {
            program: "unsquashfs".to_string(),
            timeout_secs: 7200
        }
    );
}

#[test]
fn timeout_override_applies_to_every_step() {
    let hal = FakeHal::new();
    let session = session("/dev/sdx");
    Pipeline::new(&hal, &session)
        .with_timeout_override(Some(Duration::from_secs(5)))
        .run()
        .unwrap();

    assert!(hal.operations().iter().all(|op| matches!(
        op,
        Operation::Privileged { timeout_secs: 5, .. }
    )));
}

#[test]
fn cancellation_is_honoured_between_steps() {
    let hal = FakeHal::new();
    let session = session("/dev/sdx");
    let cancel = CancelFlag::new();
    cancel.request();
    let mut pipeline = Pipeline::new(&hal, &session).with_cancel_flag(cancel);

    let err = pipeline.run().unwrap_err();
    assert_eq!(err, InstallError::Cancelled);
    assert!(matches!(
        pipeline.status(),
        PipelineStatus::Failed { step_index: 0, .. }
    ));
    assert_eq!(hal.operation_count(), 0);
}

#[test]
fn terminal_pipeline_does_not_run_again() {
    let hal = FakeHal::new();
    hal.fail_command("parted", Some("mklabel"), 1, "parted: cannot open device");
    let session = session("/dev/sdx");
    let mut pipeline = Pipeline::new(&hal, &session);

    let first = pipeline.run().unwrap_err();
    let count = hal.operation_count();
    let second = pipeline.run().unwrap_err();

    assert_eq!(first, second);
    assert_eq!(hal.operation_count(), count);
}

#[test]
fn credential_is_fed_to_every_step() {
    let hal = FakeHal::new();
    let session = session("/dev/sdx");
    Pipeline::new(&hal, &session).run().unwrap();

    let payloads = hal.stdin_payloads();
    assert_eq!(payloads.len(), 15);
    assert!(payloads.iter().all(|p| p == b"pw\n"));
}

#[test]
fn credential_never_appears_in_the_event_stream() {
    let hal = FakeHal::new();
    let session = SessionConfig::new(Credential::new("s3cr3t-pass"), "/dev/sdx", IMAGE).unwrap();
    let (tx, rx) = mpsc::channel();
    Pipeline::new(&hal, &session)
        .with_events(EventSink::new(tx))
        .run()
        .unwrap();

    for event in rx.try_iter() {
        assert!(!format!("{:?}", event).contains("s3cr3t-pass"));
    }
}

// Re-running on a target that already carries the layout is not a no-op:
// every destructive step runs again. Nothing checks the disk first.
#[test]
fn repeated_install_is_not_idempotent() {
    let hal = FakeHal::new();
    let session = session("/dev/sdx");
    Pipeline::new(&hal, &session).run().unwrap();
    Pipeline::new(&hal, &session).run().unwrap();

    let wipes = privileged(&hal)
        .into_iter()
        .filter(|(p, _)| p == "wipefs")
        .count();
    assert_eq!(wipes, 2);
    assert_eq!(hal.operation_count(), 30);
}

#[test]
fn plan_lists_resolved_command_lines() {
    let plan = build_plan("/dev/sdx", IMAGE);
    let lines = plan.summary_lines();
    assert_eq!(lines[0], "Execution plan:");
    assert_eq!(lines.len(), 1 + 15 + 2);
    assert!(lines[1].starts_with("00. Wipe signatures — wipefs --all /dev/sdx"));
    assert!(lines[8].ends_with("mount /dev/sdx2 /mnt [25%]"));
    assert!(plan
        .to_string()
        .contains("sh -c \"genfstab -U -p /mnt >> /mnt/etc/fstab\""));
}

#[test]
fn end_to_end_install_from_second_default_location() {
    let hal = FakeHal::new();
    hal.add_file(DEFAULT_SEARCH_PATHS[1]);
    let credential = Credential::new("pw");
    let (tx, rx) = mpsc::channel();
    let events = EventSink::new(tx);

    let image = ImageLocator::new(&hal, &credential)
        .with_events(events.clone())
        .locate(&ImageSource::SearchDefaults)
        .unwrap();
    assert_eq!(image, DEFAULT_SEARCH_PATHS[1]);

    let session = SessionConfig::new(credential.clone(), "/dev/sda", &image).unwrap();
    hal.clear();
    let mut pipeline = Pipeline::new(&hal, &session).with_events(events.clone());
    pipeline.run().unwrap();
    assert_eq!(pipeline.status(), &PipelineStatus::Completed);
    assert_eq!(pipeline.progress(), 100);

    let ops = privileged(&hal);
    assert_eq!(ops.len(), 15);
    assert_eq!(ops[1].1, vec!["-s", "/dev/sda", "mklabel", "gpt"]);
    assert_eq!(ops[9].1, vec!["/dev/sda1", "/mnt/boot/efi"]);
    assert_eq!(ops[10].1[3], DEFAULT_SEARCH_PATHS[1]);
    assert_eq!(ops[14].1, vec!["-l", "/mnt"]);

    run_post_install(&hal, session.credential(), PostInstallChoice::Exit, &events).unwrap();
    assert_eq!(hal.operation_count(), 15);

    let log: Vec<InstallEvent> = rx.try_iter().collect();
    assert!(log.contains(&InstallEvent::Log(format!(
        "Found SquashFS file at: {}",
        DEFAULT_SEARCH_PATHS[1]
    ))));
    assert!(log.contains(&InstallEvent::Completed));
}
