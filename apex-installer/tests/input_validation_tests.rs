use apex_installer::ui::validation;
use std::fs::File;
use tempfile::tempdir;

#[test]
fn disk_path_must_be_under_dev() {
    let err = validation::validate_disk_path("sda").unwrap_err();
    assert!(err.contains("/dev/"));
}

#[test]
fn disk_path_rejects_shell_metacharacters() {
    let err = validation::validate_disk_path("/dev/sda;reboot").unwrap_err();
    assert!(err.contains("forbidden character"));
}

#[test]
fn disk_path_must_exist() {
    let err = validation::validate_disk_path("/dev/apex-test-missing-disk").unwrap_err();
    assert!(err.contains("not found"));
}

#[test]
fn empty_disk_path_is_required() {
    let err = validation::validate_disk_path("   ").unwrap_err();
    assert!(err.contains("Missing required input"));
}

#[test]
fn image_path_is_checked_for_syntax_only() {
    let dir = tempdir().unwrap();
    let image = dir.path().join("airootfs.sfs");
    File::create(&image).unwrap();

    assert!(validation::validate_image_path(image.to_str().unwrap()).is_ok());
    assert!(validation::validate_image_path("/not/yet/mounted.sfs").is_ok());
    assert!(validation::validate_image_path("airootfs.sfs").is_err());
    assert!(validation::validate_image_path("/tmp/a b.sfs").is_err());
}
