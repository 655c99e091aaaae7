//! SquashFS root image discovery.

use crate::events::EventSink;
use apex_error::{InstallError, InstallResult};
use apex_hal::{Credential, PrivilegedOps};
use std::time::Duration;

/// Canonical Arch live-medium locations of `airootfs.sfs`, probed in order.
pub const DEFAULT_SEARCH_PATHS: [&str; 3] = [
    "/run/archiso/copytoram/arch/x86_64/airootfs.sfs",
    "/run/archiso/bootmnt/arch/x86_64/airootfs.sfs",
    "/run/archiso/copytoram/airootfs.sfs",
];

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// How the operator wants the image chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    SearchDefaults,
    Explicit(String),
}

pub struct ImageLocator<'a, H: PrivilegedOps + ?Sized> {
    hal: &'a H,
    credential: &'a Credential,
    candidates: Vec<String>,
    probe_timeout: Duration,
    events: EventSink,
}

impl<'a, H: PrivilegedOps + ?Sized> ImageLocator<'a, H> {
    pub fn new(hal: &'a H, credential: &'a Credential) -> Self {
        Self {
            hal,
            credential,
            candidates: DEFAULT_SEARCH_PATHS.iter().map(|p| p.to_string()).collect(),
            probe_timeout: PROBE_TIMEOUT,
            events: EventSink::log_only(),
        }
    }

    pub fn with_candidates(mut self, candidates: Vec<String>) -> Self {
        self.candidates = candidates;
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn with_events(mut self, events: EventSink) -> Self {
        self.events = events;
        self
    }

    /// Resolve `source` to an image path and validate that it exists.
    pub fn locate(&self, source: &ImageSource) -> InstallResult<String> {
        let path = match source {
            ImageSource::SearchDefaults => self.search_defaults()?,
            ImageSource::Explicit(path) => {
                if path.trim().is_empty() {
                    return Err(InstallError::MissingInput(
                        "SquashFS file is required".to_string(),
                    ));
                }
                path.clone()
            }
        };
        self.validate(&path)?;
        Ok(path)
    }

    /// First candidate whose probe exits 0. Probe failures are not fatal.
    pub fn search_defaults(&self) -> InstallResult<String> {
        self.events
            .log("Checking for airootfs.sfs in default locations...");
        for candidate in &self.candidates {
            if self.probe(candidate) {
                self.events
                    .log(format!("Found SquashFS file at: {}", candidate));
                return Ok(candidate.clone());
            }
        }
        Err(InstallError::NotFound {
            searched: self.candidates.clone(),
        })
    }

    /// Final existence check applied to every selected path.
    pub fn validate(&self, path: &str) -> InstallResult<()> {
        if self.probe(path) {
            Ok(())
        } else {
            Err(InstallError::InvalidImagePath(path.to_string()))
        }
    }

    fn probe(&self, path: &str) -> bool {
        match self.hal.probe_file(path, self.credential, self.probe_timeout) {
            Ok(res) if res.is_success() => true,
            Ok(res) => {
                log::debug!(
                    "probe {}: {}",
                    path,
                    apex_hal::error::describe_exit(res.exit_code, res.signal)
                );
                false
            }
            Err(e) => {
                log::warn!("probe {} could not run: {}", path, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apex_hal::{FakeHal, FakeOutcome, Operation};

    fn probed_paths(hal: &FakeHal) -> Vec<String> {
        hal.operations()
            .iter()
            .filter(|op| op.program() == "test")
            .map(|op| op.args()[1].clone())
            .collect()
    }

    #[test]
    fn third_default_wins_when_first_two_fail() {
        let hal = FakeHal::new();
        hal.add_file(DEFAULT_SEARCH_PATHS[2]);
        let cred = Credential::new("pw");

        let found = ImageLocator::new(&hal, &cred)
            .locate(&ImageSource::SearchDefaults)
            .unwrap();

        assert_eq!(found, DEFAULT_SEARCH_PATHS[2]);
        // Three search probes plus the final validation probe.
        assert_eq!(
            probed_paths(&hal),
            vec![
                DEFAULT_SEARCH_PATHS[0],
                DEFAULT_SEARCH_PATHS[1],
                DEFAULT_SEARCH_PATHS[2],
                DEFAULT_SEARCH_PATHS[2],
            ]
        );
    }

    #[test]
    fn search_stops_at_first_hit() {
        let hal = FakeHal::new();
        hal.add_file(DEFAULT_SEARCH_PATHS[0]);
        hal.add_file(DEFAULT_SEARCH_PATHS[1]);
        let cred = Credential::new("pw");

        let found = ImageLocator::new(&hal, &cred).search_defaults().unwrap();
        assert_eq!(found, DEFAULT_SEARCH_PATHS[0]);
        assert_eq!(probed_paths(&hal).len(), 1);
    }

    #[test]
    fn all_defaults_missing_is_not_found() {
        let hal = FakeHal::new();
        let cred = Credential::new("pw");

        let err = ImageLocator::new(&hal, &cred)
            .locate(&ImageSource::SearchDefaults)
            .unwrap_err();
        assert!(matches!(err, InstallError::NotFound { ref searched } if searched.len() == 3));
    }

    #[test]
    fn probe_spawn_failure_advances_to_next_candidate() {
        let hal = FakeHal::new();
        hal.set_outcome(
            "test",
            Some(DEFAULT_SEARCH_PATHS[0]),
            FakeOutcome::SpawnError("no sudo".to_string()),
        );
        hal.add_file(DEFAULT_SEARCH_PATHS[1]);
        let cred = Credential::new("pw");

        let found = ImageLocator::new(&hal, &cred).search_defaults().unwrap();
        assert_eq!(found, DEFAULT_SEARCH_PATHS[1]);
    }

    #[test]
    fn explicit_path_is_validated_unchanged() {
        let hal = FakeHal::new();
        hal.add_file("/srv/images/airootfs.sfs");
        let cred = Credential::new("pw");

        let found = ImageLocator::new(&hal, &cred)
            .locate(&ImageSource::Explicit("/srv/images/airootfs.sfs".to_string()))
            .unwrap();
        assert_eq!(found, "/srv/images/airootfs.sfs");
        assert!(hal.has_operation(|op| matches!(
            op,
            Operation::Privileged { program, args, .. }
                if program == "test" && args == &vec!["-f".to_string(), "/srv/images/airootfs.sfs".to_string()]
        )));
    }

    #[test]
    fn explicit_missing_file_is_invalid_image_path() {
        let hal = FakeHal::new();
        let cred = Credential::new("pw");

        let err = ImageLocator::new(&hal, &cred)
            .locate(&ImageSource::Explicit("/nope.sfs".to_string()))
            .unwrap_err();
        assert_eq!(err, InstallError::InvalidImagePath("/nope.sfs".to_string()));
    }

    #[test]
    fn explicit_empty_path_is_missing_input() {
        let hal = FakeHal::new();
        let cred = Credential::new("pw");

        let err = ImageLocator::new(&hal, &cred)
            .locate(&ImageSource::Explicit(String::new()))
            .unwrap_err();
        assert!(matches!(err, InstallError::MissingInput(_)));
        assert_eq!(hal.operation_count(), 0);
    }

    #[test]
    fn custom_candidates_replace_defaults() {
        let hal = FakeHal::new();
        hal.add_file("/media/usb/airootfs.sfs");
        let cred = Credential::new("pw");

        let found = ImageLocator::new(&hal, &cred)
            .with_candidates(vec!["/media/usb/airootfs.sfs".to_string()])
            .locate(&ImageSource::SearchDefaults)
            .unwrap();
        assert_eq!(found, "/media/usb/airootfs.sfs");
    }
}
