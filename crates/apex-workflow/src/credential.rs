//! Session credential holder.

use apex_error::{InstallError, InstallResult};
use apex_hal::Credential;

/// Owns the authentication secret for one installation session.
#[derive(Debug, Default)]
pub struct CredentialHolder {
    credential: Option<Credential>,
}

impl CredentialHolder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the secret collected by the front end.
    ///
    /// An empty secret is rejected and leaves the holder unchanged so the
    /// operator can be asked again.
    pub fn capture(&mut self, secret: impl Into<String>) -> InstallResult<&Credential> {
        let credential = Credential::new(secret);
        if credential.is_empty() {
            return Err(InstallError::EmptyCredential);
        }
        Ok(&*self.credential.insert(credential))
    }

    pub fn get(&self) -> InstallResult<&Credential> {
        self.credential.as_ref().ok_or(InstallError::EmptyCredential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_secret_is_rejected() {
        let mut holder = CredentialHolder::new();
        assert_eq!(holder.capture("").unwrap_err(), InstallError::EmptyCredential);
        assert_eq!(holder.get().unwrap_err(), InstallError::EmptyCredential);
    }

    #[test]
    fn captured_secret_is_returned() {
        let mut holder = CredentialHolder::new();
        holder.capture("pw").unwrap();
        assert_eq!(holder.get().unwrap().stdin_payload().as_slice(), b"pw\n");
    }

    #[test]
    fn failed_recapture_keeps_previous_secret() {
        let mut holder = CredentialHolder::new();
        holder.capture("pw").unwrap();
        assert!(holder.capture("").is_err());
        assert!(holder.get().is_ok());
    }
}
