//! Session authentication secret.

use std::fmt;
use zeroize::Zeroizing;

/// Secret fed to the elevation helper on every privileged invocation.
///
/// The backing buffer is wiped on drop and `Debug` never prints it.
#[derive(Clone)]
pub struct Credential {
    secret: Zeroizing<String>,
}

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: Zeroizing::new(secret.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.secret.is_empty()
    }

    /// Bytes written to the child's stdin: the secret and a line terminator.
    pub fn stdin_payload(&self) -> Zeroizing<Vec<u8>> {
        let mut payload = Zeroizing::new(Vec::with_capacity(self.secret.len() + 1));
        payload.extend_from_slice(self.secret.as_bytes());
        payload.push(b'\n');
        payload
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}
