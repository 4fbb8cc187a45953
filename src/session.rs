//! Operator session: credentials, access gate, and the last generated result.
//!
//! A [`Session`] is created when the operator starts working, holds the API
//! key and the most recent [`Manuscript`], and is dropped when they finish.
//! Nothing in it is written to disk.
//!
//! ```text
//! Session::new ──login──▶ authenticated ──begin_upload──▶ (artifact cleared)
//!                              ▲                               │
//!                              └──────────── store ◀───────────┘
//! ```

use crate::error::ManuscriptError;
use crate::output::Manuscript;
use sha2::{Digest, Sha256};
use std::fmt;
use tracing::{debug, info, warn};

/// Environment variable holding the SHA-256 hex digest of the shared password.
pub const PASSWORD_HASH_ENV: &str = "APP_PASSWORD_HASH";

/// Built-in reference hash used when [`PASSWORD_HASH_ENV`] is unset.
/// Empty means no password is required.
pub const DEFAULT_PASSWORD_HASH: &str = "";

/// Lowercase hex SHA-256 of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Identity of one generation result, used to key the download.
///
/// Hashes the uploaded file name, its bytes, and the rule document. Two runs
/// on the same input get the same key; the key is never used to skip a run.
pub fn cache_key(name: &str, pdf_bytes: &[u8], rules: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    hasher.update(pdf_bytes);
    hasher.update(rules.as_bytes());
    hex::encode(hasher.finalize())
}

/// Shared-secret check in front of the generation flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessGate {
    reference_hash: Option<String>,
}

impl AccessGate {
    /// Gate against a known SHA-256 hex digest. Blank disables the gate.
    pub fn with_hash(hash: &str) -> Self {
        let hash = hash.trim().to_ascii_lowercase();
        Self {
            reference_hash: (!hash.is_empty()).then_some(hash),
        }
    }

    /// No password required.
    pub fn open() -> Self {
        Self {
            reference_hash: None,
        }
    }

    /// Read [`PASSWORD_HASH_ENV`], falling back to [`DEFAULT_PASSWORD_HASH`].
    pub fn from_env() -> Self {
        let hash = std::env::var(PASSWORD_HASH_ENV)
            .unwrap_or_else(|_| DEFAULT_PASSWORD_HASH.to_string());
        Self::with_hash(&hash)
    }

    pub fn is_enforced(&self) -> bool {
        self.reference_hash.is_some()
    }

    /// Compare the password's digest with the reference.
    pub fn check(&self, password: &str) -> bool {
        match &self.reference_hash {
            None => true,
            Some(reference) => sha256_hex(password.as_bytes()) == *reference,
        }
    }
}

impl Default for AccessGate {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Per-session secrets.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    api_key: String,
}

impl Credentials {
    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Everything one operator session holds.
#[derive(Debug, Default)]
pub struct Session {
    credentials: Option<Credentials>,
    artifact: Option<Manuscript>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Authenticate against `gate` and remember the API key.
    ///
    /// A failed attempt logs the session out: a previously valid login does
    /// not survive a wrong password.
    pub fn login(
        &mut self,
        gate: &AccessGate,
        password: &str,
        api_key: &str,
    ) -> Result<(), ManuscriptError> {
        if !gate.check(password) {
            warn!("Login rejected by access gate");
            self.logout();
            return Err(ManuscriptError::AccessDenied);
        }

        let api_key = api_key.trim();
        if api_key.is_empty() {
            self.logout();
            return Err(ManuscriptError::MissingApiKey);
        }

        info!("Session authenticated (gate enforced: {})", gate.is_enforced());
        self.credentials = Some(Credentials {
            api_key: api_key.to_string(),
        });
        Ok(())
    }

    /// Forget credentials and artifacts.
    pub fn logout(&mut self) {
        self.credentials = None;
        self.artifact = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.credentials.is_some()
    }

    pub fn credentials(&self) -> Result<&Credentials, ManuscriptError> {
        self.credentials.as_ref().ok_or(ManuscriptError::NotAuthenticated)
    }

    /// A new upload invalidates the previous result.
    pub fn begin_upload(&mut self) {
        if self.artifact.take().is_some() {
            debug!("Discarded previous manuscript");
        }
    }

    /// Replace the current result.
    pub fn store(&mut self, manuscript: Manuscript) {
        self.artifact = Some(manuscript);
    }

    pub fn artifact(&self) -> Option<&Manuscript> {
        self.artifact.as_ref()
    }
}
