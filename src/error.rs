//! Error types for the slide-manuscript library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ManuscriptError`] — **Fatal**: the generation request cannot complete
//!   (unreadable PDF, access denied, generator failed after retries). Returned
//!   as `Err(ManuscriptError)` from the top-level `convert` functions.
//!
//! * [`GenerationError`] — a single failed call to the language model,
//!   classified by [`GenerationErrorKind`]. The retry policy inspects the kind
//!   to decide whether another attempt is worthwhile; whatever survives the
//!   policy is wrapped in [`ManuscriptError::GenerationFailed`].
//!
//! Normalization has no error type: it is total over all input strings.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the slide-manuscript library.
#[derive(Debug, Error)]
pub enum ManuscriptError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The bytes were read, but they are not a PDF.
    #[error("'{name}' is not a valid PDF\nFirst bytes: {magic:?}")]
    NotAPdf { name: String, magic: Vec<u8> },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{name}' is corrupt: {detail}")]
    CorruptPdf { name: String, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{name}' is encrypted and requires a password.\nProvide it with --pdf-password <PASSWORD>.")]
    PasswordRequired { name: String },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{name}'")]
    WrongPassword { name: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Slide text extraction needs the pdfium shared library.\n\
  • Install it system-wide, or\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium (file or directory).\n"
    )]
    PdfiumBindingFailed(String),

    // ── Generator errors ──────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The manuscript generator failed, either immediately (non-transient)
    /// or after the retry policy was exhausted.
    #[error("Manuscript generation failed after {attempts} attempt(s): {source}")]
    GenerationFailed {
        attempts: u32,
        #[source]
        source: GenerationError,
    },

    // ── Output errors ─────────────────────────────────────────────────────
    /// docx-rs could not serialise the document.
    #[error("Failed to build the .docx document: {0}")]
    PackagingFailed(String),

    /// Could not create or write the output document.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Session errors ────────────────────────────────────────────────────
    /// The access password did not match the configured reference hash.
    #[error("Access denied: the shared password is incorrect")]
    AccessDenied,

    /// Login succeeded but no API key was supplied.
    #[error("No API key supplied.\nPass --api-key or set OPENAI_API_KEY.")]
    MissingApiKey,

    /// A generation was requested before a successful login.
    #[error("Session is not authenticated; log in before generating")]
    NotAuthenticated,

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// How a single generator call failed.
///
/// The split between transient and permanent kinds drives the retry policy:
/// see [`crate::pipeline::retry::RetryPolicy::retry_on`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GenerationErrorKind {
    /// HTTP 429 or an explicit rate-limit message.
    RateLimited,
    /// The call exceeded its deadline.
    Timeout,
    /// 5xx, overloaded backend, dropped connection.
    TransientApi,
    /// 401/403, invalid or revoked API key.
    Authentication,
    /// 400, malformed request, context length exceeded.
    InvalidRequest,
    /// Billing quota exhausted (distinct from rate limiting).
    QuotaExhausted,
    /// Anything the classifier does not recognise.
    Other,
}

impl GenerationErrorKind {
    /// Kinds that are expected to resolve on their own.
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            GenerationErrorKind::RateLimited
                | GenerationErrorKind::Timeout
                | GenerationErrorKind::TransientApi
        )
    }
}

impl fmt::Display for GenerationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GenerationErrorKind::RateLimited => "rate limited",
            GenerationErrorKind::Timeout => "timeout",
            GenerationErrorKind::TransientApi => "transient API error",
            GenerationErrorKind::Authentication => "authentication error",
            GenerationErrorKind::InvalidRequest => "invalid request",
            GenerationErrorKind::QuotaExhausted => "quota exhausted",
            GenerationErrorKind::Other => "error",
        };
        f.write_str(s)
    }
}

/// A classified failure of one generator call.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct GenerationError {
    pub kind: GenerationErrorKind,
    pub message: String,
}

impl GenerationError {
    pub fn new(kind: GenerationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }

    /// Classify a provider error from its rendered message.
    ///
    /// Providers surface HTTP failures as strings, so the classification is
    /// keyword based, with status codes matched as whole numbers only. Quota
    /// is checked before rate limiting because OpenAI reports
    /// `insufficient_quota` with a 429 status. Transient kinds are checked
    /// before `InvalidRequest` so a retryable failure is never dropped.
    pub fn from_provider_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let m = message.to_lowercase();

        let kind = if m.contains("insufficient_quota") || m.contains("quota") {
            GenerationErrorKind::QuotaExhausted
        } else if RE_STATUS_429.is_match(&m) || m.contains("rate limit") || m.contains("ratelimit") {
            GenerationErrorKind::RateLimited
        } else if m.contains("timed out") || m.contains("timeout") {
            GenerationErrorKind::Timeout
        } else if RE_STATUS_AUTH.is_match(&m)
            || m.contains("unauthorized")
            || m.contains("api key")
            || m.contains("authentication")
        {
            GenerationErrorKind::Authentication
        } else if RE_STATUS_5XX.is_match(&m)
            || ["overloaded", "service unavailable", "connection", "network"]
                .iter()
                .any(|k| m.contains(k))
        {
            GenerationErrorKind::TransientApi
        } else if RE_STATUS_400.is_match(&m)
            || m.contains("invalid request")
            || m.contains("bad request")
        {
            GenerationErrorKind::InvalidRequest
        } else {
            GenerationErrorKind::Other
        };

        Self { kind, message }
    }
}

static RE_STATUS_429: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b429\b").unwrap());
static RE_STATUS_AUTH: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b40[13]\b").unwrap());
static RE_STATUS_5XX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b50[0-4]\b").unwrap());
static RE_STATUS_400: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b400\b").unwrap());
