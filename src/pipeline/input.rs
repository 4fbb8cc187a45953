//! Input loading: turn a user-supplied path or URL into PDF bytes.
//!
//! Generation works on bytes in memory; the file name travels with them
//! because it is part of the download key. The `%PDF` magic check runs here
//! so a wrong file is reported as such instead of as a pdfium failure.

use crate::error::ManuscriptError;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// An uploaded slide deck.
#[derive(Clone, PartialEq, Eq)]
pub struct PdfInput {
    /// File name as uploaded (no directory part).
    pub name: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for PdfInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfInput")
            .field("name", &self.name)
            .field("bytes", &format_args!("<{} bytes>", self.bytes.len()))
            .finish()
    }
}

impl PdfInput {
    /// Wrap bytes that are already in memory, checking the PDF magic.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, ManuscriptError> {
        let name = name.into();
        check_magic(&name, &bytes)?;
        Ok(Self { name, bytes })
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Load a PDF from a local path or an HTTP(S) URL.
pub async fn load_input(input: &str, timeout_secs: u64) -> Result<PdfInput, ManuscriptError> {
    if input.trim().is_empty() {
        return Err(ManuscriptError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        load_local(Path::new(input)).await
    }
}

fn check_magic(name: &str, bytes: &[u8]) -> Result<(), ManuscriptError> {
    if !bytes.starts_with(b"%PDF") {
        return Err(ManuscriptError::NotAPdf {
            name: name.to_string(),
            magic: bytes.iter().take(4).copied().collect(),
        });
    }
    Ok(())
}

async fn load_local(path: &Path) -> Result<PdfInput, ManuscriptError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => ManuscriptError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => ManuscriptError::FileNotFound {
            path: path.to_path_buf(),
        },
    })?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    debug!("Loaded local PDF: {} ({} bytes)", path.display(), bytes.len());
    PdfInput::from_bytes(name, bytes)
}

/// Download a URL into memory.
async fn download_url(url: &str, timeout_secs: u64) -> Result<PdfInput, ManuscriptError> {
    info!("Downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ManuscriptError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            ManuscriptError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            ManuscriptError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(ManuscriptError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| ManuscriptError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    info!("Downloaded {} bytes", bytes.len());
    PdfInput::from_bytes(filename_from_url(url), bytes.to_vec())
}

/// Last path segment of the URL if it looks like a file name.
fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }

    "downloaded.pdf".to_string()
}

/// Where to write the document when the caller gave no output path.
pub fn default_output_path(dir: &Path) -> PathBuf {
    dir.join(crate::pipeline::docx::MANUSCRIPT_FILENAME)
}
