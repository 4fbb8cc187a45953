//! Slide text extraction via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async contexts.
//! `tokio::task::spawn_blocking` keeps the Tokio worker threads free while a
//! large deck is parsed.
//!
//! ## Page contract
//!
//! One string per page, in page order, always. A page whose text layer cannot
//! be read contributes `""` and a warning; only a document that cannot be
//! opened at all is an error.

use crate::error::ManuscriptError;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Delimiter placed between pages in the joined transcript.
pub const PAGE_BREAK: &str = "\n\n--- page break ---\n\n";

/// Join per-page texts with [`PAGE_BREAK`].
///
/// Every boundary gets a delimiter, including those next to empty pages, so
/// the model can count slides.
pub fn join_slides(slides: &[String]) -> String {
    slides.join(PAGE_BREAK)
}

/// Extract the text of every page of an in-memory PDF.
pub async fn extract_slides(
    name: &str,
    bytes: &[u8],
    password: Option<&str>,
    library_path: Option<&Path>,
) -> Result<Vec<String>, ManuscriptError> {
    let name = name.to_string();
    let bytes = bytes.to_vec();
    let password = password.map(str::to_string);
    let library_path = library_path.map(Path::to_path_buf);

    tokio::task::spawn_blocking(move || {
        let pdfium = bind_pdfium(library_path.as_deref())?;
        extract_slides_blocking(&pdfium, &name, &bytes, password.as_deref())
    })
    .await
    .map_err(|e| ManuscriptError::Internal(format!("Extraction task panicked: {}", e)))?
}

/// Bind to pdfium: explicit path, then `PDFIUM_LIB_PATH`, then the system
/// library. A directory is resolved to the platform library name inside it.
fn bind_pdfium(explicit: Option<&Path>) -> Result<Pdfium, ManuscriptError> {
    let candidate = explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os("PDFIUM_LIB_PATH").map(PathBuf::from));

    let bindings = match candidate {
        Some(path) => {
            let lib = if path.is_dir() {
                Pdfium::pdfium_platform_library_name_at_path(&path)
            } else {
                path
            };
            debug!("Binding pdfium from {}", lib.display());
            Pdfium::bind_to_library(&lib)
        }
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| ManuscriptError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

fn extract_slides_blocking(
    pdfium: &Pdfium,
    name: &str,
    bytes: &[u8],
    password: Option<&str>,
) -> Result<Vec<String>, ManuscriptError> {
    let document = pdfium
        .load_pdf_from_byte_slice(bytes, password)
        .map_err(|e| {
            let err_str = format!("{:?}", e);
            if err_str.contains("Password") || err_str.contains("password") {
                if password.is_some() {
                    ManuscriptError::WrongPassword {
                        name: name.to_string(),
                    }
                } else {
                    ManuscriptError::PasswordRequired {
                        name: name.to_string(),
                    }
                }
            } else {
                ManuscriptError::CorruptPdf {
                    name: name.to_string(),
                    detail: err_str,
                }
            }
        })?;

    let pages = document.pages();
    info!("PDF loaded: {} pages", pages.len());

    let slides: Vec<String> = pages
        .iter()
        .enumerate()
        .map(|(idx, page)| match page.text() {
            Ok(text) => {
                let text = text.all();
                debug!("Page {}: {} chars", idx + 1, text.chars().count());
                text
            }
            Err(e) => {
                warn!("Page {}: text extraction failed, using empty text: {:?}", idx + 1, e);
                String::new()
            }
        })
        .collect();

    Ok(slides)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_keeps_every_boundary() {
        let slides = vec!["A".to_string(), String::new(), "C".to_string()];
        let joined = join_slides(&slides);
        assert_eq!(joined, format!("A{PAGE_BREAK}{PAGE_BREAK}C"));
        assert_eq!(joined.matches(PAGE_BREAK).count(), 2);
    }

    #[test]
    fn join_single_and_empty() {
        assert_eq!(join_slides(&["only".to_string()]), "only");
        assert_eq!(join_slides(&[]), "");
    }

    #[tokio::test]
    async fn missing_library_reports_binding_failure() {
        let err = extract_slides(
            "deck.pdf",
            b"%PDF-1.4",
            None,
            Some(Path::new("/definitely/not/libpdfium.so")),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ManuscriptError::PdfiumBindingFailed(_)), "got {err:?}");
    }
}
