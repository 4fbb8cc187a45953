//! Document packaging: normalized text → `.docx` bytes.
//!
//! Every line becomes one paragraph, blank lines included, so the editor
//! who opens the file sees exactly the spacing shown on screen. The default
//! run font is set on all script slots; Word otherwise renders Japanese with
//! its own East-Asian fallback.

use crate::error::ManuscriptError;
use docx_rs::{Docx, Paragraph, Run, RunFonts};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use tracing::debug;

/// File name offered for download.
pub const MANUSCRIPT_FILENAME: &str = "原稿.docx";

/// MIME type of the packaged document.
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStyle {
    pub font_name: String,
    /// Point size. Word stores half-points, see [`DocumentStyle::half_points`].
    pub font_size_pt: usize,
}

impl Default for DocumentStyle {
    fn default() -> Self {
        Self {
            font_name: "MS Mincho".to_string(),
            font_size_pt: 11,
        }
    }
}

impl DocumentStyle {
    pub fn half_points(&self) -> usize {
        self.font_size_pt * 2
    }
}

/// Split text into paragraph strings: one per `\n`-separated line.
///
/// `""` yields one empty paragraph, and a trailing `\n` yields a trailing
/// empty paragraph.
pub fn paragraphs(text: &str) -> Vec<&str> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect()
}

/// Render `text` as a `.docx` document.
pub fn package_docx(text: &str, style: &DocumentStyle) -> Result<Vec<u8>, ManuscriptError> {
    let fonts = RunFonts::new()
        .ascii(&style.font_name)
        .hi_ansi(&style.font_name)
        .east_asia(&style.font_name);

    let lines = paragraphs(text);
    let docx = lines.iter().fold(
        Docx::new()
            .default_fonts(fonts)
            .default_size(style.half_points()),
        |doc, line| doc.add_paragraph(Paragraph::new().add_run(Run::new().add_text(*line))),
    );

    let mut buf = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buf)
        .map_err(|e| ManuscriptError::PackagingFailed(e.to_string()))?;

    let bytes = buf.into_inner();
    debug!("Packaged {} paragraphs → {} bytes", lines.len(), bytes.len());
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn read_part(docx: &[u8], part: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(docx)).expect("docx is a zip");
        let mut file = archive.by_name(part).expect("part exists");
        let mut xml = String::new();
        file.read_to_string(&mut xml).unwrap();
        xml
    }

    #[test]
    fn paragraphs_keep_blank_lines() {
        assert_eq!(paragraphs("a\n\nb"), vec!["a", "", "b"]);
        assert_eq!(paragraphs(""), vec![""]);
        assert_eq!(paragraphs("a\n"), vec!["a", ""]);
        assert_eq!(paragraphs("a\r\nb"), vec!["a", "b"]);
    }

    #[test]
    fn style_half_points() {
        assert_eq!(DocumentStyle::default().half_points(), 22);
    }

    #[test]
    fn package_produces_zip_with_text() {
        let bytes = package_docx("題名\n\n本文である。", &DocumentStyle::default()).unwrap();
        assert_eq!(&bytes[..2], b"PK");

        let document = read_part(&bytes, "word/document.xml");
        assert!(document.contains("題名"));
        assert!(document.contains("本文である。"));
    }

    #[test]
    fn package_sets_default_font() {
        let bytes = package_docx("x", &DocumentStyle::default()).unwrap();
        let styles = read_part(&bytes, "word/styles.xml");
        assert!(styles.contains("MS Mincho"));
    }

    #[test]
    fn package_empty_text() {
        let bytes = package_docx("", &DocumentStyle::default()).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }
}
