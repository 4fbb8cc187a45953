//! Result types returned by a generation request.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The finished artifact of one generation request.
///
/// `docx` is skipped when serialising: `--json` output describes the result,
/// the document itself is written to disk.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Manuscript {
    /// Normalized manuscript text, shown verbatim to the operator.
    pub text: String,
    /// Packaged `.docx` bytes.
    #[serde(skip)]
    pub docx: Vec<u8>,
    /// SHA-256 over file name, PDF bytes and rules.
    pub cache_key: String,
    pub file_name: String,
    pub mime_type: String,
    pub stats: GenerationStats,
}

impl Manuscript {
    /// Key that distinguishes this download from one of a newer result.
    pub fn download_key(&self) -> String {
        format!("dl-{}", self.cache_key)
    }
}

impl fmt::Debug for Manuscript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manuscript")
            .field("text_chars", &self.text.chars().count())
            .field("docx", &format_args!("<{} bytes>", self.docx.len()))
            .field("cache_key", &self.cache_key)
            .field("file_name", &self.file_name)
            .field("stats", &self.stats)
            .finish()
    }
}

/// Counters and timings for one generation request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationStats {
    /// Pages in the source PDF.
    pub page_count: usize,
    /// Pages that contributed no text.
    pub empty_pages: usize,
    /// Characters in the joined transcript sent to the model.
    pub transcript_chars: usize,
    /// Generator attempts, including the successful one.
    pub attempts: u32,
    pub input_tokens: u64,
    pub output_tokens: u64,
    /// Lines in the raw model output and after normalization.
    pub raw_lines: usize,
    pub normalized_lines: usize,
    pub extract_duration_ms: u64,
    pub llm_duration_ms: u64,
    pub total_duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_omits_document_bytes() {
        let m = Manuscript {
            text: "本文".into(),
            docx: vec![0xde, 0xad],
            cache_key: "abc".into(),
            file_name: "原稿.docx".into(),
            mime_type: "application/x".into(),
            stats: GenerationStats::default(),
        };
        let json = serde_json::to_string(&m).unwrap();
        assert!(json.contains("\"cache_key\":\"abc\""));
        assert!(!json.contains("docx\":"));
        assert_eq!(m.download_key(), "dl-abc");
    }
}
