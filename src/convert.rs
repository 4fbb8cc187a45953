//! Generation entry points.
//!
//! [`generate`] is the whole operator action: check the session, extract the
//! slides, call the model under the retry policy, normalize, package, and
//! store the result in the session. It either stores a complete
//! [`Manuscript`] or returns an error with the session holding nothing.
//!
//! [`manuscript_from_slides`] is the same pipeline minus pdfium and the
//! session, for callers that already have slide text (and for tests).

use crate::config::ManuscriptConfig;
use crate::error::ManuscriptError;
use crate::output::{GenerationStats, Manuscript};
use crate::pipeline::docx::{self, DOCX_MIME, MANUSCRIPT_FILENAME};
use crate::pipeline::extract::{self, join_slides};
use crate::pipeline::input::PdfInput;
use crate::pipeline::llm::{self, ManuscriptGenerator};
use crate::pipeline::postprocess;
use crate::progress::Stage;
use crate::prompts::build_prompt;
use crate::session::{cache_key, Session};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Generate a manuscript for `input` and store it in `session`.
///
/// # Errors
/// - [`ManuscriptError::NotAuthenticated`] before any work if the session has
///   not logged in
/// - extraction errors (corrupt or encrypted PDF, pdfium missing)
/// - [`ManuscriptError::GenerationFailed`] when the model call fails for good
/// - [`ManuscriptError::PackagingFailed`]
pub async fn generate(
    session: &mut Session,
    input: &PdfInput,
    config: &ManuscriptConfig,
) -> Result<Manuscript, ManuscriptError> {
    let api_key = session.credentials()?.api_key().to_string();
    session.begin_upload();

    let total_start = Instant::now();
    info!("Starting generation: {} ({} bytes)", input.name, input.bytes.len());

    let extract_start = Instant::now();
    let slides = extract_transcript(input, config).await?;
    let extract_duration_ms = extract_start.elapsed().as_millis() as u64;

    let generator = llm::resolve_generator(config, Some(&api_key))?;
    let mut manuscript =
        manuscript_from_slides(generator.as_ref(), input, &slides, config).await?;

    manuscript.stats.extract_duration_ms = extract_duration_ms;
    manuscript.stats.total_duration_ms = total_start.elapsed().as_millis() as u64;

    session.store(manuscript.clone());
    Ok(manuscript)
}

/// Extract per-page slide text. Needs no credentials.
pub async fn extract_transcript(
    input: &PdfInput,
    config: &ManuscriptConfig,
) -> Result<Vec<String>, ManuscriptError> {
    notify_stage(config, Stage::Extracting);
    let slides = extract::extract_slides(
        &input.name,
        &input.bytes,
        config.pdf_password.as_deref(),
        config.pdfium_library_path.as_deref(),
    )
    .await?;

    let empty = slides.iter().filter(|s| s.trim().is_empty()).count();
    info!("Extracted {} pages ({} without text)", slides.len(), empty);
    if let Some(ref cb) = config.progress_callback {
        cb.on_slides_extracted(slides.len(), empty);
    }
    Ok(slides)
}

/// Run generation, normalization, and packaging on already-extracted slides.
pub async fn manuscript_from_slides(
    generator: &dyn ManuscriptGenerator,
    input: &PdfInput,
    slides: &[String],
    config: &ManuscriptConfig,
) -> Result<Manuscript, ManuscriptError> {
    let start = Instant::now();
    let rules = config.rules();
    let transcript = join_slides(slides);
    let prompt = build_prompt(rules, &transcript);
    let key = cache_key(&input.name, &input.bytes, rules);
    debug!(
        "Prompt: {} chars ({} transcript), key {}",
        prompt.chars().count(),
        transcript.chars().count(),
        key
    );

    // ── Generate ─────────────────────────────────────────────────────────
    notify_stage(config, Stage::Generating);
    let llm_start = Instant::now();
    let generated = config
        .retry
        .run_observed(
            || generator.generate(&prompt),
            |notice| {
                if let Some(ref cb) = config.progress_callback {
                    cb.on_retry(
                        notice.attempt,
                        notice.max_attempts,
                        notice.delay,
                        &notice.error.to_string(),
                    );
                }
            },
        )
        .await
        .map_err(|failure| ManuscriptError::GenerationFailed {
            attempts: failure.attempts,
            source: failure.error,
        })?;
    let llm_duration_ms = llm_start.elapsed().as_millis() as u64;
    info!(
        "Generated {} chars in {}ms ({} attempt(s))",
        generated.value.text.chars().count(),
        llm_duration_ms,
        generated.attempts
    );

    // ── Normalize ────────────────────────────────────────────────────────
    notify_stage(config, Stage::Normalizing);
    let raw = generated.value.text;
    let text = postprocess::normalize_manuscript(&raw);

    // ── Package ──────────────────────────────────────────────────────────
    notify_stage(config, Stage::Packaging);
    let docx_bytes = docx::package_docx(&text, &config.style)?;

    if let Some(ref cb) = config.progress_callback {
        cb.on_complete(text.chars().count());
    }

    let stats = GenerationStats {
        page_count: slides.len(),
        empty_pages: slides.iter().filter(|s| s.trim().is_empty()).count(),
        transcript_chars: transcript.chars().count(),
        attempts: generated.attempts,
        input_tokens: generated.value.input_tokens,
        output_tokens: generated.value.output_tokens,
        raw_lines: raw.lines().count(),
        normalized_lines: text.lines().count(),
        extract_duration_ms: 0,
        llm_duration_ms,
        total_duration_ms: start.elapsed().as_millis() as u64,
    };

    Ok(Manuscript {
        text,
        docx: docx_bytes,
        cache_key: key,
        file_name: MANUSCRIPT_FILENAME.to_string(),
        mime_type: DOCX_MIME.to_string(),
        stats,
    })
}

/// Write the packaged document to `path`.
///
/// Uses atomic write (temp file + rename) so a failed run never leaves a
/// truncated document behind.
pub async fn write_docx(
    path: impl AsRef<Path>,
    manuscript: &Manuscript,
) -> Result<(), ManuscriptError> {
    let path = path.as_ref();
    let write_err = |source| ManuscriptError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = path.with_extension("docx.tmp");
    tokio::fs::write(&tmp_path, &manuscript.docx)
        .await
        .map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;

    info!("Wrote {} ({} bytes)", path.display(), manuscript.docx.len());
    Ok(())
}

/// Synchronous wrapper around [`generate`].
///
/// Creates a temporary tokio runtime internally.
pub fn generate_sync(
    session: &mut Session,
    input: &PdfInput,
    config: &ManuscriptConfig,
) -> Result<Manuscript, ManuscriptError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ManuscriptError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(generate(session, input, config))
}

fn notify_stage(config: &ManuscriptConfig, stage: Stage) {
    debug!("Stage: {}", stage);
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage(stage);
    }
}
