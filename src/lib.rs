//! # slide-manuscript
//!
//! Turn a slide deck (PDF) into a spoken-presentation manuscript in Japanese,
//! written to a house style, and package it as a Word document.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input      local file or URL, `%PDF` magic check
//!  ├─ 2. Extract    per-page text via pdfium (spawn_blocking)
//!  ├─ 3. Prompt     rule document + page-delimited transcript
//!  ├─ 4. Generate   one chat completion, bounded retry with backoff
//!  ├─ 5. Normalize  p-values, month units, terminology, slide references, title quotes
//!  └─ 6. Package    原稿.docx, one paragraph per line
//! ```
//!
//! A [`Session`] gates the flow behind a shared password, holds the API key,
//! and keeps the most recent [`Manuscript`]; starting a new upload discards
//! it.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use slide_manuscript::{generate, load_input, write_docx, AccessGate, ManuscriptConfig, Session};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut session = Session::new();
//!     session.login(&AccessGate::from_env(), "shared-password", "sk-...")?;
//!
//!     let config = ManuscriptConfig::default();
//!     let input = load_input("deck.pdf", config.download_timeout_secs).await?;
//!     let manuscript = generate(&mut session, &input, &config).await?;
//!
//!     println!("{}", manuscript.text);
//!     write_docx("原稿.docx", &manuscript).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `slide2manuscript` binary (clap + anyhow + indicatif + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ManuscriptConfig, ManuscriptConfigBuilder};
pub use convert::{extract_transcript, generate, generate_sync, manuscript_from_slides, write_docx};
pub use error::{GenerationError, GenerationErrorKind, ManuscriptError};
pub use output::{GenerationStats, Manuscript};
pub use pipeline::docx::{package_docx, DocumentStyle};
pub use pipeline::input::{load_input, PdfInput};
pub use pipeline::llm::{Generated, ManuscriptGenerator};
pub use pipeline::postprocess::normalize_manuscript;
pub use pipeline::retry::RetryPolicy;
pub use progress::{ManuscriptProgressCallback, NoopProgressCallback, ProgressCallback, Stage};
pub use session::{AccessGate, Session};
