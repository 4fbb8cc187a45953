//! Pipeline stages for slide-to-manuscript generation.
//!
//! Each submodule implements one step; [`crate::convert`] wires them
//! together and owns progress reporting and the session.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ llm (under retry) ──▶ postprocess ──▶ docx
//! (path/URL)  (pdfium)    (chat completion)     (normalize)    (package)
//! ```
//!
//! 1. [`input`]   — load the PDF bytes and check the `%PDF` magic
//! 2. [`extract`] — per-page text via pdfium; runs in `spawn_blocking`
//!    because pdfium is not async-safe
//! 3. [`llm`]     — one chat completion per request; the only stage with
//!    network I/O
//! 4. [`retry`]   — bounded exponential backoff around the generator call
//! 5. [`postprocess`] — deterministic text rewrites applied to model output
//! 6. [`docx`]    — one paragraph per line in the configured font

pub mod docx;
pub mod extract;
pub mod input;
pub mod llm;
pub mod postprocess;
pub mod retry;
