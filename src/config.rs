//! Configuration types for manuscript generation.
//!
//! All generation behaviour is controlled through [`ManuscriptConfig`], built
//! via its [`ManuscriptConfigBuilder`]. Credentials are deliberately absent:
//! they belong to the [`crate::session::Session`], which lives exactly as long
//! as the operator's session, while a config can be shared and logged.

use crate::error::ManuscriptError;
use crate::pipeline::docx::DocumentStyle;
use crate::pipeline::llm::ManuscriptGenerator;
use crate::pipeline::retry::RetryPolicy;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Configuration for one manuscript generation.
///
/// # Example
/// ```rust
/// use slide_manuscript::ManuscriptConfig;
///
/// let config = ManuscriptConfig::builder()
///     .model("gpt-4.1")
///     .max_attempts(4)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ManuscriptConfig {
    /// LLM model identifier. If None, uses [`crate::pipeline::llm::DEFAULT_MODEL`].
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic").
    /// If None, uses [`crate::pipeline::llm::DEFAULT_PROVIDER`].
    pub provider_name: Option<String>,

    /// Pre-constructed generator. Takes precedence over `provider_name`.
    pub generator: Option<Arc<dyn ManuscriptGenerator>>,

    /// Sampling temperature. Default: 0.2.
    ///
    /// The manuscript must restate numbers exactly as printed on the slides,
    /// so the model is kept close to deterministic.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 16384.
    ///
    /// A full manuscript covers every results slide; a tight limit silently
    /// truncates the closing sections.
    pub max_tokens: usize,

    /// Per-call timeout in seconds. Default: 180.
    pub api_timeout_secs: u64,

    /// Retry policy around the generator call.
    pub retry: RetryPolicy,

    /// PDF user password for encrypted slide decks.
    pub pdf_password: Option<String>,

    /// Explicit pdfium library (file or directory). Falls back to
    /// `PDFIUM_LIB_PATH`, then the system library.
    pub pdfium_library_path: Option<PathBuf>,

    /// Custom system prompt. If None, uses [`crate::prompts::SYSTEM_PROMPT`].
    pub system_prompt: Option<String>,

    /// Custom style-rule document. If None, uses [`crate::prompts::RULES`].
    pub rules: Option<String>,

    /// Font and size of the generated document.
    pub style: DocumentStyle,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Receives stage and retry events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ManuscriptConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            generator: None,
            temperature: 0.2,
            max_tokens: 16384,
            api_timeout_secs: 180,
            retry: RetryPolicy::default(),
            pdf_password: None,
            pdfium_library_path: None,
            system_prompt: None,
            rules: None,
            style: DocumentStyle::default(),
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ManuscriptConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManuscriptConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field(
                "generator",
                &self.generator.as_ref().map(|_| "<dyn ManuscriptGenerator>"),
            )
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("retry", &self.retry)
            .field("pdf_password", &self.pdf_password.as_ref().map(|_| "<redacted>"))
            .field("pdfium_library_path", &self.pdfium_library_path)
            .field("style", &self.style)
            .finish()
    }
}

impl ManuscriptConfig {
    /// Create a new builder for `ManuscriptConfig`.
    pub fn builder() -> ManuscriptConfigBuilder {
        ManuscriptConfigBuilder {
            config: Self::default(),
        }
    }

    /// The rule document sent to the model.
    pub fn rules(&self) -> &str {
        self.rules.as_deref().unwrap_or(crate::prompts::RULES)
    }
}

/// Builder for [`ManuscriptConfig`].
pub struct ManuscriptConfigBuilder {
    config: ManuscriptConfig,
}

impl fmt::Debug for ManuscriptConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManuscriptConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl ManuscriptConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn generator(mut self, generator: Arc<dyn ManuscriptGenerator>) -> Self {
        self.config.generator = Some(generator);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.config.retry = policy;
        self
    }

    pub fn max_attempts(mut self, n: u32) -> Self {
        self.config.retry.max_attempts = n;
        self
    }

    pub fn pdf_password(mut self, pwd: impl Into<String>) -> Self {
        self.config.pdf_password = Some(pwd.into());
        self
    }

    pub fn pdfium_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library_path = Some(path.into());
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn rules(mut self, rules: impl Into<String>) -> Self {
        self.config.rules = Some(rules.into());
        self
    }

    pub fn style(mut self, style: DocumentStyle) -> Self {
        self.config.style = style;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ManuscriptConfig, ManuscriptError> {
        let c = &self.config;
        if c.retry.max_attempts == 0 {
            return Err(ManuscriptError::InvalidConfig(
                "max_attempts must be ≥ 1".into(),
            ));
        }
        if c.retry.initial_backoff > c.retry.max_backoff {
            return Err(ManuscriptError::InvalidConfig(format!(
                "initial backoff {:?} exceeds max backoff {:?}",
                c.retry.initial_backoff, c.retry.max_backoff
            )));
        }
        if c.max_tokens == 0 {
            return Err(ManuscriptError::InvalidConfig(
                "max_tokens must be > 0".into(),
            ));
        }
        if c.api_timeout_secs == 0 {
            return Err(ManuscriptError::InvalidConfig(
                "api_timeout_secs must be > 0".into(),
            ));
        }
        if c.style.font_size_pt == 0 {
            return Err(ManuscriptError::InvalidConfig(
                "font size must be > 0".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn defaults() {
        let c = ManuscriptConfig::default();
        assert_eq!(c.retry.max_attempts, 4);
        assert_eq!(c.retry.initial_backoff, Duration::from_secs(2));
        assert_eq!(c.retry.max_backoff, Duration::from_secs(20));
        assert_eq!(c.style.font_name, "MS Mincho");
        assert_eq!(c.style.font_size_pt, 11);
        assert_eq!(c.rules(), crate::prompts::RULES);
    }

    #[test]
    fn builder_clamps_temperature() {
        let c = ManuscriptConfig::builder().temperature(5.0).build().unwrap();
        assert_eq!(c.temperature, 2.0);
    }

    #[test]
    fn builder_rejects_zero_attempts() {
        let err = ManuscriptConfig::builder().max_attempts(0).build().unwrap_err();
        assert!(matches!(err, ManuscriptError::InvalidConfig(_)));
    }

    #[test]
    fn builder_rejects_inverted_backoff() {
        let policy = RetryPolicy {
            initial_backoff: Duration::from_secs(30),
            ..RetryPolicy::default()
        };
        assert!(ManuscriptConfig::builder().retry(policy).build().is_err());
    }

    #[test]
    fn custom_rules_override() {
        let c = ManuscriptConfig::builder().rules("only rule").build().unwrap();
        assert_eq!(c.rules(), "only rule");
    }

    #[test]
    fn debug_redacts_pdf_password() {
        let c = ManuscriptConfig::builder().pdf_password("hunter2").build().unwrap();
        assert!(!format!("{c:?}").contains("hunter2"));
    }
}
