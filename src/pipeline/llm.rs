//! Manuscript generation: one prompt in, one free-text manuscript out.
//!
//! The pipeline talks to the model through the [`ManuscriptGenerator`] trait
//! so the orchestration, retry, and normalization code can be exercised with
//! a scripted generator in tests. [`LlmGenerator`] is the production
//! implementation on top of an `edgequake_llm` provider.
//!
//! All prompt text lives in [`crate::prompts`]; this module only builds the
//! message list, applies the per-call timeout, and classifies failures so the
//! [`crate::pipeline::retry::RetryPolicy`] can decide what to retry.

use crate::config::ManuscriptConfig;
use crate::error::{GenerationError, GenerationErrorKind, ManuscriptError};
use crate::prompts::SYSTEM_PROMPT;
use async_trait::async_trait;
use edgequake_llm::{
    AnthropicProvider, ChatMessage, CompletionOptions, GeminiProvider, LLMProvider,
    OpenAIProvider, ProviderFactory,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{timeout, Duration};
use tracing::{debug, info};

/// Default model when neither the config nor the environment names one.
pub const DEFAULT_MODEL: &str = "gpt-4.1";

/// Default provider when only an API key is available.
pub const DEFAULT_PROVIDER: &str = "openai";

/// Raw model output plus token accounting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Generated {
    pub text: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl Generated {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

/// Anything that can turn a prompt into a manuscript.
#[async_trait]
pub trait ManuscriptGenerator: Send + Sync {
    /// Make exactly one attempt. Retrying is the caller's business.
    async fn generate(&self, prompt: &str) -> Result<Generated, GenerationError>;
}

/// [`ManuscriptGenerator`] backed by an `edgequake_llm` chat provider.
pub struct LlmGenerator {
    provider: Arc<dyn LLMProvider>,
    system_prompt: String,
    options: CompletionOptions,
    call_timeout: Duration,
}

impl LlmGenerator {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &ManuscriptConfig) -> Self {
        Self {
            provider,
            system_prompt: config
                .system_prompt
                .clone()
                .unwrap_or_else(|| SYSTEM_PROMPT.to_string()),
            options: build_options(config),
            call_timeout: Duration::from_secs(config.api_timeout_secs),
        }
    }
}

#[async_trait]
impl ManuscriptGenerator for LlmGenerator {
    async fn generate(&self, prompt: &str) -> Result<Generated, GenerationError> {
        let messages = vec![
            ChatMessage::system(self.system_prompt.as_str()),
            ChatMessage::user(prompt),
        ];

        let start = Instant::now();
        let response = timeout(
            self.call_timeout,
            self.provider.chat(&messages, Some(&self.options)),
        )
        .await
        .map_err(|_| {
            GenerationError::new(
                GenerationErrorKind::Timeout,
                format!("no response within {}s", self.call_timeout.as_secs()),
            )
        })?
        .map_err(|e| GenerationError::from_provider_message(e.to_string()))?;

        debug!(
            "Generator: {} input tokens, {} output tokens, {:?}",
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );

        Ok(Generated {
            text: response.content,
            input_tokens: response.prompt_tokens as u64,
            output_tokens: response.completion_tokens as u64,
        })
    }
}

/// Build `CompletionOptions` from the manuscript config.
fn build_options(config: &ManuscriptConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

/// Resolve the generator, from most-specific to least-specific.
///
/// 1. **Pre-built generator** (`config.generator`) — used as-is.
/// 2. **Session key** — handed straight to the provider constructor for
///    `openai`, `anthropic` and `gemini`.
/// 3. **Environment** — `ProviderFactory` reads the provider's own key
///    variable (`OPENAI_API_KEY`, ...).
///
/// The provider is `config.provider_name` (default [`DEFAULT_PROVIDER`]) and
/// the model `config.model` (default [`DEFAULT_MODEL`]). The process
/// environment is never written.
pub fn resolve_generator(
    config: &ManuscriptConfig,
    api_key: Option<&str>,
) -> Result<Arc<dyn ManuscriptGenerator>, ManuscriptError> {
    if let Some(ref generator) = config.generator {
        return Ok(Arc::clone(generator));
    }

    let provider_name = config
        .provider_name
        .as_deref()
        .unwrap_or(DEFAULT_PROVIDER);
    let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);

    info!("Using provider '{}' with model '{}'", provider_name, model);
    let keyed = api_key
        .filter(|k| !k.is_empty())
        .and_then(|key| provider_with_key(provider_name, model, key));
    let provider = match keyed {
        Some(provider) => provider,
        None => {
            debug!("No session key for '{}', reading it from the environment", provider_name);
            ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
                ManuscriptError::ProviderNotConfigured {
                    provider: provider_name.to_string(),
                    hint: format!("{e}"),
                }
            })?
        }
    };

    Ok(Arc::new(LlmGenerator::new(provider, config)))
}

/// Build a provider from an explicit key. `None` for providers that only
/// take their credentials from the environment.
fn provider_with_key(provider_name: &str, model: &str, key: &str) -> Option<Arc<dyn LLMProvider>> {
    let provider: Arc<dyn LLMProvider> = match provider_name {
        "openai" => Arc::new(OpenAIProvider::new(key).with_model(model)),
        "anthropic" => Arc::new(AnthropicProvider::new(key).with_model(model)),
        "gemini" => Arc::new(GeminiProvider::new(key).with_model(model)),
        _ => return None,
    };
    Some(provider)
}
