/*!
 * Core translation service implementation.
 *
 * This module contains the main TranslationService struct, which turns a
 * masked paragraph into its translation using the configured provider.
 * Retry with exponential backoff lives here, above the provider clients,
 * so every provider (including the mock) gets the same behavior.
 */

use anyhow::{Result, anyhow};
use log::{debug, warn};
use rand::Rng;
use std::time::Duration;

use super::cache::TranslationCache;
use crate::app_config::{TranslationConfig, TranslationProvider as ConfigTranslationProvider};
use crate::errors::ProviderError;
use crate::language_utils;
use crate::providers::Provider;
use crate::providers::mock::{MockProvider, MockRequest};
use crate::providers::openai::{OpenAI, OpenAIRequest};

// @const: Ceiling for a single backoff delay
const MAX_BACKOFF_MS: u64 = 30_000;

/// Translation provider implementation variants
enum TranslationProviderImpl {
    /// OpenAI API service (also used for LM Studio, same wire dialect)
    OpenAI {
        /// Client instance
        client: OpenAI,
    },

    /// Mock provider for tests
    Mock {
        /// Provider instance
        provider: MockProvider,
    },
}

/// Main translation service
pub struct TranslationService {
    /// The configured provider implementation
    provider: TranslationProviderImpl,

    /// Translation configuration
    config: TranslationConfig,

    /// Per-run translation cache
    cache: TranslationCache,
}

impl TranslationService {
    /// Create a new translation service from configuration
    pub fn new(config: TranslationConfig) -> Result<Self> {
        let endpoint = config.get_endpoint();
        validate_endpoint(&endpoint)?;

        let provider = match config.provider {
            ConfigTranslationProvider::OpenAI | ConfigTranslationProvider::LMStudio => {
                let client = OpenAI::new(
                    config.get_api_key(),
                    endpoint,
                    config.get_model(),
                    config.get_timeout_secs(),
                );
                TranslationProviderImpl::OpenAI { client }
            }
        };

        Ok(Self {
            provider,
            config,
            cache: TranslationCache::default(),
        })
    }

    /// Create a translation service backed by a mock provider
    pub fn with_mock(provider: MockProvider, config: TranslationConfig) -> Self {
        Self {
            provider: TranslationProviderImpl::Mock { provider },
            config,
            cache: TranslationCache::default(),
        }
    }

    /// The translation configuration in use
    pub fn config(&self) -> &TranslationConfig {
        &self.config
    }

    /// Cache statistics as (hits, misses, hit rate)
    pub fn cache_stats(&self) -> (usize, usize, f64) {
        self.cache.stats()
    }

    /// Verify the provider is reachable and accepts requests
    pub async fn test_connection(&self) -> Result<(), ProviderError> {
        match &self.provider {
            TranslationProviderImpl::OpenAI { client } => client.test_connection().await,
            TranslationProviderImpl::Mock { provider } => provider.test_connection().await,
        }
    }

    /// Translate one piece of masked text.
    ///
    /// Retries transient failures up to `retry_count` times with exponential
    /// backoff and jitter. Non-retryable errors (authentication, malformed
    /// responses) are returned immediately.
    pub async fn translate_text(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, ProviderError> {
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }

        if let Some(cached) = self.cache.get(text, target_language) {
            return Ok(cached);
        }

        let system_prompt = self.build_system_prompt(target_language);
        let user_prompt = build_user_prompt(text, source_language, target_language);

        let total_attempts = self.config.common.retry_count as u64 + 1;
        let mut last_error = None;

        for attempt in 0..total_attempts {
            if attempt > 0 {
                let delay = backoff_delay(self.config.common.retry_backoff_ms, attempt);
                debug!(
                    "Retrying translation (attempt {}/{}) after {:?}",
                    attempt + 1,
                    total_attempts,
                    delay
                );
                tokio::time::sleep(delay).await;
            }

            match self
                .request_translation(text, &system_prompt, &user_prompt, target_language)
                .await
            {
                Ok(translated) => {
                    self.cache.store(text, target_language, &translated);
                    return Ok(translated);
                }
                Err(e) if e.is_retryable() && attempt + 1 < total_attempts => {
                    warn!("Translation attempt {} failed: {}", attempt + 1, e);
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error
            .unwrap_or_else(|| ProviderError::RequestFailed("no attempts were made".to_string())))
    }

    /// Issue a single translation request to the configured provider
    async fn request_translation(
        &self,
        text: &str,
        system_prompt: &str,
        user_prompt: &str,
        target_language: &str,
    ) -> Result<String, ProviderError> {
        match &self.provider {
            TranslationProviderImpl::OpenAI { client } => {
                let request = OpenAIRequest::new(self.config.get_model())
                    .add_message("system", system_prompt)
                    .add_message("user", user_prompt)
                    .temperature(self.config.common.temperature);

                let response = client.complete(request).await?;

                if let Some(usage) = &response.usage {
                    debug!(
                        "Token usage: {} prompt, {} completion",
                        usage.prompt_tokens, usage.completion_tokens
                    );
                }

                let translated = OpenAI::extract_text(&response);
                if translated.trim().is_empty() {
                    return Err(ProviderError::ParseError(
                        "provider returned an empty translation".to_string(),
                    ));
                }

                Ok(translated.trim().to_string())
            }
            TranslationProviderImpl::Mock { provider } => {
                let request = MockRequest {
                    text: text.to_string(),
                    target_language: target_language.to_string(),
                };
                let response = provider.complete(request).await?;
                Ok(MockProvider::extract_text(&response))
            }
        }
    }

    /// Expand the configured system prompt template for a target language
    fn build_system_prompt(&self, target_language: &str) -> String {
        let language_name = language_utils::get_language_name(target_language)
            .unwrap_or_else(|_| target_language.to_string());

        self.config
            .common
            .system_prompt
            .replace("{target_language}", &language_name)
    }
}

/// Build the per-request user prompt around the masked text
fn build_user_prompt(text: &str, source_language: &str, target_language: &str) -> String {
    let target_name = language_utils::get_language_name(target_language)
        .unwrap_or_else(|_| target_language.to_string());

    let source_clause = if source_language == "auto" {
        String::new()
    } else {
        let source_name = language_utils::get_language_name(source_language)
            .unwrap_or_else(|_| source_language.to_string());
        format!(" from {}", source_name)
    };

    format!(
        "Translate the following text{} into {}. \
         Keep every [PLACEHOLDER_N] token exactly as written, in its position. \
         Reply with the translation only, no explanations.\n\n{}",
        source_clause, target_name, text
    )
}

/// Exponential backoff with jitter: base * 2^(attempt-1) plus up to 250ms
fn backoff_delay(base_ms: u64, attempt: u64) -> Duration {
    let exponential = base_ms.saturating_mul(1u64 << (attempt - 1).min(16));
    let jitter = rand::rng().random_range(0..=250);
    Duration::from_millis(exponential.min(MAX_BACKOFF_MS) + jitter)
}

/// Parse an endpoint string and check it has a usable host
pub fn validate_endpoint(endpoint: &str) -> Result<()> {
    if endpoint.is_empty() {
        return Err(anyhow!("Endpoint cannot be empty"));
    }

    let url = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        url::Url::parse(endpoint)?
    } else {
        url::Url::parse(&format!("http://{}", endpoint))?
    };

    url.host_str()
        .ok_or_else(|| anyhow!("Invalid host in endpoint: {}", endpoint))?;

    Ok(())
}
