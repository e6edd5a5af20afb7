#[cfg(feature = "anthropic")]
use crate::anthropic::AnthropicClient;
use crate::error::{LlmError, Result};
#[cfg(feature = "google")]
use crate::gemini::GeminiClient;
#[cfg(feature = "openai")]
use crate::openai::OpenAiClient;
use crate::provider::{ProviderId, ProviderSettings};
use crate::types::{Completion, QueryRequest, QueryResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

/// A vendor adapter. Never fails: every problem is reported as [`QueryResult::Failure`].
#[async_trait]
pub trait Adapter: Send + Sync {
    fn provider(&self) -> ProviderId;
    async fn query(&self, request: &QueryRequest) -> QueryResult;
}

/// API keys captured from the process environment at start-up.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    keys: HashMap<ProviderId, String>,
}

impl Credentials {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds credentials from an arbitrary variable lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let keys = ProviderId::ALL
            .into_iter()
            .filter_map(|p| {
                lookup(p.env_var())
                    .filter(|v| !v.trim().is_empty())
                    .map(|v| (p, v))
            })
            .collect();
        Self { keys }
    }

    pub fn get(&self, provider: ProviderId) -> Option<&str> {
        self.keys.get(&provider).map(String::as_str)
    }

    pub fn is_set(&self, provider: ProviderId) -> bool {
        self.keys.contains_key(&provider)
    }
}

/// Shared HTTP client for all adapters. `None` leaves reqwest's default (no timeout).
pub fn build_http_client(timeout: Option<Duration>) -> reqwest::Client {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().unwrap_or_else(|e| {
        tracing::warn!(%e, "reqwest client build failed; falling back to default client");
        reqwest::Client::new()
    })
}

/// HTTP adapter for one vendor.
#[derive(Clone)]
pub struct ProviderAdapter {
    provider: ProviderId,
    api_key: Option<String>,
    settings: ProviderSettings,
    http: reqwest::Client,
}

impl ProviderAdapter {
    pub fn new(
        provider: ProviderId,
        api_key: Option<&str>,
        settings: ProviderSettings,
        http: reqwest::Client,
    ) -> Self {
        Self {
            provider,
            api_key: api_key.map(str::to_string),
            settings,
            http,
        }
    }

    pub fn settings(&self) -> &ProviderSettings {
        &self.settings
    }

    async fn complete(&self, request: &QueryRequest) -> Result<Completion> {
        if !self.provider.is_compiled_in() {
            return Err(LlmError::Unavailable {
                provider: self.provider.as_str(),
                feature: self.provider.feature(),
            });
        }

        let api_key = self
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(LlmError::MissingCredential(self.provider.env_var()))?;

        match self.provider {
            #[cfg(feature = "openai")]
            ProviderId::OpenAi => {
                OpenAiClient::new(self.http.clone(), api_key, &self.settings)
                    .complete(request)
                    .await
            }
            #[cfg(feature = "google")]
            ProviderId::Google => {
                GeminiClient::new(self.http.clone(), api_key, &self.settings)
                    .complete(request)
                    .await
            }
            #[cfg(feature = "anthropic")]
            ProviderId::Anthropic => {
                AnthropicClient::new(self.http.clone(), api_key, &self.settings)
                    .complete(request)
                    .await
            }
            #[cfg(not(all(feature = "openai", feature = "google", feature = "anthropic")))]
            provider => Err(LlmError::Unavailable {
                provider: provider.as_str(),
                feature: provider.feature(),
            }),
        }
    }
}

#[async_trait]
impl Adapter for ProviderAdapter {
    fn provider(&self) -> ProviderId {
        self.provider
    }

    #[tracing::instrument(level = "info", skip_all, fields(provider = %self.provider))]
    async fn query(&self, request: &QueryRequest) -> QueryResult {
        match self.complete(request).await {
            Ok(completion) => QueryResult::Success {
                content: completion.content,
                provider: self.provider,
                model: completion.model,
            },
            Err(e) => {
                tracing::warn!(error = %e, "provider query failed");
                QueryResult::failure(e)
            }
        }
    }
}
