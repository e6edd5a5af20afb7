use crate::error::{LlmError, Result};
use crate::provider::ProviderSettings;
use crate::types::{Completion, QueryRequest};
use serde::{Deserialize, Serialize};

const OPENAI_CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";

#[derive(Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    settings: ProviderSettings,
}

impl OpenAiClient {
    pub fn new(http: reqwest::Client, api_key: &str, settings: &ProviderSettings) -> Self {
        Self {
            http,
            api_key: api_key.to_string(),
            settings: settings.clone(),
        }
    }

    #[tracing::instrument(level = "info", skip_all, fields(model = %self.settings.model))]
    pub async fn complete(&self, request: &QueryRequest) -> Result<Completion> {
        let req = OpenAiChatRequest::new(&self.settings, request);
        let url = self.settings.endpoint(OPENAI_CHAT_COMPLETIONS_PATH);
        tracing::debug!(%url, max_tokens = req.max_tokens, "sending openai chat request");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(LlmError::Http(format!(
                "openai chat status={status} body={body}"
            )));
        }

        let parsed: OpenAiChatResponse = serde_json::from_str(&body)?;
        parsed.try_into()
    }
}

#[derive(Debug, Serialize)]
struct OpenAiChatRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    max_tokens: u32,
}

impl OpenAiChatRequest {
    fn new(settings: &ProviderSettings, request: &QueryRequest) -> Self {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request.system() {
            messages.push(OpenAiMessage {
                role: "system".to_string(),
                content: system.to_string(),
            });
        }
        messages.push(OpenAiMessage {
            role: "user".to_string(),
            content: request.prompt.clone(),
        });

        Self {
            model: settings.model.clone(),
            messages,
            max_tokens: settings.max_tokens,
        }
    }
}

#[derive(Debug, Serialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiChatResponse {
    #[serde(default)]
    model: String,
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl TryFrom<OpenAiChatResponse> for Completion {
    type Error = LlmError;

    fn try_from(v: OpenAiChatResponse) -> Result<Self> {
        let choice = v.choices.into_iter().next().ok_or_else(|| {
            LlmError::ResponseFormat("openai response missing choices".to_string())
        })?;

        Ok(Completion {
            content: choice.message.content.unwrap_or_default(),
            model: v.model,
        })
    }
}
