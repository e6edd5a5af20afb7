use crate::error::{LlmError, Result};
use crate::provider::ProviderSettings;
use crate::types::{Completion, QueryRequest};
use serde::{Deserialize, Serialize};

const ANTHROPIC_MESSAGES_PATH: &str = "/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Clone)]
pub struct AnthropicClient {
    http: reqwest::Client,
    api_key: String,
    settings: ProviderSettings,
}

impl AnthropicClient {
    pub fn new(http: reqwest::Client, api_key: &str, settings: &ProviderSettings) -> Self {
        Self {
            http,
            api_key: api_key.to_string(),
            settings: settings.clone(),
        }
    }

    #[tracing::instrument(level = "info", skip_all, fields(model = %self.settings.model))]
    pub async fn complete(&self, request: &QueryRequest) -> Result<Completion> {
        let req = AnthropicRequest::new(&self.settings, request);
        let url = self.settings.endpoint(ANTHROPIC_MESSAGES_PATH);
        tracing::debug!(%url, max_tokens = req.max_tokens, "sending anthropic messages request");

        let response = self
            .http
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&req)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(LlmError::Http(format!(
                "anthropic messages status={status} body={body}"
            )));
        }

        let parsed: AnthropicResponse = serde_json::from_str(&body)?;
        parsed.try_into()
    }
}

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<AnthropicMessage>,
}

impl AnthropicRequest {
    fn new(settings: &ProviderSettings, request: &QueryRequest) -> Self {
        Self {
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            system: request.system().map(str::to_string),
            messages: vec![AnthropicMessage {
                role: "user".to_string(),
                content: vec![AnthropicContentBlock::Text {
                    text: request.prompt.clone(),
                }],
            }],
        }
    }
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: String,
    content: Vec<AnthropicContentBlock>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    model: String,
    #[serde(default)]
    content: Vec<AnthropicContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
}

impl TryFrom<AnthropicResponse> for Completion {
    type Error = LlmError;

    fn try_from(v: AnthropicResponse) -> Result<Self> {
        let mut content = String::new();
        let mut saw_text = false;
        for block in v.content {
            if let AnthropicContentBlock::Text { text } = block {
                content.push_str(&text);
                saw_text = true;
            }
        }

        if !saw_text {
            return Err(LlmError::ResponseFormat(format!(
                "anthropic response missing text content (stop_reason={})",
                v.stop_reason.as_deref().unwrap_or("unknown")
            )));
        }

        Ok(Completion {
            content,
            model: v.model,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderId;
    use mockito::Matcher;
    use serde_json::json;

    fn settings_for(base_url: &str) -> ProviderSettings {
        ProviderSettings {
            base_url: base_url.to_string(),
            ..ProviderSettings::defaults_for(ProviderId::Anthropic)
        }
    }

    #[test]
    fn system_instruction_uses_dedicated_field() {
        let settings = ProviderSettings::defaults_for(ProviderId::Anthropic);
        let req = AnthropicRequest::new(
            &settings,
            &QueryRequest::new("Validate $150/user", Some("Rubric".to_string())),
        );
        let value = serde_json::to_value(&req).expect("serialize request");
        assert_eq!(
            value,
            json!({
                "model": "claude-sonnet-4-20250514",
                "max_tokens": 4096,
                "system": "Rubric",
                "messages": [{
                    "role": "user",
                    "content": [{ "type": "text", "text": "Validate $150/user" }]
                }]
            })
        );
    }

    #[test]
    fn system_field_is_omitted_when_absent() {
        let settings = ProviderSettings::defaults_for(ProviderId::Anthropic);
        let req = AnthropicRequest::new(&settings, &QueryRequest::new("hi", None));
        let value = serde_json::to_value(&req).expect("serialize request");
        assert!(value.get("system").is_none());
    }

    #[test]
    fn non_text_blocks_are_skipped() {
        let parsed: AnthropicResponse = serde_json::from_value(json!({
            "model": "claude-sonnet-4-20250514",
            "content": [
                { "type": "thinking", "thinking": "..." },
                { "type": "text", "text": "Confidence 6/10" }
            ],
            "stop_reason": "end_turn"
        }))
        .expect("parse response");
        let completion = Completion::try_from(parsed).expect("text present");
        assert_eq!(completion.content, "Confidence 6/10");
    }

    #[test]
    fn empty_content_is_a_format_error() {
        let parsed: AnthropicResponse = serde_json::from_value(json!({
            "model": "claude-sonnet-4-20250514",
            "content": [],
            "stop_reason": "max_tokens"
        }))
        .expect("parse response");
        let err = Completion::try_from(parsed).expect_err("no text");
        assert!(err.to_string().contains("max_tokens"));
    }

    #[tokio::test]
    async fn complete_sends_version_and_key_headers() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .match_header("x-api-key", "ak-test")
            .match_header("anthropic-version", ANTHROPIC_VERSION)
            .match_body(Matcher::PartialJson(json!({
                "system": "rubric",
                "max_tokens": 4096
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "model": "claude-sonnet-4-20250514",
                    "content": [{ "type": "text", "text": "Scope needs exclusions." }],
                    "stop_reason": "end_turn"
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client =
            AnthropicClient::new(reqwest::Client::new(), "ak-test", &settings_for(&server.url()));
        let completion = client
            .complete(&QueryRequest::new("quote", Some("rubric".to_string())))
            .await
            .expect("completion succeeds");

        mock.assert_async().await;
        assert_eq!(completion.content, "Scope needs exclusions.");
        assert_eq!(completion.model, "claude-sonnet-4-20250514");
    }
}
