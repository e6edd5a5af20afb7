//! Google Gemini `generateContent` client.
//!
//! Gemini has no system role in this request shape; the system instruction is
//! prepended to the prompt as a single text part.

use crate::error::{LlmError, Result};
use crate::provider::ProviderSettings;
use crate::types::{Completion, QueryRequest};
use serde::{Deserialize, Serialize};

const GEMINI_API_PATH: &str = "/v1beta/models";

#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    settings: ProviderSettings,
}

impl GeminiClient {
    pub fn new(http: reqwest::Client, api_key: &str, settings: &ProviderSettings) -> Self {
        Self {
            http,
            api_key: api_key.to_string(),
            settings: settings.clone(),
        }
    }

    fn model_url(&self) -> String {
        self.settings.endpoint(&format!(
            "{GEMINI_API_PATH}/{}:generateContent",
            self.settings.model
        ))
    }

    #[tracing::instrument(level = "info", skip_all, fields(model = %self.settings.model))]
    pub async fn complete(&self, request: &QueryRequest) -> Result<Completion> {
        let req = GeminiRequest::new(&self.settings, request);
        let url = self.model_url();
        tracing::debug!(
            %url,
            max_tokens = self.settings.max_tokens,
            "sending gemini generateContent request"
        );

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&req)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(LlmError::Http(format!(
                "gemini generateContent status={status} body={body}"
            )));
        }

        let parsed: GeminiResponse = serde_json::from_str(&body)?;
        let content = parsed.text()?;
        Ok(Completion {
            content,
            model: self.settings.model.clone(),
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiGenerationConfig,
}

impl GeminiRequest {
    fn new(settings: &ProviderSettings, request: &QueryRequest) -> Self {
        let text = match request.system() {
            Some(system) => format!("{system}\n\n{}", request.prompt),
            None => request.prompt.clone(),
        };
        Self {
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart { text: Some(text) }],
            }],
            generation_config: GeminiGenerationConfig {
                max_output_tokens: settings.max_tokens,
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    max_output_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<GeminiPromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

impl GeminiResponse {
    /// Concatenated text parts of the first candidate.
    fn text(self) -> Result<String> {
        let block_reason = self.prompt_feedback.and_then(|f| f.block_reason);
        let Some(candidate) = self.candidates.into_iter().next() else {
            return Err(LlmError::ResponseFormat(match block_reason {
                Some(reason) => format!("gemini prompt blocked: {reason}"),
                None => "gemini response missing candidates".to_string(),
            }));
        };

        let text: String = candidate
            .content
            .map(|c| c.parts)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|p| p.text)
            .collect();

        if text.is_empty() {
            let reason = candidate.finish_reason.unwrap_or_else(|| "unknown".to_string());
            return Err(LlmError::ResponseFormat(format!(
                "gemini candidate has no text (finish_reason={reason})"
            )));
        }
        Ok(text)
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
            ..ProviderSettings::defaults_for(ProviderId::Google)
        }
    }

    #[test]
    fn system_instruction_is_prepended_to_the_prompt() {
        let settings = ProviderSettings::defaults_for(ProviderId::Google);
        let req = GeminiRequest::new(
            &settings,
            &QueryRequest::new("Signage HaaS at $150/month", Some("Rubric".to_string())),
        );
        let value = serde_json::to_value(&req).expect("serialize request");
        assert_eq!(
            value,
            json!({
                "contents": [{
                    "role": "user",
                    "parts": [{ "text": "Rubric\n\nSignage HaaS at $150/month" }]
                }],
                "generationConfig": { "maxOutputTokens": 4096 }
            })
        );
    }

    #[test]
    fn prompt_is_sent_verbatim_without_system() {
        let settings = ProviderSettings::defaults_for(ProviderId::Google);
        let req = GeminiRequest::new(&settings, &QueryRequest::new("just this", None));
        assert_eq!(req.contents[0].parts[0].text.as_deref(), Some("just this"));
    }

    #[test]
    fn blocked_prompt_reports_block_reason() {
        let parsed: GeminiResponse = serde_json::from_value(json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        }))
        .expect("parse response");
        let err = parsed.text().expect_err("no candidates");
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn text_parts_are_concatenated() {
        let parsed: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "Score: " }, { "text": "8" }] },
                "finishReason": "STOP"
            }]
        }))
        .expect("parse response");
        assert_eq!(parsed.text().expect("text"), "Score: 8");
    }

    #[tokio::test]
    async fn complete_uses_model_path_and_key_header() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1beta/models/gemini-1.5-pro:generateContent")
            .match_header("x-goog-api-key", "g-test")
            .match_body(Matcher::PartialJson(json!({
                "generationConfig": { "maxOutputTokens": 4096 }
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "candidates": [{ "content": { "parts": [{ "text": "Margins look thin." }] } }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = GeminiClient::new(reqwest::Client::new(), "g-test", &settings_for(&server.url()));
        let completion = client
            .complete(&QueryRequest::new("quote", Some("rubric".to_string())))
            .await
            .expect("completion succeeds");

        mock.assert_async().await;
        assert_eq!(completion.content, "Margins look thin.");
        assert_eq!(completion.model, "gemini-1.5-pro");
    }
}
