use crate::provider::ProviderId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub prompt: String,
    pub system: Option<String>,
}

impl QueryRequest {
    pub fn new(prompt: impl Into<String>, system: Option<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system,
        }
    }

    /// System instruction, ignoring blank values.
    pub fn system(&self) -> Option<&str> {
        self.system.as_deref().filter(|s| !s.trim().is_empty())
    }
}

/// Normalized outcome of one adapter call.
///
/// Serializes as `{"success": true, "content", "provider", "model"}` or
/// `{"success": false, "error"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "QueryResultRecord", try_from = "QueryResultRecord")]
pub enum QueryResult {
    Success {
        content: String,
        provider: ProviderId,
        model: String,
    },
    Failure {
        error: String,
    },
}

impl QueryResult {
    pub fn failure(error: impl ToString) -> Self {
        Self::Failure {
            error: error.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Vendor reply after envelope extraction, before it is tagged with a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub content: String,
    pub model: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct QueryResultRecord {
    success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl From<QueryResult> for QueryResultRecord {
    fn from(v: QueryResult) -> Self {
        match v {
            QueryResult::Success {
                content,
                provider,
                model,
            } => Self {
                success: true,
                content: Some(content),
                provider: Some(provider.as_str().to_string()),
                model: Some(model),
                error: None,
            },
            QueryResult::Failure { error } => Self {
                success: false,
                content: None,
                provider: None,
                model: None,
                error: Some(error),
            },
        }
    }
}

impl TryFrom<QueryResultRecord> for QueryResult {
    type Error = String;

    fn try_from(v: QueryResultRecord) -> std::result::Result<Self, Self::Error> {
        if !v.success {
            return Ok(Self::Failure {
                error: v.error.unwrap_or_default(),
            });
        }
        let provider = v.provider.unwrap_or_default();
        let provider = ProviderId::from_alias(&provider)
            .ok_or_else(|| format!("unknown provider {provider:?}"))?;
        Ok(Self::Success {
            content: v.content.unwrap_or_default(),
            provider,
            model: v.model.unwrap_or_default(),
        })
    }
}
