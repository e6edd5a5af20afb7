//! The closed set of supported vendors and their per-vendor constants.

use serde::Serialize;
use std::fmt;

/// Output ceiling sent to every vendor.
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    #[serde(rename = "openai")]
    OpenAi,
    Google,
    Anthropic,
}

impl ProviderId {
    /// Declaration order; consult mode and listings iterate in this order.
    pub const ALL: [ProviderId; 3] = [Self::OpenAi, Self::Google, Self::Anthropic];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Google => "google",
            Self::Anthropic => "anthropic",
        }
    }

    /// Informal names accepted in addition to the canonical one.
    pub fn nicknames(self) -> &'static [&'static str] {
        match self {
            Self::OpenAi => &["gpt"],
            Self::Google => &["gemini"],
            Self::Anthropic => &["claude"],
        }
    }

    pub fn env_var(self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Google => "GOOGLE_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4o",
            Self::Google => "gemini-1.5-pro",
            Self::Anthropic => "claude-sonnet-4-20250514",
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com",
            Self::Google => "https://generativelanguage.googleapis.com",
            Self::Anthropic => "https://api.anthropic.com",
        }
    }

    /// Cargo feature gating this vendor's client.
    pub fn feature(self) -> &'static str {
        self.as_str()
    }

    pub fn is_compiled_in(self) -> bool {
        match self {
            Self::OpenAi => cfg!(feature = "openai"),
            Self::Google => cfg!(feature = "google"),
            Self::Anthropic => cfg!(feature = "anthropic"),
        }
    }

    /// Resolves a lowercase canonical name or nickname.
    pub fn from_alias(alias: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == alias || p.nicknames().contains(&alias))
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved per-vendor request settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    pub model: String,
    pub base_url: String,
    pub max_tokens: u32,
}

impl ProviderSettings {
    pub fn defaults_for(provider: ProviderId) -> Self {
        Self {
            model: provider.default_model().to_string(),
            base_url: provider.default_base_url().to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }
}
