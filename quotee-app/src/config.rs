//! Optional TOML configuration for quotee.
//!
//! Credentials are never read from here; they come from the environment only.

use quotee_llm::{ProviderId, ProviderSettings};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_PATH_ENV: &str = "QUOTEE_CONFIG";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuoteeConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeneralConfig {
    /// Alias used in single-provider mode when `--provider` is absent.
    #[serde(default)]
    pub default_provider: Option<String>,
    /// Replaces the built-in pricing rubric.
    #[serde(default)]
    pub system_prompt: Option<String>,
    /// Unset means no client-side timeout.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub openai: ProviderConfig,
    #[serde(default)]
    pub google: ProviderConfig,
    #[serde(default)]
    pub anthropic: ProviderConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

impl QuoteeConfig {
    pub async fn load(path: Option<PathBuf>) -> anyhow::Result<Self> {
        Self::load_with_env(path, |name| std::env::var(name).ok()).await
    }

    /// Explicit paths (argument or `QUOTEE_CONFIG`) must exist; the default path is optional.
    pub async fn load_with_env(
        path: Option<PathBuf>,
        env: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<Self> {
        let explicit = path.or_else(|| {
            env(CONFIG_PATH_ENV)
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
        });

        let mut cfg = match explicit {
            Some(path) => Self::read(&path).await?,
            None => {
                let path = default_config_path(&env);
                match tokio::fs::try_exists(&path).await {
                    Ok(true) => Self::read(&path).await?,
                    _ => {
                        tracing::debug!(path = %path.display(), "no config file; using defaults");
                        Self::default()
                    }
                }
            }
        };

        cfg.apply_env_overrides(&env);
        cfg.validate()?;
        Ok(cfg)
    }

    async fn read(path: &Path) -> anyhow::Result<Self> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| anyhow::anyhow!("read config {}: {e}", path.display()))?;
        let cfg: QuoteeConfig = toml::from_str(&contents)
            .map_err(|e| anyhow::anyhow!("parse config {}: {e}", path.display()))?;
        tracing::debug!(path = %path.display(), "config loaded");
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self, env: &impl Fn(&str) -> Option<String>) {
        if let Some(v) = env("QUOTEE_DEFAULT_PROVIDER") {
            if !v.trim().is_empty() {
                self.general.default_provider = Some(v);
            }
        }
        for provider in ProviderId::ALL {
            let var = format!("QUOTEE_{}_MODEL", provider.as_str().to_ascii_uppercase());
            if let Some(v) = env(&var) {
                if !v.trim().is_empty() {
                    self.providers.get_mut(provider).model = Some(v);
                }
            }
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        if let Some(alias) = self.general.default_provider.as_deref() {
            if ProviderId::from_alias(&alias.trim().to_ascii_lowercase()).is_none() {
                return Err(anyhow::anyhow!(
                    "general.default_provider {alias:?} is not a known provider"
                ));
            }
        }
        if self.general.request_timeout_secs == Some(0) {
            return Err(anyhow::anyhow!("general.request_timeout_secs must be > 0"));
        }
        for provider in ProviderId::ALL {
            let p = self.providers.get(provider);
            if p.model.as_deref().is_some_and(|m| m.trim().is_empty()) {
                return Err(anyhow::anyhow!("providers.{provider}.model must not be empty"));
            }
            if p.base_url.as_deref().is_some_and(|u| u.trim().is_empty()) {
                return Err(anyhow::anyhow!(
                    "providers.{provider}.base_url must not be empty"
                ));
            }
            if p.max_tokens == Some(0) {
                return Err(anyhow::anyhow!("providers.{provider}.max_tokens must be > 0"));
            }
        }
        Ok(())
    }

    /// Lowercased default alias; `openai` when unconfigured.
    pub fn default_provider(&self) -> String {
        self.general
            .default_provider
            .as_deref()
            .map(|a| a.trim().to_ascii_lowercase())
            .unwrap_or_else(|| ProviderId::OpenAi.as_str().to_string())
    }

    pub fn system_prompt(&self) -> Option<&str> {
        self.general
            .system_prompt
            .as_deref()
            .filter(|s| !s.trim().is_empty())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.general.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn settings_for(&self, provider: ProviderId) -> ProviderSettings {
        let defaults = ProviderSettings::defaults_for(provider);
        let p = self.providers.get(provider);
        ProviderSettings {
            model: p.model.clone().unwrap_or(defaults.model),
            base_url: p.base_url.clone().unwrap_or(defaults.base_url),
            max_tokens: p.max_tokens.unwrap_or(defaults.max_tokens),
        }
    }
}

impl ProvidersConfig {
    fn get(&self, provider: ProviderId) -> &ProviderConfig {
        match provider {
            ProviderId::OpenAi => &self.openai,
            ProviderId::Google => &self.google,
            ProviderId::Anthropic => &self.anthropic,
        }
    }

    fn get_mut(&mut self, provider: ProviderId) -> &mut ProviderConfig {
        match provider {
            ProviderId::OpenAi => &mut self.openai,
            ProviderId::Google => &mut self.google,
            ProviderId::Anthropic => &mut self.anthropic,
        }
    }
}

pub fn default_config_path(env: &impl Fn(&str) -> Option<String>) -> PathBuf {
    let home = env("HOME").unwrap_or_else(|| ".".to_string());
    Path::new(&home).join(".quotee").join("config.toml")
}
