use crate::client::{Adapter, Credentials, ProviderAdapter};
use crate::provider::{ProviderId, ProviderSettings};
use std::collections::HashMap;
use std::sync::Arc;

/// Alias -> adapter mapping, built once at start-up.
///
/// Keys are stored lowercase and looked up exactly; callers normalize case.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    canonical: Vec<Arc<dyn Adapter>>,
    aliases: HashMap<String, Arc<dyn Adapter>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the three HTTP adapters in declaration order.
    pub fn from_settings(
        credentials: &Credentials,
        settings: impl Fn(ProviderId) -> ProviderSettings,
        http: reqwest::Client,
    ) -> Self {
        let mut registry = Self::new();
        for provider in ProviderId::ALL {
            registry.register(Arc::new(ProviderAdapter::new(
                provider,
                credentials.get(provider),
                settings(provider),
                http.clone(),
            )));
        }
        registry
    }

    /// Adds an adapter under its canonical name and nicknames. Re-registering a
    /// provider replaces it in place.
    pub fn register(&mut self, adapter: Arc<dyn Adapter>) {
        let provider = adapter.provider();
        match self.canonical.iter_mut().find(|a| a.provider() == provider) {
            Some(slot) => *slot = adapter.clone(),
            None => self.canonical.push(adapter.clone()),
        }
        self.aliases
            .insert(provider.as_str().to_string(), adapter.clone());
        for nickname in provider.nicknames() {
            self.aliases.insert((*nickname).to_string(), adapter.clone());
        }
    }

    pub fn resolve(&self, alias: &str) -> Option<Arc<dyn Adapter>> {
        self.aliases.get(alias).cloned()
    }

    /// One adapter per canonical provider, in registration order.
    pub fn canonical(&self) -> impl Iterator<Item = &Arc<dyn Adapter>> {
        self.canonical.iter()
    }

    pub fn aliases(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self.aliases.keys().map(String::as_str).collect();
        out.sort_unstable();
        out
    }
}
