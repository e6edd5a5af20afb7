//! Single-provider and multi-provider consultation.

use quotee_llm::{ProviderId, ProviderRegistry, QueryRequest, QueryResult};
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Built-in system instruction used when neither `--system` nor the config supplies one.
pub const QUOTE_VALIDATION_SYSTEM: &str = "You are an IT services pricing expert helping validate MSP quotes.

When reviewing quotes, consider:
1. Is the pricing competitive for the SW Florida MSP market?
2. Are margins sustainable (target 40-60%)?
3. What are comparable market rates for similar services?
4. Are there any pricing gaps or risks?
5. Is the scope clearly defined with appropriate exclusions?

Always provide:
- Confidence score (1-10)
- Specific recommendations
- Market rate comparisons when possible
";

/// Receives progress while consult mode walks the providers.
pub trait ConsultObserver {
    fn started(&mut self, _provider: ProviderId) {}
    fn finished(&mut self, _provider: ProviderId, _result: &QueryResult) {}
}

impl ConsultObserver for () {}

/// Results of consult mode, in provider declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsultReport {
    pub results: Vec<(ProviderId, QueryResult)>,
}

impl Serialize for ConsultReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.results.len()))?;
        for (provider, result) in &self.results {
            map.serialize_entry(provider.as_str(), result)?;
        }
        map.end()
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown provider {alias:?}; expected one of: {}", .known.join(", "))]
pub struct UnknownProvider {
    pub alias: String,
    pub known: Vec<String>,
}

/// One invocation's prompt and system instruction, bound to a registry.
pub struct Consultation<'a> {
    registry: &'a ProviderRegistry,
    request: QueryRequest,
}

impl<'a> Consultation<'a> {
    pub fn new(registry: &'a ProviderRegistry, request: QueryRequest) -> Self {
        Self { registry, request }
    }

    /// Queries the adapter registered under `alias` exactly once.
    #[tracing::instrument(level = "info", skip(self))]
    pub async fn single(&self, alias: &str) -> Result<QueryResult, UnknownProvider> {
        let adapter = self.registry.resolve(alias).ok_or_else(|| UnknownProvider {
            alias: alias.to_string(),
            known: self
                .registry
                .aliases()
                .into_iter()
                .map(str::to_string)
                .collect(),
        })?;
        Ok(adapter.query(&self.request).await)
    }

    /// Queries every canonical provider in order. A failure never skips the rest.
    #[tracing::instrument(level = "info", skip_all)]
    pub async fn consult(&self, observer: &mut dyn ConsultObserver) -> ConsultReport {
        let mut report = ConsultReport::default();
        for adapter in self.registry.canonical() {
            let provider = adapter.provider();
            observer.started(provider);
            let result = adapter.query(&self.request).await;
            tracing::info!(%provider, success = result.is_success(), "provider consulted");
            observer.finished(provider, &result);
            report.results.push((provider, result));
        }
        report
    }
}

/// Picks the system instruction: explicit flag, then config, then the built-in rubric.
pub fn resolve_system_prompt(flag: Option<&str>, configured: Option<&str>) -> String {
    flag.filter(|s| !s.trim().is_empty())
        .or(configured)
        .unwrap_or(QUOTE_VALIDATION_SYSTEM)
        .to_string()
}
