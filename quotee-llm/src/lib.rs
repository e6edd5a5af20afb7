//! Vendor adapters for quote validation.
//!
//! Pure HTTP clients for OpenAI, Google Gemini and Anthropic, normalized into a
//! single [`QueryResult`] shape.

#[cfg(feature = "anthropic")]
mod anthropic;
mod client;
mod error;
#[cfg(feature = "google")]
mod gemini;
#[cfg(feature = "openai")]
mod openai;
mod provider;
mod registry;
mod types;

pub use client::{Adapter, Credentials, ProviderAdapter, build_http_client};
pub use error::{LlmError, Result};
pub use provider::{DEFAULT_MAX_TOKENS, ProviderId, ProviderSettings};
pub use registry::ProviderRegistry;
pub use types::{Completion, QueryRequest, QueryResult};
