//! LLM provider layer for NENO.
//!
//! # Architecture
//!
//! - [`traits::LlmProvider`] — capability trait every adapter implements
//! - [`spec`] — static specs for the supported vendors (OpenAI, Groq, OpenRouter, local)
//! - [`http_provider::HttpProvider`] — OpenAI-compatible HTTP client (blocking + SSE)
//! - [`registry::ProviderRegistry`] — configured adapters, priority order, fallback
//! - [`transcription`] — Whisper speech-to-text for the voice path

pub mod error;
pub mod http_provider;
pub mod registry;
pub mod spec;
pub mod stream;
pub mod traits;
pub mod transcription;

// Re-export main types for convenience
pub use error::{ProviderError, ProviderFailure, RegistryError};
pub use http_provider::{create_provider, HttpProvider};
pub use registry::{ChatRequest, ProviderInfo, ProviderRegistry, ProviderSelection, ProviderStats};
pub use spec::{ProviderKind, ProviderSpec, PROVIDERS};
pub use stream::{collect_stream, ChatStream, Reply};
pub use traits::{GenerateOptions, LlmProvider};
pub use transcription::{TranscriptionProvider, WhisperTranscriber};
