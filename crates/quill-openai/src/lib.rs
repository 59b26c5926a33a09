// SPDX-FileCopyrightText: 2026 Quill Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI completion provider.
//!
//! Implements [`CompletionProvider`] over the OpenAI HTTP API, covering
//! both the chat endpoint and the legacy text-completion endpoint, with
//! SSE streaming and transient error retry.

pub mod client;
pub mod sse;
pub mod types;

use async_trait::async_trait;
use quill_core::traits::{ChunkStream, CompletionProvider};
use quill_core::types::{CompletionRequest, CompletionResponse};
use quill_core::QuillError;

pub use client::OpenAiClient;

/// Environment variable consulted when no key is configured.
const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// The OpenAI provider.
pub struct OpenAiProvider {
    client: OpenAiClient,
}

impl OpenAiProvider {
    /// Creates a provider, resolving the API key from `api_key` or, when
    /// absent, the `OPENAI_API_KEY` environment variable.
    pub fn new(api_key: Option<String>) -> Result<Self, QuillError> {
        let key = match api_key {
            Some(key) if !key.trim().is_empty() => key,
            _ => std::env::var(API_KEY_ENV).map_err(|_| {
                QuillError::Config(format!(
                    "no OpenAI API key: set openai.api_key or the {API_KEY_ENV} environment variable"
                ))
            })?,
        };
        Ok(Self {
            client: OpenAiClient::new(&key)?,
        })
    }

    pub fn from_client(client: OpenAiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, QuillError> {
        self.client.complete(request).await
    }

    async fn stream(&self, request: CompletionRequest) -> Result<ChunkStream, QuillError> {
        self.client.stream(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_key_constructs_a_provider() {
        let provider = OpenAiProvider::new(Some("sk-test".into())).unwrap();
        assert_eq!(provider.name(), "openai");
    }

    #[test]
    fn blank_key_falls_back_to_the_environment() {
        // A blank configured key must not silently authenticate as "Bearer ".
        if std::env::var(API_KEY_ENV).is_err() {
            let result = OpenAiProvider::new(Some("   ".into()));
            assert!(matches!(result, Err(QuillError::Config(_))));
        }
    }
}
