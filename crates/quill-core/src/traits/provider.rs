// SPDX-FileCopyrightText: 2026 Quill Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Remote completion interface.

use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

use crate::error::QuillError;
use crate::types::{CompletionChunk, CompletionRequest, CompletionResponse};

/// A stream of incremental completion chunks.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<CompletionChunk, QuillError>> + Send>>;

/// Adapter for a remote completion API.
///
/// Implementations handle transport, authentication, and wire formats for
/// both request payload shapes ([`crate::types::RequestPayload`]); transport
/// and API failures surface as [`QuillError::Provider`].
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Returns the provider's name (e.g. "openai").
    fn name(&self) -> &str;

    /// Sends a completion request and returns the full response.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, QuillError>;

    /// Sends a completion request and returns a stream of response chunks.
    async fn stream(&self, request: CompletionRequest) -> Result<ChunkStream, QuillError>;
}
