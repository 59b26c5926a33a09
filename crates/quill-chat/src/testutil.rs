// SPDX-FileCopyrightText: 2026 Quill Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared test doubles: an in-memory vault, a recording notifier, and a
//! scripted completion provider.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use futures::StreamExt;
use quill_core::traits::{ChunkStream, CompletionProvider, Notifier, VaultStore};
use quill_core::types::{CompletionChunk, CompletionRequest, CompletionResponse};
use quill_core::QuillError;

#[derive(Default)]
pub struct MemoryVault {
    files: Mutex<HashMap<String, String>>,
    directories: Mutex<HashSet<String>>,
}

impl MemoryVault {
    pub fn seed(&self, path: &str, content: &str) {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), content.to_string());
    }

    pub fn read(&self, path: &str) -> Option<String> {
        self.files.lock().unwrap().get(path).cloned()
    }

    pub fn files(&self) -> HashMap<String, String> {
        self.files.lock().unwrap().clone()
    }

    pub fn directories(&self) -> HashSet<String> {
        self.directories.lock().unwrap().clone()
    }
}

#[async_trait]
impl VaultStore for MemoryVault {
    async fn file_exists(&self, path: &str) -> Result<bool, QuillError> {
        Ok(self.files.lock().unwrap().contains_key(path))
    }

    async fn write_file(&self, path: &str, content: &str) -> Result<(), QuillError> {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), content.to_string());
        Ok(())
    }

    async fn create_directory(&self, path: &str) -> Result<(), QuillError> {
        self.directories.lock().unwrap().insert(path.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

/// A provider that replays a fixed script instead of calling out.
#[derive(Default)]
pub struct MockProvider {
    /// Chunks yielded in order by `stream`.
    pub chunks: Vec<CompletionChunk>,
    /// When set, the stream ends with this provider error after the chunks.
    pub trailing_error: Option<String>,
    /// When set, `stream` itself fails with this message.
    pub fail_on_request: Option<String>,
    /// When set, the stream never yields (for cancellation tests).
    pub pending: bool,
}

impl MockProvider {
    pub fn completing(texts: &[&str]) -> Self {
        let mut chunks: Vec<CompletionChunk> = texts
            .iter()
            .map(|t| CompletionChunk {
                text: Some(t.to_string()),
                finish_reason: None,
                usage: None,
            })
            .collect();
        chunks.push(CompletionChunk {
            text: None,
            finish_reason: Some("stop".into()),
            usage: None,
        });
        Self {
            chunks,
            ..Self::default()
        }
    }
}

#[async_trait]
impl CompletionProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, QuillError> {
        Err(QuillError::Internal("complete is not scripted".into()))
    }

    async fn stream(&self, _request: CompletionRequest) -> Result<ChunkStream, QuillError> {
        if let Some(message) = &self.fail_on_request {
            return Err(QuillError::Provider {
                message: message.clone(),
                source: None,
            });
        }
        if self.pending {
            return Ok(futures::stream::pending().boxed());
        }
        let mut items: Vec<Result<CompletionChunk, QuillError>> =
            self.chunks.iter().cloned().map(Ok).collect();
        if let Some(message) = &self.trailing_error {
            items.push(Err(QuillError::Provider {
                message: message.clone(),
                source: None,
            }));
        }
        Ok(futures::stream::iter(items).boxed())
    }
}
