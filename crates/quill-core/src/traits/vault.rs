// SPDX-FileCopyrightText: 2026 Quill Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Host vault persistence interface, used for saving conversation transcripts.

use async_trait::async_trait;

use crate::error::QuillError;

/// File persistence provided by the host application.
///
/// Paths are vault-relative and use `/` separators regardless of platform.
#[async_trait]
pub trait VaultStore: Send + Sync {
    /// Returns whether a file exists at the given path.
    async fn file_exists(&self, path: &str) -> Result<bool, QuillError>;

    /// Writes `content` to `path`, replacing any existing file.
    async fn write_file(&self, path: &str, content: &str) -> Result<(), QuillError>;

    /// Creates a directory (and missing parents) at the given path.
    async fn create_directory(&self, path: &str) -> Result<(), QuillError>;
}
