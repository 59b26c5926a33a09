// SPDX-FileCopyrightText: 2026 Quill Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator interfaces consumed by the conversation core.
//!
//! The core shapes payloads and transcripts; actually sending requests,
//! writing files, and alerting the user are the host application's job,
//! reached through these traits.

pub mod notify;
pub mod provider;
pub mod vault;

pub use notify::Notifier;
pub use provider::{ChunkStream, CompletionProvider};
pub use vault::VaultStore;
