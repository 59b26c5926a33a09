// SPDX-FileCopyrightText: 2026 Quill Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Quill conversation engine.
//!
//! This crate provides the error type, common message and request types,
//! the collaborator trait definitions (completion provider, vault
//! persistence, notifier), the token counter, and the static model
//! registry used throughout the Quill workspace.

pub mod error;
pub mod models;
pub mod tokens;
pub mod traits;
pub mod types;

pub use error::QuillError;
pub use models::{AdapterKind, ModelDefinition, TokenFamily, DEFAULT_MODEL};
pub use traits::{ChunkStream, CompletionProvider, Notifier, VaultStore};
pub use types::{
    ChatTurn, CompletionChunk, CompletionRequest, CompletionResponse, ConversationId,
    MemoryState, Message, MessageId, RequestPayload, Role, TokenUsage, TurnPayload,
};
