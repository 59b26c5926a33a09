// SPDX-FileCopyrightText: 2026 Quill Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation context engine.
//!
//! Holds the append-only [`MessageStore`] for a conversation and builds the
//! outgoing request context from it: memory-tiered selection, adapter-aware
//! rendering (flat prompt or chat turn list), token counting, and response
//! budgeting.

pub mod builder;
pub mod chat;
pub mod flat;
pub mod selection;
pub mod store;

pub use builder::{BuildSettings, BuiltContext, ContextBuilder, ContextPayload, NewTurn};
pub use chat::PREAMBLE_TURN_ID;
pub use flat::{normalize_whitespace, FlatPrompt};
pub use selection::select_memories;
pub use store::{MessageStore, NewMessage};
