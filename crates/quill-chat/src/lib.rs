// SPDX-FileCopyrightText: 2026 Quill Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation lifecycle for Quill.
//!
//! Ties the context engine to a completion provider: conversations and
//! their settings, the bounded conversation registry, the chat session
//! (streaming sends with cancellation), and Markdown transcript
//! persistence into the host vault.

pub mod conversation;
pub mod registry;
pub mod session;
pub mod transcript;

#[cfg(test)]
pub(crate) mod testutil;

pub use conversation::{Conversation, ConversationSettings, UserDraft, UserTurn, DEFAULT_TITLE};
pub use registry::{ConversationRegistry, SharedConversation};
pub use session::{ChatSession, SendOutcome};
pub use transcript::{render_transcript, sanitize_title, save_conversation, SaveOutcome};
