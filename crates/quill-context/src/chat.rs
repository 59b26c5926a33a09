// SPDX-FileCopyrightText: 2026 Quill Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat turn-list rendering for chat-style models.
//!
//! The outgoing list always opens with a synthetic system turn carrying the
//! conversation preamble, stamped with the conversation start time. It is
//! present even when the preamble is empty so the request shape stays
//! uniform.

use quill_core::types::{ChatTurn, Message, Role};

/// Sentinel id of the synthetic leading system turn.
pub const PREAMBLE_TURN_ID: &str = "preamble";

/// Renders the ordered turn list for a chat-style request: preamble turn,
/// selected history, then the new user turn.
pub fn render_turns(
    preamble: &str,
    started_at: i64,
    history: &[&Message],
    new_id: &str,
    new_prompt: &str,
    new_created_at: i64,
) -> Vec<ChatTurn> {
    let mut turns = Vec::with_capacity(history.len() + 2);

    turns.push(ChatTurn {
        id: PREAMBLE_TURN_ID.to_string(),
        role: Role::System,
        content: preamble.to_string(),
        created_at: started_at,
    });

    for message in history {
        turns.push(ChatTurn {
            id: message.id.0.clone(),
            role: message.role(),
            content: message.content().to_string(),
            created_at: message.created_at,
        });
    }

    turns.push(ChatTurn {
        id: new_id.to_string(),
        role: Role::User,
        content: new_prompt.to_string(),
        created_at: new_created_at,
    });

    turns
}
