// SPDX-FileCopyrightText: 2026 Quill Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memory-tiered selection of transcript messages for the outgoing context.
//!
//! Selection runs in three passes over the transcript:
//!
//! 1. `core` messages are taken unconditionally and never count against the
//!    memory cap.
//! 2. `remembered` messages fill the cap, most recent first.
//! 3. `default` messages fill whatever cap room remains, most recent first.
//!
//! The combined result is re-sorted into chronological order so the rendered
//! context always reads oldest to newest. `forgotten` and `system` messages
//! are never selected.

use quill_core::types::{MemoryState, Message};

/// Selects the messages to include in the next built context.
///
/// `max_memories == 0` means unlimited: every non-core eligible message is
/// taken.
pub fn select_memories(messages: &[Message], max_memories: usize) -> Vec<&Message> {
    let cap = if max_memories == 0 {
        usize::MAX
    } else {
        max_memories
    };

    let mut picked: Vec<usize> = messages
        .iter()
        .enumerate()
        .filter(|(_, m)| m.memory_state == MemoryState::Core)
        .map(|(idx, _)| idx)
        .collect();

    let mut capped = 0usize;
    for state in [MemoryState::Remembered, MemoryState::Default] {
        for (idx, message) in messages.iter().enumerate().rev() {
            if capped >= cap {
                break;
            }
            if message.memory_state == state {
                picked.push(idx);
                capped += 1;
            }
        }
    }

    // Chronological output order; the index breaks created_at ties in
    // append order.
    picked.sort_unstable_by_key(|&idx| (messages[idx].created_at, idx));
    picked.into_iter().map(|idx| &messages[idx]).collect()
}
