// SPDX-FileCopyrightText: 2026 Quill Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Token counting over the tiktoken BPE vocabularies.
//!
//! Pure and deterministic: the same text and family always produce the same
//! count, and counting never fails. Counting with the wrong family for a
//! model under- or over-estimates but is not an error.

use std::sync::OnceLock;

use tiktoken_rs::{cl100k_base, p50k_base, CoreBPE};

use crate::models::TokenFamily;

static GPT3_BPE: OnceLock<CoreBPE> = OnceLock::new();
static GPT4_BPE: OnceLock<CoreBPE> = OnceLock::new();

fn bpe_for(family: TokenFamily) -> &'static CoreBPE {
    match family {
        TokenFamily::Gpt3 => GPT3_BPE.get_or_init(|| {
            p50k_base().expect("p50k_base vocabulary is embedded in the binary")
        }),
        TokenFamily::Gpt4 => GPT4_BPE.get_or_init(|| {
            cl100k_base().expect("cl100k_base vocabulary is embedded in the binary")
        }),
    }
}

/// Counts the tokens in `text` under the given tokenizer family.
pub fn count(text: &str, family: TokenFamily) -> usize {
    bpe_for(family).encode_ordinary(text).len()
}
