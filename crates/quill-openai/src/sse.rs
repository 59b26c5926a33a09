// SPDX-FileCopyrightText: 2026 Quill Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SSE stream parsing for OpenAI streaming responses.
//!
//! OpenAI emits unnamed SSE events whose `data` field carries one JSON
//! chunk, terminated by the literal `[DONE]` sentinel. Both endpoints are
//! normalized into [`CompletionChunk`]s: chat chunks carry their text in
//! `choices[0].delta.content`, legacy completion chunks in
//! `choices[0].text`.

use eventsource_stream::Eventsource;
use futures::stream::StreamExt;
use quill_core::traits::ChunkStream;
use quill_core::types::CompletionChunk;
use quill_core::QuillError;
use serde::de::DeserializeOwned;

use crate::types::{ChatChunk, PromptChunk};

/// Stream terminator sent after the final content chunk.
const DONE_SENTINEL: &str = "[DONE]";

/// Parses a streaming `/chat/completions` response.
pub fn parse_chat_stream(response: reqwest::Response) -> ChunkStream {
    parse_stream(response, |chunk: ChatChunk| {
        let (text, finish_reason) = match chunk.choices.first() {
            Some(choice) => (choice.delta.content.clone(), choice.finish_reason.clone()),
            None => (None, None),
        };
        CompletionChunk {
            text,
            finish_reason,
            usage: chunk.usage.map(Into::into),
        }
    })
}

/// Parses a streaming legacy `/completions` response.
pub fn parse_completion_stream(response: reqwest::Response) -> ChunkStream {
    parse_stream(response, |chunk: PromptChunk| {
        let (text, finish_reason) = match chunk.choices.first() {
            Some(choice) => (Some(choice.text.clone()), choice.finish_reason.clone()),
            None => (None, None),
        };
        CompletionChunk {
            text,
            finish_reason,
            usage: chunk.usage.map(Into::into),
        }
    })
}

fn parse_stream<T: DeserializeOwned + 'static>(
    response: reqwest::Response,
    extract: fn(T) -> CompletionChunk,
) -> ChunkStream {
    let events = response.bytes_stream().eventsource();

    Box::pin(events.filter_map(move |result| async move {
        match result {
            Ok(event) => {
                if event.data.trim() == DONE_SENTINEL {
                    return None;
                }
                Some(
                    serde_json::from_str::<T>(&event.data)
                        .map(extract)
                        .map_err(|e| QuillError::Provider {
                            message: format!("failed to parse stream chunk: {e}"),
                            source: Some(Box::new(e)),
                        }),
                )
            }
            Err(e) => Some(Err(QuillError::Provider {
                message: format!("SSE stream error: {e}"),
                source: None,
            })),
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    /// Serves raw SSE text through wiremock to get a real streaming response.
    async fn mock_sse_response(sse_text: &str) -> reqwest::Response {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(sse_text.to_string()),
            )
            .mount(&server)
            .await;

        reqwest::get(&server.uri()).await.unwrap()
    }

    #[tokio::test]
    async fn chat_chunks_yield_delta_content() {
        let sse = "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"},\"finish_reason\":null}]}\n\n\
                   data: {\"choices\":[{\"delta\":{\"content\":\"lo\"},\"finish_reason\":null}]}\n\n\
                   data: {\"choices\":[{\"delta\":{},\"finish_reason\":\"stop\"}]}\n\n\
                   data: [DONE]\n\n";
        let mut stream = parse_chat_stream(mock_sse_response(sse).await);

        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first.text.as_deref(), Some("Hel"));
        assert!(first.finish_reason.is_none());

        let second = stream.next().await.unwrap().unwrap();
        assert_eq!(second.text.as_deref(), Some("lo"));

        let last = stream.next().await.unwrap().unwrap();
        assert!(last.text.is_none());
        assert_eq!(last.finish_reason.as_deref(), Some("stop"));

        // [DONE] ends the stream without producing an item.
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn completion_chunks_yield_choice_text() {
        let sse = "data: {\"choices\":[{\"text\":\"Hi\",\"finish_reason\":null}]}\n\n\
                   data: {\"choices\":[{\"text\":\"!\",\"finish_reason\":\"stop\"}]}\n\n\
                   data: [DONE]\n\n";
        let mut stream = parse_completion_stream(mock_sse_response(sse).await);

        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first.text.as_deref(), Some("Hi"));

        let last = stream.next().await.unwrap().unwrap();
        assert_eq!(last.text.as_deref(), Some("!"));
        assert_eq!(last.finish_reason.as_deref(), Some("stop"));

        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn malformed_chunks_surface_as_errors() {
        let sse = "data: {not json}\n\ndata: [DONE]\n\n";
        let mut stream = parse_chat_stream(mock_sse_response(sse).await);

        let err = stream.next().await.unwrap().unwrap_err();
        assert!(err.to_string().contains("failed to parse stream chunk"));
    }

    #[tokio::test]
    async fn usage_bearing_chunks_are_forwarded() {
        let sse = "data: {\"choices\":[],\"usage\":{\"prompt_tokens\":12,\"completion_tokens\":34,\"total_tokens\":46}}\n\n\
                   data: [DONE]\n\n";
        let mut stream = parse_chat_stream(mock_sse_response(sse).await);

        let chunk = stream.next().await.unwrap().unwrap();
        assert_eq!(chunk.usage.unwrap().total_tokens, 46);
    }
}
