// SPDX-FileCopyrightText: 2026 Quill Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat session: drives streaming sends against the completion provider.
//!
//! The session enforces at most one in-flight send per conversation,
//! accumulates streamed deltas into a single assistant message, supports
//! cooperative cancellation (the user turn and partial output are both
//! discarded, leaving the store unchanged), converts provider failures into
//! synthetic system records, and autosaves transcripts after settled sends.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError};

use futures::StreamExt;
use quill_config::model::HistoryConfig;
use quill_core::traits::{CompletionProvider, Notifier, VaultStore};
use quill_core::types::{CompletionResponse, ConversationId, MessageId};
use quill_core::QuillError;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::conversation::{Conversation, UserDraft};
use crate::registry::ConversationRegistry;
use crate::transcript::{self, SaveOutcome};

/// How a send attempt settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Nothing to do: empty prompt or no current conversation.
    Skipped,
    /// The caller cancelled; partial output was discarded and the store is
    /// unchanged from before the send.
    Cancelled,
    /// The assistant response was stored under this message id.
    Completed(MessageId),
    /// The provider failed; a synthetic system record was stored under
    /// this message id.
    Failed(MessageId),
}

/// Drives conversations against a completion provider.
pub struct ChatSession {
    provider: Arc<dyn CompletionProvider>,
    vault: Arc<dyn VaultStore>,
    notifier: Arc<dyn Notifier>,
    history: HistoryConfig,
    registry: Mutex<ConversationRegistry>,
    in_flight: std::sync::Mutex<HashSet<ConversationId>>,
    autosave_paused: AtomicBool,
    last_saved: std::sync::Mutex<HashMap<ConversationId, MessageId>>,
}

/// Clears the in-flight marker when a send settles, on any exit path.
struct FlightGuard<'a> {
    session: &'a ChatSession,
    id: ConversationId,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.session.lock_in_flight().remove(&self.id);
    }
}

impl ChatSession {
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        vault: Arc<dyn VaultStore>,
        notifier: Arc<dyn Notifier>,
        history: HistoryConfig,
        max_conversations: usize,
    ) -> Self {
        Self {
            provider,
            vault,
            notifier,
            history,
            registry: Mutex::new(ConversationRegistry::new(max_conversations)),
            in_flight: std::sync::Mutex::new(HashSet::new()),
            autosave_paused: AtomicBool::new(false),
            last_saved: std::sync::Mutex::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &Mutex<ConversationRegistry> {
        &self.registry
    }

    /// Starts a conversation in the registry and makes it current.
    pub async fn start(
        &self,
        model: &str,
        preamble: &str,
        title: Option<&str>,
        settings: crate::conversation::ConversationSettings,
    ) -> Result<ConversationId, QuillError> {
        let shared = {
            let mut registry = self.registry.lock().await;
            registry.start_conversation(model, preamble, title, settings)?
        };
        let id = shared.lock().await.id().clone();
        Ok(id)
    }

    /// Suspends background autosaving (used while the host edits titles).
    pub fn pause_autosave(&self) {
        self.autosave_paused.store(true, Ordering::SeqCst);
    }

    pub fn resume_autosave(&self) {
        self.autosave_paused.store(false, Ordering::SeqCst);
    }

    pub fn autosave_paused(&self) -> bool {
        self.autosave_paused.load(Ordering::SeqCst)
    }

    /// Whether a send is currently in flight for `id`.
    pub fn is_busy(&self, id: &ConversationId) -> bool {
        self.lock_in_flight().contains(id)
    }

    fn lock_in_flight(&self) -> std::sync::MutexGuard<'_, HashSet<ConversationId>> {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_last_saved(&self) -> std::sync::MutexGuard<'_, HashMap<ConversationId, MessageId>> {
        self.last_saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self, id: &ConversationId) -> Result<FlightGuard<'_>, QuillError> {
        let mut set = self.lock_in_flight();
        if !set.insert(id.clone()) {
            return Err(QuillError::SendInFlight {
                conversation: id.0.clone(),
            });
        }
        Ok(FlightGuard {
            session: self,
            id: id.clone(),
        })
    }

    /// Sends `prompt` to the registry's current conversation.
    pub async fn send_to_current(
        &self,
        prompt: &str,
        cancel: &CancellationToken,
        live: Option<UnboundedSender<String>>,
    ) -> Result<SendOutcome, QuillError> {
        let current = { self.registry.lock().await.current() };
        let Some(conversation) = current else {
            debug!("no current conversation; nothing to send");
            return Ok(SendOutcome::Skipped);
        };
        self.send(&conversation, prompt, cancel, live).await
    }

    /// Sends `prompt` as a new user turn and streams the response into a
    /// single assistant message.
    ///
    /// The conversation lock is held only while appending; the host can read
    /// other conversations while a response streams. Errors with
    /// [`QuillError::SendInFlight`] when a send for this conversation has not
    /// yet settled.
    pub async fn send(
        &self,
        conversation: &Mutex<Conversation>,
        prompt: &str,
        cancel: &CancellationToken,
        live: Option<UnboundedSender<String>>,
    ) -> Result<SendOutcome, QuillError> {
        if prompt.trim().is_empty() {
            debug!("empty prompt; nothing to send");
            return Ok(SendOutcome::Skipped);
        }

        let conversation_id = { conversation.lock().await.id().clone() };
        let _guard = self.begin(&conversation_id)?;

        let result = self
            .send_inner(conversation, &conversation_id, prompt, cancel, live)
            .await;

        if let Ok(SendOutcome::Completed(_) | SendOutcome::Failed(_)) = &result {
            let guard = conversation.lock().await;
            if let Err(err) = self.autosave(&guard).await {
                warn!(conversation = %conversation_id, error = %err, "autosave failed");
            }
        }
        result
    }

    async fn send_inner(
        &self,
        conversation: &Mutex<Conversation>,
        id: &ConversationId,
        prompt: &str,
        cancel: &CancellationToken,
        live: Option<UnboundedSender<String>>,
    ) -> Result<SendOutcome, QuillError> {
        // The user turn stays a draft until the send settles, so a
        // cancellation leaves the store unchanged.
        let (draft, request) = {
            let guard = conversation.lock().await;
            let draft = guard.draft_user_message(prompt)?;
            info!(
                conversation = %id,
                prompt_tokens = draft.context.prompt_tokens,
                response_budget = draft.context.response_budget,
                "sending completion request"
            );
            let request = guard.completion_request(&draft.context, true);
            (draft, request)
        };
        let model = request.model.clone();

        let mut stream = match self.provider.stream(request).await {
            Ok(stream) => stream,
            Err(err) => {
                let message_id = self.record_failure(conversation, id, draft, err).await;
                return Ok(SendOutcome::Failed(message_id));
            }
        };

        let mut content = String::new();
        let mut finish_reason = None;
        let mut usage = None;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!(conversation = %id, "send cancelled; draft and partial response discarded");
                    return Ok(SendOutcome::Cancelled);
                }
                chunk = stream.next() => match chunk {
                    Some(Ok(chunk)) => {
                        if let Some(text) = chunk.text {
                            content.push_str(&text);
                            if let Some(tx) = &live {
                                // The receiver may be gone; streaming continues
                                // so the transcript still gets the response.
                                let _ = tx.send(text);
                            }
                        }
                        if chunk.usage.is_some() {
                            usage = chunk.usage;
                        }
                        if let Some(reason) = chunk.finish_reason {
                            finish_reason = Some(reason);
                        }
                    }
                    Some(Err(err)) => {
                        let message_id = self.record_failure(conversation, id, draft, err).await;
                        return Ok(SendOutcome::Failed(message_id));
                    }
                    None => break,
                },
            }
        }

        // Streamed responses have no server-assigned envelope; the store
        // assigns a local id.
        let response = CompletionResponse {
            id: String::new(),
            model,
            content,
            finish_reason,
            usage,
            raw: serde_json::Value::Null,
        };
        let message_id = {
            let mut guard = conversation.lock().await;
            guard.commit_user_message(draft);
            guard.add_assistant_message(response)
        };
        debug!(conversation = %id, message = %message_id, "assistant response stored");
        Ok(SendOutcome::Completed(message_id))
    }

    async fn record_failure(
        &self,
        conversation: &Mutex<Conversation>,
        id: &ConversationId,
        draft: UserDraft,
        err: QuillError,
    ) -> MessageId {
        error!(conversation = %id, error = %err, "send failed");
        self.notifier.notify(&format!("Send failed: {err}"));
        let mut guard = conversation.lock().await;
        guard.commit_user_message(draft);
        guard.add_system_message(format!("error: {err}"))
    }

    /// Saves the conversation transcript, notifying the user of the outcome.
    pub async fn save(
        &self,
        conversation: &Conversation,
        overwrite: bool,
    ) -> Result<SaveOutcome, QuillError> {
        let outcome = transcript::save_conversation(
            self.vault.as_ref(),
            conversation,
            &self.history.directory,
            overwrite,
        )
        .await?;
        match &outcome {
            SaveOutcome::Saved { path } => {
                self.notifier.notify(&format!("Conversation saved to {path}"));
            }
            SaveOutcome::SkippedDefaultTitle => {
                self.notifier
                    .notify("Rename the conversation before saving its transcript");
            }
            SaveOutcome::SkippedExisting { path } => {
                self.notifier
                    .notify(&format!("{path} already exists; save aborted"));
            }
        }
        Ok(outcome)
    }

    /// Background save: silent, overwrites its own file, and skips when
    /// autosave is off, paused, or nothing changed since the last save.
    ///
    /// Returns whether a file was written.
    pub async fn autosave(&self, conversation: &Conversation) -> Result<bool, QuillError> {
        if !self.history.autosave || self.autosave_paused() {
            return Ok(false);
        }
        let Some(last) = conversation.store().last().map(|m| m.id.clone()) else {
            return Ok(false);
        };
        if self.lock_last_saved().get(conversation.id()) == Some(&last) {
            return Ok(false);
        }

        let outcome = transcript::save_conversation(
            self.vault.as_ref(),
            conversation,
            &self.history.directory,
            true,
        )
        .await?;
        match outcome {
            SaveOutcome::Saved { .. } => {
                self.lock_last_saved()
                    .insert(conversation.id().clone(), last);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::ConversationSettings;
    use crate::testutil::{MemoryVault, MockProvider, RecordingNotifier};
    use quill_core::types::Role;
    use std::time::Duration;

    struct Harness {
        session: Arc<ChatSession>,
        vault: Arc<MemoryVault>,
        notifier: Arc<RecordingNotifier>,
        conversation: Arc<Mutex<Conversation>>,
    }

    fn harness(provider: MockProvider, history: HistoryConfig) -> Harness {
        let vault = Arc::new(MemoryVault::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let session = Arc::new(ChatSession::new(
            Arc::new(provider),
            vault.clone(),
            notifier.clone(),
            history,
            8,
        ));
        let conversation = Arc::new(Mutex::new(
            Conversation::with_model_id("gpt-3.5-turbo", ConversationSettings::default()).unwrap(),
        ));
        Harness {
            session,
            vault,
            notifier,
            conversation,
        }
    }

    #[tokio::test]
    async fn send_accumulates_the_streamed_response() {
        let h = harness(
            MockProvider::completing(&["Hel", "lo", "!"]),
            HistoryConfig::default(),
        );
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let outcome = h
            .session
            .send(&h.conversation, "Hi there", &cancel, Some(tx))
            .await
            .unwrap();

        let convo = h.conversation.lock().await;
        let SendOutcome::Completed(message_id) = outcome else {
            panic!("expected completion, got {outcome:?}");
        };
        assert_eq!(convo.store().len(), 2);
        let assistant = convo.store().get(&message_id).unwrap();
        assert_eq!(assistant.role(), Role::Assistant);
        assert_eq!(assistant.content(), "Hello!");

        let mut deltas = Vec::new();
        while let Ok(delta) = rx.try_recv() {
            deltas.push(delta);
        }
        assert_eq!(deltas, vec!["Hel", "lo", "!"]);
    }

    #[tokio::test]
    async fn empty_prompts_are_skipped() {
        let h = harness(MockProvider::completing(&["x"]), HistoryConfig::default());
        let cancel = CancellationToken::new();
        let outcome = h
            .session
            .send(&h.conversation, "   \n", &cancel, None)
            .await
            .unwrap();
        assert_eq!(outcome, SendOutcome::Skipped);
        assert!(h.conversation.lock().await.store().is_empty());
    }

    #[tokio::test]
    async fn cancellation_leaves_the_store_unchanged() {
        let provider = MockProvider {
            pending: true,
            ..MockProvider::default()
        };
        let h = harness(provider, HistoryConfig::default());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = h
            .session
            .send(&h.conversation, "Hi", &cancel, None)
            .await
            .unwrap();
        assert_eq!(outcome, SendOutcome::Cancelled);

        // As if the call had never been made: no user turn, no assistant
        // message, no system record.
        let convo = h.conversation.lock().await;
        assert!(convo.store().is_empty());
        assert!(!h.session.is_busy(convo.id()));
    }

    #[tokio::test]
    async fn host_autosave_pause_survives_a_send() {
        let history = HistoryConfig {
            autosave: true,
            directory: "Quill/History".into(),
        };
        let h = harness(MockProvider::completing(&["Hi!"]), history);
        h.conversation.lock().await.set_title("Mid-rename");
        let cancel = CancellationToken::new();

        h.session.pause_autosave();
        let outcome = h
            .session
            .send(&h.conversation, "Hello", &cancel, None)
            .await
            .unwrap();
        assert!(matches!(outcome, SendOutcome::Completed(_)));

        // The pause the host set is still in force and gated the autosave.
        assert!(h.session.autosave_paused());
        assert!(h.vault.files().is_empty());
    }

    #[tokio::test]
    async fn request_failure_becomes_a_system_record() {
        let provider = MockProvider {
            fail_on_request: Some("API returned 401".into()),
            ..MockProvider::default()
        };
        let h = harness(provider, HistoryConfig::default());
        let cancel = CancellationToken::new();

        let outcome = h
            .session
            .send(&h.conversation, "Hi", &cancel, None)
            .await
            .unwrap();
        let SendOutcome::Failed(message_id) = outcome else {
            panic!("expected failure, got {outcome:?}");
        };

        // Settled sends keep the user turn; the failure record follows it.
        let convo = h.conversation.lock().await;
        assert_eq!(convo.store().len(), 2);
        assert_eq!(convo.store().messages()[0].role(), Role::User);
        let record = convo.store().get(&message_id).unwrap();
        assert_eq!(record.role(), Role::System);
        assert!(record.content().contains("401"));
        assert!(h
            .notifier
            .messages()
            .iter()
            .any(|m| m.contains("Send failed")));
    }

    #[tokio::test]
    async fn mid_stream_failure_discards_the_partial_response() {
        let provider = MockProvider {
            chunks: vec![quill_core::types::CompletionChunk {
                text: Some("partial".into()),
                finish_reason: None,
                usage: None,
            }],
            trailing_error: Some("stream dropped".into()),
            ..MockProvider::default()
        };
        let h = harness(provider, HistoryConfig::default());
        let cancel = CancellationToken::new();

        let outcome = h
            .session
            .send(&h.conversation, "Hi", &cancel, None)
            .await
            .unwrap();
        assert!(matches!(outcome, SendOutcome::Failed(_)));

        let convo = h.conversation.lock().await;
        assert!(convo
            .store()
            .iter()
            .all(|m| m.role() != Role::Assistant));
    }

    #[tokio::test]
    async fn concurrent_sends_for_one_conversation_are_rejected() {
        let provider = MockProvider {
            pending: true,
            ..MockProvider::default()
        };
        let h = harness(provider, HistoryConfig::default());
        let cancel = CancellationToken::new();

        let session = h.session.clone();
        let conversation = h.conversation.clone();
        let task_cancel = cancel.clone();
        let first = tokio::spawn(async move {
            session.send(&conversation, "first", &task_cancel, None).await
        });
        tokio::time::sleep(Duration::from_millis(50)).await;

        let err = h
            .session
            .send(&h.conversation, "second", &cancel, None)
            .await
            .unwrap_err();
        assert!(matches!(err, QuillError::SendInFlight { .. }));

        cancel.cancel();
        assert_eq!(first.await.unwrap().unwrap(), SendOutcome::Cancelled);

        // The flag clears once the first send settles.
        let id = h.conversation.lock().await.id().clone();
        assert!(!h.session.is_busy(&id));
    }

    #[tokio::test]
    async fn completed_sends_autosave_when_enabled() {
        let history = HistoryConfig {
            autosave: true,
            directory: "Quill/History".into(),
        };
        let h = harness(MockProvider::completing(&["Hi!"]), history);
        h.conversation.lock().await.set_title("Autosaved");
        let cancel = CancellationToken::new();

        let outcome = h
            .session
            .send(&h.conversation, "Hello", &cancel, None)
            .await
            .unwrap();
        assert!(matches!(outcome, SendOutcome::Completed(_)));
        assert!(h.vault.read("Quill/History/Autosaved.md").is_some());

        // Nothing new since the last save: the gate skips the write.
        let convo = h.conversation.lock().await;
        assert!(!h.session.autosave(&convo).await.unwrap());
    }

    #[tokio::test]
    async fn paused_autosave_writes_nothing() {
        let history = HistoryConfig {
            autosave: true,
            directory: "Quill/History".into(),
        };
        let h = harness(MockProvider::completing(&["Hi!"]), history);
        {
            let mut convo = h.conversation.lock().await;
            convo.set_title("Paused");
            convo.add_user_message("Hello").unwrap();
        }

        h.session.pause_autosave();
        let convo = h.conversation.lock().await;
        assert!(!h.session.autosave(&convo).await.unwrap());
        assert!(h.vault.files().is_empty());

        h.session.resume_autosave();
        assert!(h.session.autosave(&convo).await.unwrap());
        assert!(h.vault.read("Quill/History/Paused.md").is_some());
    }

    #[tokio::test]
    async fn send_to_current_skips_without_a_current_conversation() {
        let h = harness(MockProvider::completing(&["x"]), HistoryConfig::default());
        let cancel = CancellationToken::new();

        let outcome = h
            .session
            .send_to_current("Hi", &cancel, None)
            .await
            .unwrap();
        assert_eq!(outcome, SendOutcome::Skipped);
    }

    #[tokio::test]
    async fn start_then_send_to_current_round_trip() {
        let h = harness(
            MockProvider::completing(&["Sure."]),
            HistoryConfig::default(),
        );
        let cancel = CancellationToken::new();

        let id = h
            .session
            .start(
                "gpt-3.5-turbo",
                "Be brief.",
                Some("Quick questions"),
                ConversationSettings::default(),
            )
            .await
            .unwrap();

        let outcome = h
            .session
            .send_to_current("Hello?", &cancel, None)
            .await
            .unwrap();
        assert!(matches!(outcome, SendOutcome::Completed(_)));

        let registry = h.session.registry().lock().await;
        let shared = registry.peek(&id).unwrap();
        let convo = shared.lock().await;
        assert_eq!(convo.store().len(), 2);
        assert_eq!(convo.store().last().unwrap().content(), "Sure.");
    }

    #[tokio::test]
    async fn duplicate_title_save_aborts_via_the_notifier() {
        let h = harness(MockProvider::completing(&["x"]), HistoryConfig::default());
        h.vault.seed("Quill/History/Trip.md", "someone else's notes");
        let mut convo = h.conversation.lock().await;
        convo.set_title("Trip");

        let outcome = h.session.save(&convo, false).await.unwrap();
        assert!(matches!(outcome, SaveOutcome::SkippedExisting { .. }));
        assert_eq!(
            h.vault.read("Quill/History/Trip.md").as_deref(),
            Some("someone else's notes")
        );
        assert!(h
            .notifier
            .messages()
            .iter()
            .any(|m| m.contains("already exists")));
    }

    #[tokio::test]
    async fn manual_save_notifies_the_outcome() {
        let h = harness(MockProvider::completing(&["x"]), HistoryConfig::default());
        let convo = h.conversation.lock().await;

        let outcome = h.session.save(&convo, false).await.unwrap();
        assert_eq!(outcome, SaveOutcome::SkippedDefaultTitle);
        assert!(h
            .notifier
            .messages()
            .iter()
            .any(|m| m.contains("Rename the conversation")));
    }
}
