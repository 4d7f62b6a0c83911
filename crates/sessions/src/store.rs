use std::{collections::HashMap, sync::Arc};

use {
    async_trait::async_trait,
    parley_common::types::ChatId,
    tokio::sync::{Mutex, OwnedMutexGuard, RwLock},
    tracing::debug,
};

use crate::{error::Result, message::Message, transcript::Transcript};

/// Storage backend for transcripts.
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    async fn load(&self, chat_id: ChatId) -> Result<Option<Transcript>>;
    async fn save(&self, chat_id: ChatId, transcript: Transcript) -> Result<()>;
}

/// Process-lifetime map. Nothing is flushed on exit.
#[derive(Default)]
pub struct InMemoryTranscriptStore {
    transcripts: RwLock<HashMap<ChatId, Transcript>>,
}

impl InMemoryTranscriptStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TranscriptStore for InMemoryTranscriptStore {
    async fn load(&self, chat_id: ChatId) -> Result<Option<Transcript>> {
        Ok(self.transcripts.read().await.get(&chat_id).cloned())
    }

    async fn save(&self, chat_id: ChatId, transcript: Transcript) -> Result<()> {
        self.transcripts.write().await.insert(chat_id, transcript);
        Ok(())
    }
}

/// Held for the duration of one turn; other turns for the same chat wait.
pub type ChatTurnGuard = OwnedMutexGuard<()>;

/// Owns transcript lifecycle: creation with the system preamble, reset,
/// appends (with the optional window) and per-chat turn serialization.
pub struct HistoryStore {
    backend: Arc<dyn TranscriptStore>,
    system_prompt: String,
    window: Option<usize>,
    turn_locks: Mutex<HashMap<ChatId, Arc<Mutex<()>>>>,
}

impl HistoryStore {
    /// In-memory store.
    pub fn new(system_prompt: impl Into<String>, window: Option<usize>) -> Self {
        Self::with_backend(
            Arc::new(InMemoryTranscriptStore::new()),
            system_prompt,
            window,
        )
    }

    pub fn with_backend(
        backend: Arc<dyn TranscriptStore>,
        system_prompt: impl Into<String>,
        window: Option<usize>,
    ) -> Self {
        Self {
            backend,
            system_prompt: system_prompt.into(),
            window,
            turn_locks: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Existing transcript, or a new one seeded with the system preamble.
    pub async fn get_or_create(&self, chat_id: ChatId) -> Result<Transcript> {
        if let Some(existing) = self.backend.load(chat_id).await? {
            return Ok(existing);
        }
        debug!(chat_id, "creating transcript");
        let transcript = Transcript::new(self.system_prompt.clone());
        self.backend.save(chat_id, transcript.clone()).await?;
        Ok(transcript)
    }

    /// Replace the chat's transcript with a preamble-only one.
    pub async fn reset(&self, chat_id: ChatId) -> Result<Transcript> {
        debug!(chat_id, "resetting transcript");
        let transcript = Transcript::new(self.system_prompt.clone());
        self.backend.save(chat_id, transcript.clone()).await?;
        Ok(transcript)
    }

    /// Append one message and return the updated transcript.
    ///
    /// Callers mutating a chat must hold its [`lock_chat`](Self::lock_chat)
    /// guard so the read-modify-write is not interleaved.
    pub async fn append(&self, chat_id: ChatId, message: Message) -> Result<Transcript> {
        let mut transcript = self.get_or_create(chat_id).await?;
        transcript.push(message);
        transcript.apply_window(self.window);
        self.backend.save(chat_id, transcript.clone()).await?;
        Ok(transcript)
    }

    /// Acquire the per-chat turn guard.
    pub async fn lock_chat(&self, chat_id: ChatId) -> ChatTurnGuard {
        let lock = {
            let mut locks = self.turn_locks.lock().await;
            Arc::clone(locks.entry(chat_id).or_default())
        };
        lock.lock_owned().await
    }
}
