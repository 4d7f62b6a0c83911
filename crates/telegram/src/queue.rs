//! Per-chat single-consumer queues in front of the chat engine.

use std::{collections::HashMap, sync::Arc};

use {
    async_trait::async_trait,
    tokio::sync::mpsc,
    tracing::{debug, error},
};

use {
    parley_chat::{ChatEngine, InboundEvent},
    parley_common::types::ChatId,
};

/// Where queued events end up.
#[async_trait]
pub trait EventDispatcher: Send + Sync {
    async fn dispatch(&self, event: InboundEvent) -> parley_chat::Result<()>;
}

#[async_trait]
impl EventDispatcher for ChatEngine {
    async fn dispatch(&self, event: InboundEvent) -> parley_chat::Result<()> {
        ChatEngine::dispatch(self, event).await
    }
}

/// Events of one chat are handled in arrival order by a dedicated worker;
/// different chats run concurrently.
///
/// A failed turn is reported here (the error hook) and the worker moves on
/// to the chat's next event.
pub struct ChatQueues {
    dispatcher: Arc<dyn EventDispatcher>,
    workers: HashMap<ChatId, mpsc::UnboundedSender<InboundEvent>>,
}

impl ChatQueues {
    pub fn new(dispatcher: Arc<dyn EventDispatcher>) -> Self {
        Self {
            dispatcher,
            workers: HashMap::new(),
        }
    }

    pub fn push(&mut self, event: InboundEvent) {
        let chat_id = event.context.chat_id;
        let event = match self.workers.get(&chat_id) {
            Some(tx) => match tx.send(event) {
                Ok(()) => return,
                // worker gone; start a fresh one below
                Err(mpsc::error::SendError(event)) => event,
            },
            None => event,
        };

        let tx = self.spawn_worker(chat_id);
        if tx.send(event).is_err() {
            error!(chat_id, "chat worker closed before receiving its first event");
        }
        self.workers.insert(chat_id, tx);
    }

    fn spawn_worker(&self, chat_id: ChatId) -> mpsc::UnboundedSender<InboundEvent> {
        let (tx, mut rx) = mpsc::unbounded_channel::<InboundEvent>();
        let dispatcher = Arc::clone(&self.dispatcher);
        debug!(chat_id, "starting chat worker");
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let kind = event.kind();
                if let Err(e) = dispatcher.dispatch(event).await {
                    error!(
                        chat_id,
                        kind = %kind,
                        error = %e,
                        "error handling telegram update"
                    );
                }
            }
        });
        tx
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.workers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }
}
