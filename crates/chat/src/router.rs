//! Handler table: one handler per inbound event kind.

use std::{collections::HashMap, sync::Arc};

use {
    async_trait::async_trait,
    parley_channels::{QueryClass, TextFormat},
    parley_media::DocumentKind,
    parley_sessions::Message,
    tracing::{debug, info},
};

use crate::{
    Error, Result,
    engine::EngineServices,
    event::{EventKind, EventPayload, InboundEvent},
    normalize::{normalize_document, normalize_photo, normalize_text},
    settings::{
        DOCUMENT_HISTORY_PREFIX, DOCUMENT_REPLY_PREFIX, HISTORY_CLEARED, IMAGE_HISTORY_PREFIX,
        IMAGE_REPLY_PREFIX, UNSUPPORTED_FORMAT, guideline_text,
    },
};

/// Runs one admitted event to completion. The caller holds the chat's turn
/// guard for the duration.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, services: &EngineServices, event: InboundEvent) -> Result<()>;
}

#[derive(Default)]
pub struct Router {
    handlers: HashMap<EventKind, Arc<dyn EventHandler>>,
}

impl Router {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Text, photo, document, `/start` and `/guideline`.
    #[must_use]
    pub fn standard() -> Self {
        let mut router = Self::new();
        router.register(EventKind::Text, Arc::new(TextHandler));
        router.register(EventKind::Photo, Arc::new(PhotoHandler));
        router.register(EventKind::Document, Arc::new(DocumentHandler));
        router.register(EventKind::Start, Arc::new(StartHandler));
        router.register(EventKind::Guideline, Arc::new(GuidelineHandler));
        router
    }

    /// Install `handler` for `kind`, returning the one it replaces.
    pub fn register(
        &mut self,
        kind: EventKind,
        handler: Arc<dyn EventHandler>,
    ) -> Option<Arc<dyn EventHandler>> {
        self.handlers.insert(kind, handler)
    }

    #[must_use]
    pub fn get(&self, kind: EventKind) -> Option<&Arc<dyn EventHandler>> {
        self.handlers.get(&kind)
    }
}

fn mismatched(kind: EventKind, event: &InboundEvent) -> Error {
    Error::message(format!(
        "{kind} handler received a {} event",
        event.kind()
    ))
}

pub struct TextHandler;

#[async_trait]
impl EventHandler for TextHandler {
    async fn handle(&self, services: &EngineServices, event: InboundEvent) -> Result<()> {
        let EventPayload::Text { text } = &event.payload else {
            return Err(mismatched(EventKind::Text, &event));
        };
        let chat_id = event.context.chat_id;

        services.notify_thinking(chat_id).await?;
        let (message, classification) =
            normalize_text(text, &services.gate, services.fetcher.as_ref()).await;
        let raw = services.complete_turn(chat_id, message, "").await?;
        let display = services.reply(chat_id, &raw, "").await?;

        services
            .record(&event.context, classification, text, &display)
            .await
    }
}

pub struct PhotoHandler;

#[async_trait]
impl EventHandler for PhotoHandler {
    async fn handle(&self, services: &EngineServices, event: InboundEvent) -> Result<()> {
        let EventPayload::Photo { file, caption } = &event.payload else {
            return Err(mismatched(EventKind::Photo, &event));
        };
        let chat_id = event.context.chat_id;

        services.media.prepare().await?;
        let path = services.media.path_for(&format!("{}.jpg", file.file_id()));
        file.download_to(&path).await?;
        debug!(chat_id, path = %path.display(), "photo downloaded");

        services.notify_thinking(chat_id).await?;
        let image_url = services.uploader.upload(&path).await?;
        let message = normalize_photo(caption.as_deref(), &image_url);
        let raw = services
            .complete_turn(chat_id, message, IMAGE_HISTORY_PREFIX)
            .await?;
        let display = services.reply(chat_id, &raw, IMAGE_REPLY_PREFIX).await?;

        services
            .record(
                &event.context,
                QueryClass::Query,
                caption.as_deref().unwrap_or_default(),
                &display,
            )
            .await
    }
}

pub struct DocumentHandler;

#[async_trait]
impl EventHandler for DocumentHandler {
    async fn handle(&self, services: &EngineServices, event: InboundEvent) -> Result<()> {
        let EventPayload::Document {
            file,
            file_name,
            caption,
        } = &event.payload
        else {
            return Err(mismatched(EventKind::Document, &event));
        };
        let chat_id = event.context.chat_id;
        let caption_text = caption.as_deref().unwrap_or_default();

        let Some(kind) = DocumentKind::from_file_name(file_name) else {
            info!(chat_id, file_name = %file_name, "unsupported document format");
            services
                .outbound
                .send_text(chat_id, UNSUPPORTED_FORMAT, TextFormat::Plain)
                .await?;
            return services
                .record(
                    &event.context,
                    QueryClass::Unsupported,
                    caption_text,
                    UNSUPPORTED_FORMAT,
                )
                .await;
        };

        // keyed on the file id: names are user-chosen and shared across chats
        services.media.prepare().await?;
        let path = services
            .media
            .path_for(&format!("{}.{}", file.file_id(), kind.extension()));
        file.download_to(&path).await?;
        debug!(chat_id, path = %path.display(), ?kind, "document downloaded");

        services.notify_thinking(chat_id).await?;
        let extracted = services.extractors.extract(kind, &path).await?;
        let prompt = normalize_document(caption.as_deref(), file_name, &extracted);
        let raw = services
            .complete_turn(
                chat_id,
                Message::user(prompt.clone()),
                DOCUMENT_HISTORY_PREFIX,
            )
            .await?;
        let display = services.reply(chat_id, &raw, DOCUMENT_REPLY_PREFIX).await?;

        services
            .record(&event.context, QueryClass::Query, &prompt, &display)
            .await
    }
}

/// `/start`: reset the chat's transcript to the system preamble.
pub struct StartHandler;

#[async_trait]
impl EventHandler for StartHandler {
    async fn handle(&self, services: &EngineServices, event: InboundEvent) -> Result<()> {
        let EventPayload::Command { text, .. } = &event.payload else {
            return Err(mismatched(EventKind::Start, &event));
        };
        let chat_id = event.context.chat_id;

        services.history.reset(chat_id).await?;
        info!(chat_id, "history cleared");
        services
            .outbound
            .send_text(chat_id, HISTORY_CLEARED, TextFormat::Plain)
            .await?;
        services
            .record(&event.context, QueryClass::Command, text, HISTORY_CLEARED)
            .await
    }
}

/// `/guideline`: usage text. Leaves the transcript alone.
pub struct GuidelineHandler;

#[async_trait]
impl EventHandler for GuidelineHandler {
    async fn handle(&self, services: &EngineServices, event: InboundEvent) -> Result<()> {
        let EventPayload::Command { text, .. } = &event.payload else {
            return Err(mismatched(EventKind::Guideline, &event));
        };
        let reply = guideline_text(services.gate.bot_username());
        services
            .outbound
            .send_text(event.context.chat_id, &reply, TextFormat::Plain)
            .await?;
        services
            .record(&event.context, QueryClass::Command, text, &reply)
            .await
    }
}
