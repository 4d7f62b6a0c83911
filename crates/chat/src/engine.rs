//! Turn pipeline: gate, serialize per chat, route to the kind's handler.

use std::sync::Arc;

use tracing::{debug, info, warn};

use {
    parley_channels::{
        AuditLog, AuditRecord, ChannelOutbound, EventContext, MentionGate, QueryClass, TextFormat,
    },
    parley_common::types::ChatId,
    parley_media::{DocumentExtractors, FileHost, MediaStore, WebPageFetcher},
    parley_providers::CompletionClient,
    parley_sessions::{HistoryStore, Message},
};

use crate::{
    Result,
    event::{EventKind, EventPayload, InboundEvent},
    format::{ReplyPlan, plan_reply, to_display},
    router::Router,
    settings::EngineSettings,
};

/// Everything a handler may touch during a turn.
pub struct EngineServices {
    pub history: Arc<HistoryStore>,
    pub completion: CompletionClient,
    pub outbound: Arc<dyn ChannelOutbound>,
    pub audit: Arc<dyn AuditLog>,
    pub fetcher: Arc<dyn WebPageFetcher>,
    pub extractors: DocumentExtractors,
    pub uploader: Arc<dyn FileHost>,
    pub media: MediaStore,
    pub gate: MentionGate,
    pub settings: EngineSettings,
}

impl EngineServices {
    pub async fn record(
        &self,
        context: &EventContext,
        classification: QueryClass,
        inbound: &str,
        outbound: &str,
    ) -> Result<()> {
        self.audit
            .record(AuditRecord::new(context, classification, inbound, outbound))
            .await?;
        Ok(())
    }

    /// Send the configured "thinking" notice, if any.
    pub async fn notify_thinking(&self, chat_id: ChatId) -> Result<()> {
        if let Some(notice) = &self.settings.thinking_notice {
            self.outbound
                .send_text(chat_id, notice, TextFormat::Markdown)
                .await?;
        }
        Ok(())
    }

    /// Append `message`, request a completion over the whole transcript and
    /// store the reply as `history_prefix + raw`. Returns the raw reply.
    pub async fn complete_turn(
        &self,
        chat_id: ChatId,
        message: Message,
        history_prefix: &str,
    ) -> Result<String> {
        let transcript = self.history.append(chat_id, message).await?;
        debug!(
            chat_id,
            model = %self.settings.model_alias,
            messages = transcript.len(),
            "requesting completion"
        );
        let raw = self
            .completion
            .complete(&self.settings.model_alias, &transcript)
            .await?;
        self.history
            .append(chat_id, Message::assistant(format!("{history_prefix}{raw}")))
            .await?;
        Ok(raw)
    }

    /// Format `raw` for display and deliver it behind `reply_prefix`.
    /// Returns the display text without the prefix.
    pub async fn reply(&self, chat_id: ChatId, raw: &str, reply_prefix: &str) -> Result<String> {
        let display = to_display(raw);
        self.deliver(chat_id, &format!("{reply_prefix}{display}"))
            .await?;
        Ok(display)
    }

    /// Send `text` as one Markdown message, or as plain chunks with a pause
    /// between them when it exceeds the transport limit.
    pub async fn deliver(&self, chat_id: ChatId, text: &str) -> Result<()> {
        match plan_reply(text, self.settings.max_message_len, self.settings.chunk_size) {
            ReplyPlan::Single(text) => {
                self.outbound
                    .send_text(chat_id, &text, TextFormat::Markdown)
                    .await?;
            },
            ReplyPlan::Chunked(chunks) => {
                debug!(chat_id, chunk_count = chunks.len(), "sending reply in chunks");
                for (i, chunk) in chunks.iter().enumerate() {
                    if i > 0 && !self.settings.chunk_delay.is_zero() {
                        tokio::time::sleep(self.settings.chunk_delay).await;
                    }
                    self.outbound
                        .send_text(chat_id, chunk, TextFormat::Plain)
                        .await?;
                }
            },
        }
        Ok(())
    }
}

/// Text the mention gate inspects: message text or media caption.
fn gate_text(payload: &EventPayload) -> &str {
    match payload {
        EventPayload::Text { text } | EventPayload::Command { text, .. } => text.as_str(),
        EventPayload::Photo { caption, .. } | EventPayload::Document { caption, .. } => {
            caption.as_deref().unwrap_or_default()
        },
    }
}

pub struct ChatEngine {
    services: EngineServices,
    router: Router,
}

impl ChatEngine {
    /// Engine with the standard handler table.
    pub fn new(services: EngineServices) -> Self {
        Self::with_router(services, Router::standard())
    }

    pub fn with_router(services: EngineServices, router: Router) -> Self {
        Self { services, router }
    }

    #[must_use]
    pub fn services(&self) -> &EngineServices {
        &self.services
    }

    /// Handle one inbound event to completion.
    ///
    /// Turns for the same chat run one at a time. Errors are returned to the
    /// transport, which reports them; the user gets no reply for that turn.
    pub async fn dispatch(&self, event: InboundEvent) -> Result<()> {
        let kind = event.kind();
        let ctx = &event.context;

        let is_command = matches!(kind, EventKind::Start | EventKind::Guideline);
        if !is_command {
            let text = gate_text(&event.payload);
            if !self.services.gate.admits(ctx.chat_type, text) {
                debug!(chat_id = ctx.chat_id, kind = %kind, "not addressed to the bot");
                return self
                    .services
                    .record(ctx, QueryClass::NotAddressed, text, "")
                    .await;
            }
        }

        let Some(handler) = self.router.get(kind) else {
            warn!(chat_id = ctx.chat_id, kind = %kind, "no handler registered");
            return Ok(());
        };

        let _turn = self.services.history.lock_chat(ctx.chat_id).await;
        info!(
            chat_id = ctx.chat_id,
            chat_type = %ctx.chat_type,
            user_id = ctx.user_id,
            kind = %kind,
            "handling event"
        );
        handler.handle(&self.services, event).await
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::event::{Command, FileSource},
        async_trait::async_trait,
        parley_common::types::ChatType,
        parley_config::MentionMode,
        parley_media::{DocumentKind, TextExtractor},
        parley_providers::{CompletionProvider, ModelAliases},
        parley_sessions::{ContentBlock, Role, Transcript},
        std::{
            path::{Path, PathBuf},
            sync::Mutex,
            time::Duration,
        },
    };

    #[derive(Default)]
    pub struct RecordingOutbound {
        pub sent: Mutex<Vec<(ChatId, String, TextFormat)>>,
    }

    #[async_trait]
    impl ChannelOutbound for RecordingOutbound {
        async fn send_text(
            &self,
            chat_id: ChatId,
            text: &str,
            format: TextFormat,
        ) -> parley_channels::Result<()> {
            self.sent
                .lock()
                .unwrap()
                .push((chat_id, text.to_string(), format));
            Ok(())
        }
    }

    #[derive(Default)]
    pub struct MemoryAudit {
        pub records: Mutex<Vec<AuditRecord>>,
    }

    #[async_trait]
    impl AuditLog for MemoryAudit {
        async fn record(&self, record: AuditRecord) -> parley_channels::Result<()> {
            self.records.lock().unwrap().push(record);
            Ok(())
        }
    }

    /// Replies with a fixed text and remembers every transcript it saw.
    pub struct ScriptedProvider {
        pub reply: std::result::Result<String, u16>,
        pub seen: Mutex<Vec<(String, Vec<Message>)>>,
    }

    impl ScriptedProvider {
        pub fn replying(reply: &str) -> Self {
            Self {
                reply: Ok(reply.into()),
                seen: Mutex::default(),
            }
        }

        pub fn failing(status: u16) -> Self {
            Self {
                reply: Err(status),
                seen: Mutex::default(),
            }
        }
    }

    #[async_trait]
    impl CompletionProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(
            &self,
            model: &str,
            messages: &[Message],
        ) -> parley_providers::Result<String> {
            self.seen
                .lock()
                .unwrap()
                .push((model.to_string(), messages.to_vec()));
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(status) => Err(parley_providers::Error::Api {
                    status: *status,
                    body: "upstream unavailable".into(),
                }),
            }
        }
    }

    pub struct StaticFetcher(pub &'static str);

    #[async_trait]
    impl WebPageFetcher for StaticFetcher {
        async fn page_text(&self, _url: &str) -> String {
            self.0.to_string()
        }
    }

    #[derive(Default)]
    pub struct FakeHost {
        pub uploaded: Mutex<Vec<PathBuf>>,
    }

    #[async_trait]
    impl FileHost for FakeHost {
        async fn upload(&self, path: &Path) -> parley_media::Result<String> {
            self.uploaded.lock().unwrap().push(path.to_path_buf());
            Ok("https://cdn.example/hosted".into())
        }
    }

    /// Extractor that returns a label and records which file it read.
    pub struct LabelExtractor {
        pub label: &'static str,
        pub calls: Mutex<Vec<PathBuf>>,
    }

    impl LabelExtractor {
        pub fn new(label: &'static str) -> Arc<Self> {
            Arc::new(Self {
                label,
                calls: Mutex::default(),
            })
        }
    }

    #[async_trait]
    impl TextExtractor for LabelExtractor {
        async fn extract_text(&self, path: &Path) -> parley_media::Result<String> {
            self.calls.lock().unwrap().push(path.to_path_buf());
            Ok(format!("{} text\n", self.label))
        }
    }

    /// Reads the downloaded file back after a pause, so concurrent turns overlap.
    pub struct SlowFileReader;

    #[async_trait]
    impl TextExtractor for SlowFileReader {
        async fn extract_text(&self, path: &Path) -> parley_media::Result<String> {
            tokio::time::sleep(Duration::from_millis(100)).await;
            tokio::fs::read_to_string(path)
                .await
                .map_err(|e| parley_media::Error::external("failed to read download", e))
        }
    }

    #[derive(Debug)]
    pub struct BytesFile {
        pub id: &'static str,
        pub bytes: &'static [u8],
    }

    #[async_trait]
    impl FileSource for BytesFile {
        fn file_id(&self) -> &str {
            self.id
        }

        async fn download_to(&self, dest: &Path) -> parley_channels::Result<()> {
            tokio::fs::write(dest, self.bytes).await?;
            Ok(())
        }
    }

    pub struct Harness {
        pub engine: ChatEngine,
        pub outbound: Arc<RecordingOutbound>,
        pub audit: Arc<MemoryAudit>,
        pub provider: Arc<ScriptedProvider>,
        pub host: Arc<FakeHost>,
        pub pdf: Arc<LabelExtractor>,
        pub docx: Arc<LabelExtractor>,
        pub history: Arc<HistoryStore>,
        _dir: tempfile::TempDir,
    }

    impl Harness {
        pub fn new(provider: ScriptedProvider) -> Self {
            Self::with_settings(provider, EngineSettings {
                chunk_delay: Duration::ZERO,
                ..EngineSettings::default()
            })
        }

        pub fn with_settings(provider: ScriptedProvider, settings: EngineSettings) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let outbound = Arc::new(RecordingOutbound::default());
            let audit = Arc::new(MemoryAudit::default());
            let provider = Arc::new(provider);
            let host = Arc::new(FakeHost::default());
            let pdf = LabelExtractor::new("pdf");
            let docx = LabelExtractor::new("docx");
            let history = Arc::new(HistoryStore::new("You are a helpful assistant.", None));
            let aliases: ModelAliases = [("gpt4", "openai/gpt-4o-2024-11-20")].into_iter().collect();

            let services = EngineServices {
                history: Arc::clone(&history),
                completion: CompletionClient::new(aliases, Arc::clone(&provider) as _),
                outbound: Arc::clone(&outbound) as _,
                audit: Arc::clone(&audit) as _,
                fetcher: Arc::new(StaticFetcher("Example Domain")),
                extractors: DocumentExtractors::new(Arc::clone(&pdf) as _, Arc::clone(&docx) as _),
                uploader: Arc::clone(&host) as _,
                media: MediaStore::new(dir.path().join("downloads")),
                gate: MentionGate::new(MentionMode::Mention, "parley_bot"),
                settings,
            };

            Self {
                engine: ChatEngine::new(services),
                outbound,
                audit,
                provider,
                host,
                pdf,
                docx,
                history,
                _dir: dir,
            }
        }

        pub fn sent(&self) -> Vec<(ChatId, String, TextFormat)> {
            self.outbound.sent.lock().unwrap().clone()
        }

        pub fn records(&self) -> Vec<AuditRecord> {
            self.audit.records.lock().unwrap().clone()
        }

        pub async fn transcript(&self, chat_id: ChatId) -> Transcript {
            self.history.get_or_create(chat_id).await.unwrap()
        }
    }

    pub fn private() -> EventContext {
        EventContext {
            chat_id: 7,
            chat_type: ChatType::Private,
            chat_title: None,
            user_id: 7,
            user_name: "Ada Lovelace".into(),
        }
    }

    pub fn group() -> EventContext {
        EventContext {
            chat_id: -100_7,
            chat_type: ChatType::Group,
            chat_title: Some("Core team".into()),
            user_id: 7,
            user_name: "Ada Lovelace".into(),
        }
    }

    pub fn text(context: EventContext, text: &str) -> InboundEvent {
        InboundEvent {
            context,
            payload: EventPayload::Text { text: text.into() },
        }
    }

    pub fn command(context: EventContext, text: &str) -> InboundEvent {
        InboundEvent {
            context,
            payload: EventPayload::Command {
                command: Command::parse(text).unwrap(),
                text: text.into(),
            },
        }
    }

    pub fn document(context: EventContext, file_name: &str, caption: Option<&str>) -> InboundEvent {
        InboundEvent {
            context,
            payload: EventPayload::Document {
                file: Arc::new(BytesFile {
                    id: "doc-1",
                    bytes: b"%PDF-1.5",
                }),
                file_name: file_name.into(),
                caption: caption.map(String::from),
            },
        }
    }

    pub fn photo(context: EventContext, caption: Option<&str>) -> InboundEvent {
        InboundEvent {
            context,
            payload: EventPayload::Photo {
                file: Arc::new(BytesFile {
                    id: "AgADphoto",
                    bytes: b"\xff\xd8\xff",
                }),
                caption: caption.map(String::from),
            },
        }
    }

    #[tokio::test]
    async fn url_text_turn_end_to_end() {
        let h = Harness::new(ScriptedProvider::replying("### Result\n**Example** is a demo page."));

        h.engine
            .dispatch(text(private(), "Summarize https://example.com please"))
            .await
            .unwrap();

        let seen = h.provider.seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "openai/gpt-4o-2024-11-20");
        assert_eq!(seen[0].1.len(), 2);
        assert_eq!(seen[0].1[0].role(), Role::System);
        assert_eq!(seen[0].1[1], Message::user("Summarize please\nExample Domain\n"));

        let sent = h.sent();
        assert_eq!(sent, vec![
            (7, "I am thinking...".to_string(), TextFormat::Markdown),
            (
                7,
                "✅ Result\n[Example] is a demo page.".to_string(),
                TextFormat::Markdown
            ),
        ]);

        let records = h.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].classification, QueryClass::Mixed);
        assert_eq!(records[0].inbound_text, "Summarize https://example.com please");
        assert_eq!(records[0].outbound_text, "✅ Result\n[Example] is a demo page.");

        let transcript = h.transcript(7).await;
        assert_eq!(transcript.len(), 3);
        assert_eq!(
            transcript.last(),
            Some(&Message::assistant("### Result\n**Example** is a demo page."))
        );
    }

    #[tokio::test]
    async fn plain_text_turn_is_a_query() {
        let h = Harness::new(ScriptedProvider::replying("Hi!"));
        h.engine
            .dispatch(text(group(), "@parley_bot hello there"))
            .await
            .unwrap();

        let seen = h.provider.seen.lock().unwrap().clone();
        assert_eq!(seen[0].1[1], Message::user("hello there"));
        assert_eq!(h.records()[0].classification, QueryClass::Query);
    }

    #[tokio::test]
    async fn group_message_without_mention_is_only_audited() {
        let h = Harness::new(ScriptedProvider::replying("unused"));
        h.engine
            .dispatch(text(group(), "just chatting"))
            .await
            .unwrap();
        h.engine.dispatch(photo(group(), None)).await.unwrap();

        assert!(h.sent().is_empty());
        assert!(h.provider.seen.lock().unwrap().is_empty());
        assert!(h.host.uploaded.lock().unwrap().is_empty());
        assert_eq!(h.transcript(group().chat_id).await.len(), 1);

        let records = h.records();
        assert_eq!(records.len(), 2);
        assert!(
            records
                .iter()
                .all(|r| r.classification == QueryClass::NotAddressed && r.outbound_text.is_empty())
        );
        assert_eq!(records[0].inbound_text, "just chatting");
        assert_eq!(records[1].inbound_text, "");
    }

    #[tokio::test]
    async fn start_resets_history() {
        let h = Harness::new(ScriptedProvider::replying("ok"));
        h.engine.dispatch(text(private(), "first")).await.unwrap();
        assert_eq!(h.transcript(7).await.len(), 3);

        h.engine
            .dispatch(command(private(), "/start"))
            .await
            .unwrap();

        let transcript = h.transcript(7).await;
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.messages()[0].role(), Role::System);

        let sent = h.sent();
        assert_eq!(
            sent.last(),
            Some(&(7, "History cleared.".to_string(), TextFormat::Plain))
        );
        let last = h.records().pop().unwrap();
        assert_eq!(last.classification, QueryClass::Command);
        assert_eq!(last.inbound_text, "/start");
        assert_eq!(last.outbound_text, "History cleared.");
    }

    #[tokio::test]
    async fn commands_bypass_the_mention_gate() {
        let h = Harness::new(ScriptedProvider::replying("unused"));
        h.engine
            .dispatch(command(group(), "/guideline"))
            .await
            .unwrap();

        let sent = h.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].1.starts_with("How to Use the Bot:"));
        assert!(sent[0].1.contains("@parley_bot"));
        assert_eq!(h.records()[0].classification, QueryClass::Command);
        assert_eq!(h.transcript(group().chat_id).await.len(), 1);
    }

    #[tokio::test]
    async fn unsupported_document_is_rejected_without_side_effects() {
        let h = Harness::new(ScriptedProvider::replying("unused"));
        h.engine
            .dispatch(document(private(), "notes.txt", Some("read this")))
            .await
            .unwrap();

        assert_eq!(h.sent(), vec![(
            7,
            "❓ Unsupported file format.".to_string(),
            TextFormat::Plain
        )]);
        assert!(h.pdf.calls.lock().unwrap().is_empty());
        assert!(h.docx.calls.lock().unwrap().is_empty());
        assert!(h.provider.seen.lock().unwrap().is_empty());
        assert_eq!(h.transcript(7).await.len(), 1);

        let records = h.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].classification, QueryClass::Unsupported);
    }

    #[tokio::test]
    async fn documents_route_by_extension() {
        let h = Harness::new(ScriptedProvider::replying("Short summary"));
        h.engine
            .dispatch(document(private(), "Report.PDF", None))
            .await
            .unwrap();
        h.engine
            .dispatch(document(private(), "plan.docx", Some("Key risks?")))
            .await
            .unwrap();

        assert_eq!(h.pdf.calls.lock().unwrap().len(), 1);
        assert_eq!(h.docx.calls.lock().unwrap().len(), 1);
        assert!(h.pdf.calls.lock().unwrap()[0].ends_with("doc-1.pdf"));

        let seen = h.provider.seen.lock().unwrap().clone();
        assert_eq!(
            seen[0].1.last(),
            Some(&Message::user(
                "Please summarize the following document (Report.PDF):\npdf text\n"
            ))
        );
        assert_eq!(seen[1].1.last(), Some(&Message::user("Key risks?\ndocx text\n")));

        let transcript = h.transcript(7).await;
        assert_eq!(
            transcript.last(),
            Some(&Message::assistant("Document analysis result: Short summary"))
        );
        let sent = h.sent();
        assert_eq!(sent.last().unwrap().1, "Document Analysis:\nShort summary");

        let records = h.records();
        assert_eq!(records[1].inbound_text, "Key risks?\ndocx text\n");
        assert_eq!(records[1].outbound_text, "Short summary");
    }

    #[tokio::test]
    async fn photo_turn_uploads_and_tags_history() {
        let h = Harness::new(ScriptedProvider::replying("A **cat**."));
        h.engine
            .dispatch(photo(private(), Some("What is this?")))
            .await
            .unwrap();

        let uploaded = h.host.uploaded.lock().unwrap().clone();
        assert_eq!(uploaded.len(), 1);
        assert!(uploaded[0].ends_with("AgADphoto.jpg"));

        let seen = h.provider.seen.lock().unwrap().clone();
        assert_eq!(
            seen[0].1[1],
            Message::user_multimodal(vec![
                ContentBlock::text("What is this?"),
                ContentBlock::image_url("https://cdn.example/hosted"),
            ])
        );

        let sent = h.sent();
        assert_eq!(sent[0].1, "I am thinking...");
        assert_eq!(sent[1], (
            7,
            "Image Analysis:\nA [cat].".to_string(),
            TextFormat::Markdown
        ));
        assert_eq!(
            h.transcript(7).await.last(),
            Some(&Message::assistant("Image analysis result: A **cat**."))
        );

        let records = h.records();
        let record = &records[0];
        assert_eq!(record.classification, QueryClass::Query);
        assert_eq!(record.inbound_text, "What is this?");
        assert_eq!(record.outbound_text, "A [cat].");
    }

    #[tokio::test]
    async fn backend_failure_propagates_without_audit() {
        let h = Harness::new(ScriptedProvider::failing(502));
        let err = h
            .engine
            .dispatch(text(private(), "hello"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            crate::Error::Completion(parley_providers::Error::Api { status: 502, .. })
        ));
        assert!(h.records().is_empty());
        // only the thinking notice went out
        assert_eq!(h.sent().len(), 1);
    }

    #[tokio::test]
    async fn unknown_model_alias_propagates() {
        let h = Harness::with_settings(ScriptedProvider::replying("unused"), EngineSettings {
            model_alias: "nope".into(),
            chunk_delay: Duration::ZERO,
            ..EngineSettings::default()
        });
        let err = h
            .engine
            .dispatch(text(private(), "hello"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Completion(parley_providers::Error::UnknownModel { .. })
        ));
        assert!(h.provider.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn long_reply_goes_out_in_plain_chunks() {
        let long = "a".repeat(9000);
        let h = Harness::new(ScriptedProvider::replying(&long));
        h.engine.dispatch(text(private(), "essay")).await.unwrap();

        let sent = h.sent();
        let chunks: Vec<_> = sent[1..].to_vec();
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|(_, _, f)| *f == TextFormat::Plain));
        let joined: String = chunks.iter().map(|(_, t, _)| t.as_str()).collect();
        assert_eq!(joined, long);
        // the audit keeps the full display text
        assert_eq!(h.records()[0].outbound_text.len(), 9000);
    }

    #[tokio::test]
    async fn disabled_notice_sends_only_the_reply() {
        let h = Harness::with_settings(ScriptedProvider::replying("pong"), EngineSettings {
            thinking_notice: None,
            chunk_delay: Duration::ZERO,
            ..EngineSettings::default()
        });
        h.engine.dispatch(text(private(), "ping")).await.unwrap();
        assert_eq!(h.sent(), vec![(7, "pong".to_string(), TextFormat::Markdown)]);
    }

    #[tokio::test]
    async fn same_chat_turns_do_not_interleave() {
        let h = Arc::new(Harness::new(ScriptedProvider::replying("ok")));
        let mut tasks = Vec::new();
        for i in 0..10 {
            let h = Arc::clone(&h);
            tasks.push(tokio::spawn(async move {
                h.engine
                    .dispatch(text(private(), &format!("q{i}")))
                    .await
                    .unwrap();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let transcript = h.transcript(7).await;
        assert_eq!(transcript.len(), 21);
        for pair in transcript.messages()[1..].chunks(2) {
            assert_eq!(pair[0].role(), Role::User);
            assert_eq!(pair[1], Message::assistant("ok"));
        }
    }

    #[tokio::test]
    async fn same_named_documents_from_different_chats_stay_apart() {
        let mut h = Harness::new(ScriptedProvider::replying("ok"));
        let reader = Arc::new(SlowFileReader);
        h.engine.services.extractors = DocumentExtractors::new(Arc::clone(&reader) as _, reader);
        let h = Arc::new(h);

        let report = |chat_id: ChatId, id: &'static str, bytes: &'static [u8]| InboundEvent {
            context: EventContext {
                chat_id,
                ..private()
            },
            payload: EventPayload::Document {
                file: Arc::new(BytesFile { id, bytes }),
                file_name: "report.pdf".into(),
                caption: Some("q".into()),
            },
        };

        let first = {
            let h = Arc::clone(&h);
            let event = report(1, "file-a", b"contents of chat one");
            tokio::spawn(async move { h.engine.dispatch(event).await.unwrap() })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        let second = {
            let h = Arc::clone(&h);
            let event = report(2, "file-b", b"contents of chat two");
            tokio::spawn(async move { h.engine.dispatch(event).await.unwrap() })
        };
        first.await.unwrap();
        second.await.unwrap();

        assert_eq!(
            h.transcript(1).await.messages()[1],
            Message::user("q\ncontents of chat one")
        );
        assert_eq!(
            h.transcript(2).await.messages()[1],
            Message::user("q\ncontents of chat two")
        );
    }

    #[test]
    fn document_kind_is_case_insensitive() {
        assert_eq!(DocumentKind::from_file_name("A.DOCX"), Some(DocumentKind::Docx));
    }
}
