//! Append-only audit log of every inbound event.

use std::{
    fs::OpenOptions,
    path::{Path, PathBuf},
};

use {
    async_trait::async_trait,
    chrono::{DateTime, SecondsFormat, Utc},
    tokio::sync::Mutex,
    tracing::debug,
};

use crate::{EventContext, Error, Result};

/// Column header written when the log file is created.
pub const AUDIT_HEADER: [&str; 8] = [
    "timestamp",
    "user_id",
    "user_name",
    "chat_id",
    "chat_title",
    "is_gpt_query",
    "user_message",
    "bot_response",
];

/// How an inbound event was handled (the `is_gpt_query` column).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryClass {
    /// Text, image or document turn sent to the model.
    Query,
    /// Text turn that contained URLs.
    Mixed,
    /// Group message without the bot mention.
    NotAddressed,
    Command,
    /// Document with an unsupported extension.
    Unsupported,
}

impl QueryClass {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Query => "yes",
            Self::Mixed => "mixed",
            Self::NotAddressed => "not-addressed",
            Self::Command => "command",
            Self::Unsupported => "unsupported",
        }
    }
}

impl std::fmt::Display for QueryClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRecord {
    pub timestamp: DateTime<Utc>,
    pub context: EventContext,
    pub classification: QueryClass,
    pub inbound_text: String,
    pub outbound_text: String,
}

impl AuditRecord {
    /// Record stamped with the current UTC time.
    pub fn new(
        context: &EventContext,
        classification: QueryClass,
        inbound_text: impl Into<String>,
        outbound_text: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            context: context.clone(),
            classification,
            inbound_text: inbound_text.into(),
            outbound_text: outbound_text.into(),
        }
    }

    fn to_row(&self) -> [String; 8] {
        [
            self.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true),
            self.context.user_id.to_string(),
            self.context.user_name.clone(),
            self.context.chat_id.to_string(),
            self.context.chat_title.clone().unwrap_or_default(),
            self.classification.to_string(),
            self.inbound_text.clone(),
            self.outbound_text.clone(),
        ]
    }
}

/// Durable sink for audit records. Never read back by the engine.
#[async_trait]
pub trait AuditLog: Send + Sync {
    async fn record(&self, record: AuditRecord) -> Result<()>;
}

/// UTF-8 CSV file with a fixed header. No rotation.
pub struct CsvAuditLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl CsvAuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn append_row(path: &Path, row: &[String; 8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let needs_header = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    if needs_header {
        writer.write_record(AUDIT_HEADER)?;
    }
    writer.write_record(row)?;
    writer.flush()?;
    Ok(())
}

#[async_trait]
impl AuditLog for CsvAuditLog {
    async fn record(&self, record: AuditRecord) -> Result<()> {
        let row = record.to_row();
        debug!(
            chat_id = record.context.chat_id,
            user_id = record.context.user_id,
            classification = %record.classification,
            inbound_len = record.inbound_text.len(),
            outbound_len = record.outbound_text.len(),
            "audit record"
        );

        let _guard = self.write_lock.lock().await;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || append_row(&path, &row))
            .await
            .map_err(|e| Error::external("audit write task failed", e))?
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, parley_common::types::ChatType, std::sync::Arc};

    fn group_context() -> EventContext {
        EventContext {
            chat_id: -100_123,
            chat_type: ChatType::Supergroup,
            chat_title: Some("Team, \"Core\"".into()),
            user_id: 42,
            user_name: "Ada Lovelace".into(),
        }
    }

    fn read_rows(path: &Path) -> Vec<Vec<String>> {
        csv::ReaderBuilder::new()
            .has_headers(false)
            .from_path(path)
            .unwrap()
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn classification_strings() {
        assert_eq!(QueryClass::Query.to_string(), "yes");
        assert_eq!(QueryClass::Mixed.to_string(), "mixed");
        assert_eq!(QueryClass::NotAddressed.to_string(), "not-addressed");
        assert_eq!(QueryClass::Command.to_string(), "command");
        assert_eq!(QueryClass::Unsupported.to_string(), "unsupported");
    }

    #[tokio::test]
    async fn creates_file_with_header_then_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs/chat_logs.csv");
        let log = CsvAuditLog::new(&path);

        let ctx = group_context();
        log.record(AuditRecord::new(&ctx, QueryClass::Query, "hi, bot", "line1\nline2"))
            .await
            .unwrap();
        log.record(AuditRecord::new(&ctx, QueryClass::NotAddressed, "chatter", ""))
            .await
            .unwrap();

        let rows = read_rows(&path);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], AUDIT_HEADER.map(String::from).to_vec());
        assert_eq!(rows[1][1..], [
            "42",
            "Ada Lovelace",
            "-100123",
            "Team, \"Core\"",
            "yes",
            "hi, bot",
            "line1\nline2"
        ]);
        assert_eq!(rows[2][5], "not-addressed");
        assert_eq!(rows[2][7], "");
    }

    #[tokio::test]
    async fn existing_file_gets_no_second_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat_logs.csv");
        let ctx = group_context();

        CsvAuditLog::new(&path)
            .record(AuditRecord::new(&ctx, QueryClass::Command, "/start", "History cleared."))
            .await
            .unwrap();
        // a fresh logger (process restart) appends to the same file
        CsvAuditLog::new(&path)
            .record(AuditRecord::new(&ctx, QueryClass::Command, "/guideline", "..."))
            .await
            .unwrap();

        let rows = read_rows(&path);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows.iter().filter(|r| r[0] == "timestamp").count(), 1);
    }

    #[tokio::test]
    async fn private_chat_has_empty_title_and_utc_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat_logs.csv");
        let ctx = EventContext {
            chat_id: 42,
            chat_type: ChatType::Private,
            chat_title: None,
            user_id: 42,
            user_name: "Ada".into(),
        };
        CsvAuditLog::new(&path)
            .record(AuditRecord::new(&ctx, QueryClass::Mixed, "see https://x.y", "ok"))
            .await
            .unwrap();

        let rows = read_rows(&path);
        assert_eq!(rows[1][4], "");
        assert!(rows[1][0].ends_with('Z'));
        assert!(DateTime::parse_from_rfc3339(&rows[1][0]).is_ok());
    }

    #[tokio::test]
    async fn concurrent_records_do_not_interleave() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat_logs.csv");
        let log = Arc::new(CsvAuditLog::new(&path));
        let ctx = group_context();

        let mut tasks = Vec::new();
        for i in 0..20 {
            let log = Arc::clone(&log);
            let ctx = ctx.clone();
            tasks.push(tokio::spawn(async move {
                log.record(AuditRecord::new(&ctx, QueryClass::Query, format!("q{i}"), "a".repeat(500)))
                    .await
                    .unwrap();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let rows = read_rows(&path);
        assert_eq!(rows.len(), 21);
        assert!(rows[1..].iter().all(|r| r.len() == 8));
    }
}
