use std::{path::Path, sync::Arc, time::Duration};

use {
    anyhow::{Context, bail},
    tracing::{error, info, warn},
};

use {
    parley_channels::{CsvAuditLog, MentionGate},
    parley_chat::{ChatEngine, EngineServices, EngineSettings},
    parley_config::{ParleyConfig, Severity, validate_config},
    parley_media::{DocumentExtractors, FilestackUploader, HttpPageFetcher, MediaStore},
    parley_providers::{CompletionClient, ModelAliases, OpenAiCompatProvider, shared_http_client},
    parley_sessions::HistoryStore,
    parley_telegram::{TelegramBot, TelegramOutbound},
};

/// Load and validate the config, connect to Telegram and poll until Ctrl-C.
pub async fn run(config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = parley_config::load(config_path).context("failed to load config")?;

    let validation = validate_config(&config);
    for d in &validation.diagnostics {
        match d.severity {
            Severity::Error => error!("{d}"),
            Severity::Warning => warn!("{d}"),
            Severity::Info => info!("{d}"),
        }
    }
    if validation.has_errors() {
        bail!(
            "config has {} error(s); run `parley config check` for details",
            validation.count(Severity::Error)
        );
    }

    let telegram = parley_telegram::connect(&config.telegram)
        .await
        .context("failed to connect to telegram")?;
    let poll_timeout_secs = config.telegram.poll_timeout_secs;

    let engine = Arc::new(ChatEngine::new(build_services(config, &telegram)));
    let cancel = parley_telegram::start_polling(&telegram, engine, poll_timeout_secs);
    info!(username = %telegram.username, "parley is running, press Ctrl-C to stop");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    info!("shutting down");
    cancel.cancel();
    Ok(())
}

/// Wire the production implementations of every engine seam.
fn build_services(config: ParleyConfig, telegram: &TelegramBot) -> EngineServices {
    let client = shared_http_client().clone();
    let settings = EngineSettings::from_config(&config.provider, &config.chat);

    let provider = OpenAiCompatProvider::new(
        config.provider.base_url,
        config.provider.api_key,
        Duration::from_secs(config.provider.timeout_secs),
    );

    EngineServices {
        history: Arc::new(HistoryStore::new(
            config.chat.system_prompt,
            config.chat.max_history_messages,
        )),
        completion: CompletionClient::new(ModelAliases::new(config.models), Arc::new(provider)),
        outbound: Arc::new(TelegramOutbound::new(telegram.bot.clone())),
        audit: Arc::new(CsvAuditLog::new(config.audit.path)),
        fetcher: Arc::new(HttpPageFetcher::new(client.clone(), config.chat.web_max_chars)),
        extractors: DocumentExtractors::default(),
        uploader: Arc::new(FilestackUploader::new(
            client,
            config.upload.endpoint,
            config.upload.api_key,
        )),
        media: MediaStore::new(config.media.downloads_dir),
        gate: MentionGate::new(config.telegram.mention_mode, &telegram.username),
        settings,
    }
}
