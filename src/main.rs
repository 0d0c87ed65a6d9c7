//! Console intake runner.
//!
//! Drives one intake conversation over stdin/stdout with the same handler
//! stack the telephony integration uses: file-backed sessions, the
//! response cache, and the completion provider when configured.
//!
//! ```bash
//! PRACTICE_INTAKE__AI__ENABLED=true \
//! PRACTICE_INTAKE__AI__API_KEY=sk-... \
//! cargo run
//! ```
//!
//! With AI disabled the assistant answers with its deterministic replies.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use practice_intake::adapters::ai::{HttpCompletionProvider, HttpProviderConfig, MockCompletionProvider};
use practice_intake::adapters::memory::{InMemoryIntakeForms, InMemoryMessageLog, InMemoryResponseCache};
use practice_intake::adapters::storage::FileSessionStore;
use practice_intake::application::{
    ConversationStore, HandleUtteranceCommand, HandleUtteranceHandler, SessionGate,
};
use practice_intake::config::AppConfig;
use practice_intake::domain::foundation::TenantId;
use practice_intake::domain::intake::Channel;
use practice_intake::ports::CompletionProvider;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::load()?;
    config.validate()?;

    let sessions = FileSessionStore::open(&config.storage.session_dir).await?;
    let provider: Arc<dyn CompletionProvider> = if config.ai.enabled {
        let api_key = config.ai.api_key.clone().unwrap_or_default();
        let provider_config = HttpProviderConfig::new(api_key)
            .with_model(config.ai.model.clone())
            .with_base_url(config.ai.base_url.clone())
            .with_timeout(config.ai.timeout())
            .with_max_retries(config.ai.max_retries)
            .with_max_tokens(config.ai.max_tokens)
            .with_temperature(config.ai.temperature);
        Arc::new(HttpCompletionProvider::new(provider_config))
    } else {
        // Echoes the deterministic reply.
        Arc::new(MockCompletionProvider::new())
    };

    let handler = HandleUtteranceHandler::new(
        ConversationStore::new(
            Arc::new(sessions),
            config.conversation.inactivity_window_secs,
            config.conversation.history_window,
        ),
        SessionGate::new(),
        provider,
        // A zero TTL makes every lookup miss, which disables memoization.
        Arc::new(
            InMemoryResponseCache::new(if config.cache.enabled {
                config.cache.ttl()
            } else {
                std::time::Duration::ZERO
            })
            .with_max_entries(config.cache.max_entries),
        ),
        Arc::new(InMemoryMessageLog::new()),
        Arc::new(InMemoryIntakeForms::new()),
    )
    .with_max_utterance_len(config.conversation.max_utterance_len);

    let tenant = TenantId::new("console")?;
    let external_id = format!("console-{}", std::process::id());

    let opening = handler
        .open(tenant.clone(), Channel::Web, external_id.clone())
        .await?;
    println!("assistant: {}", opening.reply);

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("you: ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else { break };
        let text = line?;
        if text.trim().is_empty() {
            continue;
        }

        let reply = handler
            .handle(HandleUtteranceCommand {
                tenant_id: tenant.clone(),
                channel: Channel::Web,
                external_id: external_id.clone(),
                text,
            })
            .await?;
        println!("assistant: {}", reply.reply);

        if reply.end_call {
            break;
        }
    }

    Ok(())
}
