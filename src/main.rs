use std::sync::Arc;

use nutribot::agent::Agent;
use nutribot::channels::{Channel, TelegramChannel};
use nutribot::config::BotConfig;
use nutribot::dialogue::DialogueMachine;
use nutribot::llm::{ChatCompletionsClient, GenerationClient};
use nutribot::store::{CsvProfileStore, ProfileStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = BotConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        eprintln!("  export TELEGRAM_BOT_TOKEN=123456:ABC...");
        eprintln!("  export NUTRIBOT_API_KEY=...");
        std::process::exit(1);
    });

    eprintln!("🥗 Nutribot v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", config.model);
    eprintln!("   Profiles: {}", config.profile_path.display());
    if config.allowed_users.is_empty() {
        eprintln!("   Access: open (set TELEGRAM_ALLOWED_USERS to restrict)");
    } else {
        eprintln!("   Access: {} allowed user(s)", config.allowed_users.len());
    }

    let store: Arc<dyn ProfileStore> =
        Arc::new(CsvProfileStore::open(&config.profile_path).await.unwrap_or_else(|e| {
            eprintln!(
                "Error: Failed to open profile store at {}: {}",
                config.profile_path.display(),
                e
            );
            std::process::exit(1);
        }));

    let llm: Arc<dyn GenerationClient> = Arc::new(ChatCompletionsClient::new(
        config.api_base.clone(),
        config.api_key.clone(),
        config.model.clone(),
    ));

    let channel: Arc<dyn Channel> = Arc::new(TelegramChannel::new(
        config.telegram_token.clone(),
        config.allowed_users.clone(),
    ));

    let machine = DialogueMachine::new(Arc::clone(&store));
    let agent = Agent::new(&config, channel, machine, llm);

    agent.run().await?;
    Ok(())
}
