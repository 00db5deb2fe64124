//! # Nudge CLI
//!
//! Scheduled Telegram reminder dispatcher.
//!
//! Usage:
//!   nudge run              # Start the bot: commands + scheduled sends
//!   nudge send-now         # Send one message immediately and exit
//!   nudge config show      # Show effective configuration

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing_subscriber::EnvFilter;

use nudge_core::{Config, NudgeError};
use nudge_scheduler::{parse_times, parse_timezone, Dispatcher, SchedulerEngine};
use nudge_store::{MessagePool, SubscriberStore};
use nudge_telegram::TelegramClient;

#[derive(Parser)]
#[command(
    name = "nudge",
    version,
    about = "Scheduled Telegram reminder dispatcher",
    long_about = "Delivers a random message from a pool to every subscribed chat\nat configured local times of day."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot: command listener + daily schedule
    Run,

    /// Send one message now (to the fixed chat or all subscribers) and exit
    SendNow,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show effective configuration (token masked)
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "nudge=debug,nudge_core=debug,nudge_store=debug,nudge_telegram=debug,nudge_scheduler=debug"
    } else {
        "nudge=info,nudge_store=info,nudge_telegram=info,nudge_scheduler=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    // Load config
    let config = if let Some(path) = &cli.config {
        Config::load_from(std::path::Path::new(path))?
    } else {
        Config::load()?
    };

    match cli.command {
        Commands::Run => run(config).await,
        Commands::SendNow => send_now(config).await,
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                let mut masked = config.clone();
                if masked.bot_token.is_some() {
                    masked.bot_token = Some("***".into());
                }
                println!("{}", toml::to_string_pretty(&masked)?);
                Ok(())
            }
        },
    }
}

/// Verify the credential, or print a diagnostic and signal a clean exit.
/// A missing or rejected token is a startup refusal, not a crash.
async fn connect(config: &Config) -> Result<Option<TelegramClient>> {
    let token = match config.require_token() {
        Ok(t) => t.to_string(),
        Err(NudgeError::TokenMissing) => {
            println!("ERROR: set the BOT_TOKEN environment variable (or bot_token in config.toml).");
            println!("Create a bot with @BotFather on Telegram to obtain a token.");
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    let client = TelegramClient::new(&token);
    match client.get_me().await {
        Ok(me) => {
            tracing::info!(
                "Connected as @{} (id={})",
                me.username.as_deref().unwrap_or("?"),
                me.id
            );
            Ok(Some(client))
        }
        Err(e) => {
            println!("ERROR: could not authenticate bot token: {e}");
            Ok(None)
        }
    }
}

async fn run(config: Config) -> Result<()> {
    let Some(client) = connect(&config).await? else {
        return Ok(());
    };
    let client = Arc::new(client);

    let store = Arc::new(Mutex::new(SubscriberStore::open(config.subscribers_path())));
    let pool = MessagePool::load(&config.messages_path());
    let dispatcher = Arc::new(Dispatcher::new(
        client.clone(),
        store.clone(),
        pool,
        config.mention.clone(),
        config.chat_id,
    ));
    if let Some(id) = config.chat_id {
        tracing::info!("Fixed recipient override active: chat {id}");
    }

    // Scheduler loop — independent of the command loop below.
    let engine = SchedulerEngine::new(
        parse_times(&config.times),
        parse_timezone(&config.timezone),
        dispatcher.clone(),
    );
    tokio::spawn(engine.run());

    tracing::info!("Listening for commands (/start, /stop, /now). Ctrl+C to stop.");
    let mut updates = client.start_polling();

    use futures::StreamExt;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            message = updates.next() => {
                let Some(message) = message else { break };
                commands::handle_message(&message, &client, &store, &dispatcher).await;
            }
        }
    }

    tracing::info!("Shutting down.");
    Ok(())
}

/// One-shot immediate send, then exit. Targets the fixed override chat when
/// configured, otherwise the current subscriber set.
async fn send_now(config: Config) -> Result<()> {
    let Some(client) = connect(&config).await? else {
        return Ok(());
    };
    let client = Arc::new(client);

    let store = Arc::new(Mutex::new(SubscriberStore::open(config.subscribers_path())));
    if config.chat_id.is_none() && store.lock().await.is_empty() {
        println!("No recipients: set CHAT_ID or have chats send /start to the bot first.");
        return Ok(());
    }

    let pool = MessagePool::load(&config.messages_path());
    let dispatcher = Dispatcher::new(
        client,
        store,
        pool,
        config.mention.clone(),
        config.chat_id,
    );

    let summary = dispatcher.dispatch_scheduled().await;
    println!(
        "Sent {}/{} messages ({} failed).",
        summary.delivered, summary.attempted, summary.failed
    );
    Ok(())
}
