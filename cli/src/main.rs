//! CLI entrypoint for roundtable
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use roundtable_application::{
    ConversationLogger, CredentialStore, InMemoryCredentialStore, NoConversationLogger,
    ResponseResolver, TurnScheduler,
};
use roundtable_domain::ParticipantId;
use roundtable_infrastructure::{
    ConfigLoader, FileConfig, FileCredentialStore, JsonlConversationLogger,
    build_provider_registry, config::expand_home,
};
use roundtable_presentation::{
    ChatRepl, Cli, Command, ConsoleFormatter, KeysCommand, TypingIndicator,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    info!("Starting roundtable");

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_ref());
        let config = load_config(&cli)?;
        println!();
        println!("{}", ConfigLoader::render(&config)?);
        return Ok(());
    }

    let config = load_config(&cli)?;
    check_config(&config)?;

    if cli.no_color || !config.output.color {
        colored::control::set_override(false);
    }

    if let Some(Command::Keys(command)) = &cli.command {
        let store = file_store(&cli, &config)
            .context("API keys cannot be managed without a credentials file")?;
        return run_keys(command, &store, &config);
    }

    // === Dependency Injection ===
    let credentials: Arc<dyn CredentialStore> = match file_store(&cli, &config) {
        Some(store) => Arc::new(store),
        None => Arc::new(InMemoryCredentialStore::default()),
    };

    let client = reqwest::Client::builder()
        .user_agent(concat!("roundtable/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build HTTP client")?;
    let resolver = Arc::new(ResponseResolver::new(build_provider_registry(
        &config.provider_specs(),
        client,
    )));

    let registry = config.to_registry()?;
    let formatter = ConsoleFormatter::new(registry.list());
    let one_shot = cli.prompt.is_some();
    let indicator = TypingIndicator::new(formatter.clone(), config.output.show_typing && !cli.quiet)
        .with_live_messages(!one_shot);

    let scheduler = TurnScheduler::new(
        config.to_scheduler_config(),
        registry,
        resolver,
        credentials,
    )
    .with_observer(Arc::new(indicator))
    .with_logger(conversation_logger(&cli, &config));

    // Single prompt mode
    if let Some(prompt) = &cli.prompt {
        let dispatch = scheduler.send_prompt(prompt)?;
        dispatch.settled().await;

        println!(
            "{}",
            formatter.format_transcript(&scheduler.snapshot().messages)
        );
        scheduler.shutdown().await;
        return Ok(());
    }

    let scheduler = Arc::new(scheduler);
    ChatRepl::new(Arc::clone(&scheduler), formatter)
        .run()
        .await?;
    scheduler.shutdown().await;

    Ok(())
}

fn load_config(cli: &Cli) -> Result<FileConfig> {
    if cli.no_config {
        return Ok(ConfigLoader::load_defaults());
    }
    ConfigLoader::load(cli.config.as_ref()).context("failed to load configuration")
}

fn check_config(config: &FileConfig) -> Result<()> {
    let issues = config.validate();
    for issue in issues.iter().filter(|i| !i.is_error()) {
        warn!("{}", issue.message);
    }

    let errors: Vec<String> = issues
        .iter()
        .filter(|i| i.is_error())
        .map(|i| i.to_string())
        .collect();
    if !errors.is_empty() {
        bail!("invalid configuration:\n  {}", errors.join("\n  "));
    }
    Ok(())
}

fn file_store(cli: &Cli, config: &FileConfig) -> Option<FileCredentialStore> {
    if cli.no_config {
        return None;
    }
    let Some(path) = config.credentials.resolved_path() else {
        warn!("No data directory available; API keys will not be persisted");
        return None;
    };
    Some(FileCredentialStore::new(path).with_env_overrides(config.api_key_envs()))
}

fn conversation_logger(cli: &Cli, config: &FileConfig) -> Arc<dyn ConversationLogger> {
    let path: Option<PathBuf> = cli.conversation_log.clone().or_else(|| {
        config
            .logging
            .conversation_log
            .as_deref()
            .map(expand_home)
    });

    match path.and_then(JsonlConversationLogger::new) {
        Some(logger) => {
            info!("Conversation log: {}", logger.path().display());
            Arc::new(logger)
        }
        None => Arc::new(NoConversationLogger),
    }
}

fn run_keys(command: &KeysCommand, store: &FileCredentialStore, config: &FileConfig) -> Result<()> {
    let known = |id: &str| config.participants.iter().any(|p| p.id.trim() == id);

    match command {
        KeysCommand::Set {
            participant,
            secret,
        } => {
            if !known(participant) {
                warn!("{} is not a configured participant", participant);
            }
            let mut stored = store.stored();
            stored.insert(participant.as_str(), secret.as_str());
            store.put(&stored)?;
            println!("Saved API key for {} in {}", participant, store.path().display());
        }
        KeysCommand::List => {
            let stored = store.stored();
            let all = store.get();
            if all.is_empty() {
                println!("No API keys configured; every participant gives simulated replies.");
            }
            for id in all.ids() {
                let source = if stored.contains(id) { "file" } else { "environment" };
                println!("  {} ({})", id, source);
            }
        }
        KeysCommand::Remove { participant } => {
            let mut stored = store.stored();
            if stored.remove(&ParticipantId::new(participant.as_str())) {
                store.put(&stored)?;
                println!("Removed API key for {}", participant);
            } else {
                println!("No stored API key for {}", participant);
            }
        }
    }
    Ok(())
}
