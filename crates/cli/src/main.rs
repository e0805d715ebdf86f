mod session_commands;

use std::{path::PathBuf, sync::Arc, time::Duration};

use {
    clap::{Parser, Subcommand},
    tracing::debug,
    tracing_subscriber::EnvFilter,
};

use {
    donna_config::{DonnaConfig, loader},
    donna_conversations::OpenAiConversations,
    donna_dispatch::{Classifier, Dispatcher},
    donna_integrations::IntegrationRegistry,
    donna_sessions::SessionStore,
};

#[derive(Parser)]
#[command(name = "donna", about = "Donna — personal assistant dispatch engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Custom config directory (overrides default ~/.config/donna/).
    #[arg(long, global = true, env = "DONNA_CONFIG_DIR")]
    config_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Dispatch one message and print the handler's response.
    Dispatch {
        /// The message text.
        #[arg(short, long)]
        message: String,
        /// The user the message belongs to.
        #[arg(short, long)]
        user: String,
    },
    /// Session management.
    Sessions {
        #[command(subcommand)]
        action: SessionAction,
    },
    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum SessionAction {
    /// List known sessions.
    List,
    /// Remove sessions idle longer than the TTL (and their remote threads).
    Sweep {
        /// Override the configured idle TTL, in hours.
        #[arg(long)]
        ttl_hours: Option<u64>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration as TOML.
    Show,
}

fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string()));
    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn load_config(config_dir: Option<&PathBuf>) -> DonnaConfig {
    match config_dir {
        Some(dir) => {
            let path = dir.join("donna.toml");
            loader::load_config(&path).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "failed to load config, using defaults");
                DonnaConfig::default()
            })
        },
        None => loader::discover_and_load(),
    }
}

fn session_store(config: &DonnaConfig, config_dir: Option<&PathBuf>) -> anyhow::Result<Arc<SessionStore>> {
    let path = match &config.sessions.store_path {
        Some(path) => path.clone(),
        None => config_dir
            .cloned()
            .or_else(loader::config_dir)
            .ok_or_else(|| anyhow::anyhow!("no config directory available for the session store"))?
            .join("sessions.json"),
    };
    debug!(path = %path.display(), "opening session store");
    Ok(Arc::new(SessionStore::load(path)?))
}

fn conversation_service(config: &DonnaConfig) -> anyhow::Result<Arc<OpenAiConversations>> {
    let api_key = config
        .conversation
        .api_key()
        .ok_or_else(|| anyhow::anyhow!(
            "no API key configured; set [conversation] api_key in donna.toml"
        ))?;
    Ok(Arc::new(OpenAiConversations::new(
        api_key,
        &config.conversation.base_url,
        &config.conversation.model,
    )))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.json_logs);
    let config = load_config(cli.config_dir.as_ref());

    match cli.command {
        Commands::Dispatch { message, user } => {
            let service = conversation_service(&config)?;
            let sessions = session_store(&config, cli.config_dir.as_ref())?;
            // Collaborator services (calendar, travel, mail) are wired by the
            // embedding deployment; the bare CLI dispatches without them and
            // unresolved tool calls degrade to "Unknown function" outputs.
            let registry = Arc::new(IntegrationRegistry::new(config.scheduling.clone()));
            let classifier = Arc::new(Classifier::new(service.clone(), &config.conversation));
            let dispatcher = Dispatcher::new(
                service,
                sessions,
                registry,
                classifier,
                &config.conversation,
            );

            let outcome = dispatcher.dispatch(&message, &user).await;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            if outcome.error.is_some() {
                std::process::exit(1);
            }
        },
        Commands::Sessions { action } => {
            let sessions = session_store(&config, cli.config_dir.as_ref())?;
            match action {
                SessionAction::List => session_commands::list(&sessions).await,
                SessionAction::Sweep { ttl_hours } => {
                    let ttl = Duration::from_secs(
                        ttl_hours.unwrap_or(config.sessions.idle_ttl_hours) * 3600,
                    );
                    let service = conversation_service(&config)?;
                    session_commands::sweep(&sessions, service, ttl).await?;
                },
            }
        },
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                println!("{}", toml::to_string_pretty(&config)?);
            },
        },
    }

    Ok(())
}
