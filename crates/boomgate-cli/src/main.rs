//! `boomgate` -- CLI binary for the boomgate chat-completion gateway.
//!
//! Provides the following subcommands:
//!
//! - `boomgate chat` -- Send one message, print the reply or stream events.
//! - `boomgate providers` -- List the provider catalog.
//! - `boomgate classify` -- Show the task tag and group order for a message.
//! - `boomgate config show` -- Print the resolved configuration.

use clap::{Parser, Subcommand};

mod commands;

/// boomgate chat-completion gateway CLI.
#[derive(Parser)]
#[command(name = "boomgate", about = "boomgate chat-completion gateway CLI", version)]
struct Cli {
    /// Enable verbose (debug-level) logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Send a message through the gateway.
    Chat(commands::chat::ChatArgs),

    /// List catalog providers.
    Providers(commands::providers::ProvidersArgs),

    /// Classify a message and show the group try-order.
    Classify(commands::classify::ClassifyArgs),

    /// Show resolved configuration.
    Config {
        #[command(subcommand)]
        action: ConfigCmd,
    },
}

/// Subcommands for `boomgate config`.
#[derive(Subcommand)]
enum ConfigCmd {
    /// Show the full resolved configuration.
    Show {
        /// Config file path (overrides auto-discovery).
        #[arg(short, long)]
        config: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Chat(args) => commands::chat::run(args).await?,
        Commands::Providers(args) => commands::providers::run(args)?,
        Commands::Classify(args) => commands::classify::run(args)?,
        Commands::Config { action } => match action {
            ConfigCmd::Show { config } => {
                let cfg = commands::load_config(config.as_deref())?;
                commands::config_cmd::config_show(&cfg);
            }
        },
    }

    Ok(())
}
