pub mod commands;
pub mod config;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::client::{BookshelfClient, ClientError};
use config::{ConfigStore, EnvironmentConfig};

#[derive(Parser)]
#[command(name = "shelf")]
#[command(about = "Shelf CLI - Command-line interface for the Bookshelf API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[arg(long, global = true, env = "SHELF_SERVER", help = "Server URL for this invocation only")]
    pub server: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Sign up, log in and manage the saved session")]
    Auth {
        #[command(subcommand)]
        cmd: commands::auth::AuthCommands,
    },

    #[command(about = "Browse and edit the book catalog")]
    Books {
        #[command(subcommand)]
        cmd: commands::books::BookCommands,
    },

    #[command(about = "Server selection and health")]
    Server {
        #[command(subcommand)]
        cmd: commands::server::ServerCommands,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// State shared by every command for one invocation
pub struct CliContext {
    pub store: ConfigStore,
    pub env: EnvironmentConfig,
    pub output: OutputFormat,
    server_override: Option<String>,
}

impl CliContext {
    pub fn new(store: ConfigStore, output: OutputFormat, server_override: Option<String>) -> anyhow::Result<Self> {
        let env = store.load()?;
        Ok(Self {
            store,
            env,
            output,
            server_override,
        })
    }

    pub fn server_url(&self) -> &str {
        self.server_override.as_deref().unwrap_or_else(|| self.env.server_url())
    }

    pub fn client(&self) -> anyhow::Result<BookshelfClient> {
        Ok(BookshelfClient::new(self.server_url())?)
    }

    pub fn save(&mut self) -> anyhow::Result<()> {
        self.store.save(&mut self.env)
    }

    /// Drop a session the server no longer accepts, then pass the error on
    pub fn handle_client_error(&mut self, err: ClientError) -> anyhow::Error {
        if err.is_unauthorized() && self.env.session.is_authenticated() {
            self.env.session = Default::default();
            if let Err(save_err) = self.save() {
                tracing::warn!("Failed to clear saved session: {}", save_err);
            }
            return anyhow::anyhow!("{}; session cleared, log in again", err);
        }
        err.into()
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    run_with_store(cli, ConfigStore::from_env()?).await
}

pub async fn run_with_store(cli: Cli, store: ConfigStore) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let mut ctx = CliContext::new(store, output_format, cli.server)?;

    match cli.command {
        Commands::Auth { cmd } => commands::auth::handle(cmd, &mut ctx).await,
        Commands::Books { cmd } => commands::books::handle(cmd, &mut ctx).await,
        Commands::Server { cmd } => commands::server::handle(cmd, &mut ctx).await,
    }
}
