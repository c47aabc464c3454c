//! CLI command definitions and dispatch.

pub mod login;
pub mod logout;
pub mod profile;
pub mod refresh;
pub mod status;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;
use pharmadoc_core::config::AppConfig;
use pharmadoc_core::error::AppError;
use pharmadoc_session::HttpAuthClient;
use pharmadoc_store::SessionStorage;

/// PharmaDoc session tool: log in, refresh, inspect, and log out
#[derive(Debug, Parser)]
#[command(name = "pharmadoc", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Log in and store a fresh token pair
    Login(login::LoginArgs),
    /// Exchange the stored refresh token for a new pair
    Refresh,
    /// Fetch the current user's profile
    Profile,
    /// Show what is stored and when the tokens expire
    Status,
    /// Clear stored tokens and profile
    Logout(logout::LogoutArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        let ctx = Context::open(&self.config).await?;
        match &self.command {
            Commands::Login(args) => login::execute(args, &ctx, self.format).await,
            Commands::Refresh => refresh::execute(&ctx).await,
            Commands::Profile => profile::execute(&ctx, self.format).await,
            Commands::Status => status::execute(&ctx, self.format).await,
            Commands::Logout(args) => logout::execute(args, &ctx).await,
        }
    }
}

/// Everything a command needs: configuration, storage, and the API client.
pub struct Context {
    pub config: AppConfig,
    pub storage: SessionStorage,
    pub api: Arc<HttpAuthClient>,
}

impl Context {
    async fn open(config_path: &str) -> Result<Self, AppError> {
        let config = AppConfig::from_file(config_path)?;
        let storage = SessionStorage::new(pharmadoc_store::open_store(&config.storage).await?);
        let api = Arc::new(HttpAuthClient::new(&config.api)?);
        tracing::debug!(
            base_url = api.base_url(),
            backend = %config.storage.backend,
            "CLI context ready"
        );

        Ok(Self {
            config,
            storage,
            api,
        })
    }
}
