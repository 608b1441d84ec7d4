//! Command-line interface for Yellows
//!
//! `yellows serve` runs the HTTP server. The `login` subcommands are
//! the administrative provisioning surface: login records are only ever
//! created or revoked here, never by the login flow itself.

use crate::config::Config;
use crate::model::LoginRecord;
use crate::secrets::{EnvSecretsProvider, SecretsProvider};
use crate::storage::create_storage_from_config;
use crate::{Result, StorageError};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "yellows", version, about = "Yellows - event attendance tracking backend")]
struct Cli {
    /// Path to the config file (defaults to yellows.config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve,

    /// Administer login records
    #[command(subcommand)]
    Login(LoginCommand),
}

#[derive(Subcommand)]
enum LoginCommand {
    /// Provision a login record
    Add {
        /// Provider-qualified id, e.g. 80351110224678912@discord
        login_id: String,

        /// Capability tags, comma separated (e.g. event-admin)
        #[arg(long, value_delimiter = ',')]
        scope: Vec<String>,
    },

    /// Revoke a login record; outstanding session tokens stop working
    /// at their next gate check
    Rm {
        login_id: String,
    },

    /// Print a login record
    Show {
        login_id: String,
    },
}

/// Parse arguments and run the requested command
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    let secrets: Arc<dyn SecretsProvider> = Arc::new(EnvSecretsProvider::new());
    let config = match &cli.config {
        Some(path) => Config::load_from_path(path, &secrets).await?,
        None => Config::load(&secrets).await?,
    };

    match cli.command {
        Command::Serve => crate::http::start_server(config).await,
        Command::Login(command) => run_login_command(&config, command).await,
    }
}

async fn run_login_command(config: &Config, command: LoginCommand) -> Result<()> {
    let storage = create_storage_from_config(&config.storage).await?;

    match command {
        LoginCommand::Add { login_id, scope } => {
            storage
                .put_login(&LoginRecord::new(login_id.clone(), scope))
                .await?;
            println!("provisioned {}", login_id);
            Ok(())
        }
        LoginCommand::Rm { login_id } => {
            storage.delete_login(&login_id).await?;
            println!("revoked {}", login_id);
            Ok(())
        }
        LoginCommand::Show { login_id } => match storage.get_login(&login_id).await? {
            Some(login) => {
                println!("{}", serde_json::to_string_pretty(&login)?);
                Ok(())
            }
            None => Err(StorageError::NotFound {
                entity: "login",
                id: login_id,
            }
            .into()),
        },
    }
}
