mod cli;

use std::io::Write;

use anyhow::{Context, anyhow};
use bytes::Bytes;
use clap::Parser;
use docvault_config::{Config, ConfigLoad, ConfigLoader};
use docvault_core::api_types::{DocumentCreatedResponse, LoginResponse, RegisterResponse};
use docvault_core::identity::NewRegistration;
use docvault_core::{DocVault, DocVaultError};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Command, DbCommand, DocCommand, RegisterArgs};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = load_config(&cli)?;
    let vault = DocVault::connect(&config)
        .await
        .map_err(describe)
        .context("failed to initialise services")?;

    match cli.command {
        Command::Db(DbCommand::Migrate) => {
            vault
                .migrate()
                .await
                .map_err(describe)
                .context("database migration failed")?;
            info!("Database migrations applied successfully");
        }
        Command::Register(args) => register(&vault, args).await?,
        Command::Login(args) => {
            let outcome = vault
                .authenticator()
                .login(&args.email, &args.password)
                .await
                .map_err(describe)?;
            print_json(&LoginResponse::from(outcome))?;
        }
        Command::Doc(cmd) => document(&vault, cmd).await?,
    }

    Ok(())
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.with_config_path(path);
    }
    if cli.no_env_file {
        loader = loader.without_env_file();
    }

    let ConfigLoad { config, warnings } = loader.load().context("failed to load configuration")?;

    if config.metadata.env_file_loaded {
        info!("loaded .env file");
    }
    for warning in &warnings.items {
        match &warning.hint {
            Some(hint) => {
                warn!(message = %warning.message, hint = %hint, "configuration warning")
            }
            None => warn!(message = %warning.message, "configuration warning"),
        }
    }
    Ok(config)
}

async fn register(vault: &DocVault, args: RegisterArgs) -> anyhow::Result<()> {
    let RegisterArgs {
        name,
        role,
        email,
        password,
    } = args;
    let identity = vault
        .registrar()
        .register(NewRegistration::new(name, role, email, password))
        .await
        .map_err(describe)?;
    print_json(&RegisterResponse::new(identity))
}

async fn document(vault: &DocVault, cmd: DocCommand) -> anyhow::Result<()> {
    let documents = vault.documents();
    match cmd {
        DocCommand::Put { file, content_type } => {
            let bytes = tokio::fs::read(&file)
                .await
                .with_context(|| format!("failed to read {}", file.display()))?;
            let id = documents
                .put(Bytes::from(bytes), &content_type)
                .await
                .map_err(describe)?;
            print_json(&DocumentCreatedResponse { id })
        }
        DocCommand::Get { id, output } => {
            let doc = documents.get(&id).await.map_err(describe)?;
            match output {
                Some(path) => {
                    tokio::fs::write(&path, &doc.bytes)
                        .await
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    print_json(&doc)
                }
                None => {
                    let mut stdout = std::io::stdout().lock();
                    stdout.write_all(&doc.bytes)?;
                    stdout.flush()?;
                    Ok(())
                }
            }
        }
        DocCommand::Delete { id } => {
            documents.delete(&id).await.map_err(describe)?;
            print_json(&serde_json::json!({ "deleted": id }))
        }
    }
}

/// Render a core error with the status a request layer would answer with.
fn describe(err: DocVaultError) -> anyhow::Error {
    anyhow!("{err} (status {})", err.status_code())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
