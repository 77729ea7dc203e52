use std::{fmt, path::PathBuf};

use clap::{Args, Parser, Subcommand};
use docvault_core::documents::DocumentId;
use docvault_core::identity::Role;

/// Operator CLI for DocVault
#[derive(Parser, Debug)]
#[command(name = "docvaultctl", version)]
#[command(about = "Manage DocVault accounts, documents and database schema")]
pub struct Cli {
    /// TOML configuration file (overrides DOCVAULT_CONFIG)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Skip reading a .env file from the working directory
    #[arg(long, global = true)]
    pub no_env_file: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Database maintenance
    #[command(subcommand)]
    Db(DbCommand),
    /// Create an identity and its profile
    Register(RegisterArgs),
    /// Verify credentials and print an access token
    Login(LoginArgs),
    /// Store, fetch and remove documents
    #[command(subcommand)]
    Doc(DocCommand),
}

#[derive(Subcommand, Debug)]
pub enum DbCommand {
    /// Apply pending schema migrations
    Migrate,
}

#[derive(Args)]
pub struct RegisterArgs {
    /// Display name stored on the profile
    #[arg(long)]
    pub name: String,
    /// ADMIN or USER
    #[arg(long, value_parser = parse_role, default_value = "USER")]
    pub role: Role,
    #[arg(long)]
    pub email: String,
    /// Plaintext password (prefer the environment variable)
    #[arg(long, env = "DOCVAULT_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Args)]
pub struct LoginArgs {
    #[arg(long)]
    pub email: String,
    #[arg(long, env = "DOCVAULT_PASSWORD", hide_env_values = true)]
    pub password: String,
}

impl fmt::Debug for RegisterArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterArgs")
            .field("name", &self.name)
            .field("role", &self.role)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for LoginArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginArgs")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[derive(Subcommand, Debug)]
pub enum DocCommand {
    /// Upload a file and print its document id
    Put {
        file: PathBuf,
        #[arg(long, default_value = "application/octet-stream")]
        content_type: String,
    },
    /// Download a document to a file, or to stdout
    Get {
        #[arg(value_parser = parse_document_id)]
        id: DocumentId,
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Remove a document; unknown ids are not an error
    Delete {
        #[arg(value_parser = parse_document_id)]
        id: DocumentId,
    },
}

fn parse_role(value: &str) -> Result<Role, String> {
    value
        .to_ascii_uppercase()
        .parse::<Role>()
        .map_err(|err| err.to_string())
}

fn parse_document_id(value: &str) -> Result<DocumentId, String> {
    value
        .parse::<DocumentId>()
        .map_err(|err| format!("invalid document id '{value}': {err}"))
}
