//! People CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! people-cli migrate
//!
//! # Create a user (use --admin for the first one)
//! people-cli user create -e ada@example.com -n "Ada Lovelace" --admin
//!
//! # Create a role
//! people-cli role create pm
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `user create` - Create users
//! - `role create` - Create roles

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "people-cli")]
#[command(author, version, about = "People CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Manage roles
    Role {
        #[command(subcommand)]
        action: RoleAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new user
    Create {
        /// Email address (the one the auth proxy forwards)
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Grant admin rights
        #[arg(long)]
        admin: bool,
    },
}

#[derive(Subcommand)]
enum RoleAction {
    /// Create a new role
    Create {
        /// Role name (`pm` marks project managers)
        name: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::User { action } => match action {
            UserAction::Create { email, name, admin } => {
                commands::user::create(&email, &name, admin).await?;
            }
        },
        Commands::Role { action } => match action {
            RoleAction::Create { name } => {
                commands::role::create(&name).await?;
            }
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_user_create() {
        let cli = Cli::parse_from([
            "people-cli", "user", "create", "-e", "ada@example.com", "-n", "Ada", "--admin",
        ]);
        assert!(matches!(
            cli.command,
            Commands::User {
                action: UserAction::Create { admin: true, .. }
            }
        ));
    }
}
