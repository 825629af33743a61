//! Catalog back-office CLI - migrations, seeding and admin accounts.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! bo-cli migrate
//!
//! # Insert the reference roles and permissions
//! bo-cli seed
//!
//! # Create an admin (password from BO_ADMIN_PASSWORD)
//! bo-cli admin create -u root -n "Root" -r super_admin
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "bo-cli")]
#[command(author, version, about = "Catalog back-office CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Insert the reference roles and permissions
    Seed,
    /// Manage admin accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin
    Create {
        /// Login identifier
        #[arg(short, long)]
        user_id: String,

        /// Display name
        #[arg(short = 'n', long)]
        user_name: String,

        /// Role name (repeatable)
        #[arg(short, long = "role")]
        roles: Vec<String>,

        /// Permission name (repeatable)
        #[arg(short, long = "permission")]
        permissions: Vec<String>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed => commands::seed::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                user_id,
                user_name,
                roles,
                permissions,
            } => {
                commands::admin::create(&user_id, &user_name, &roles, &permissions).await?;
            }
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_admin_create_collects_repeated_grants() {
        let cli = Cli::try_parse_from([
            "bo-cli", "admin", "create", "-u", "root", "-n", "Root", "-r", "super_admin", "-p",
            "item.manage", "-p", "brand.manage",
        ])
        .unwrap_or_else(|e| panic!("{e}"));

        let Commands::Admin {
            action: AdminAction::Create {
                roles, permissions, ..
            },
        } = cli.command
        else {
            panic!("expected admin create");
        };
        assert_eq!(roles, ["super_admin"]);
        assert_eq!(permissions, ["item.manage", "brand.manage"]);
    }
}
