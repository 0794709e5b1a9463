//! Tokoku CLI - database migrations, user management and catalog seeding.
//!
//! # Usage
//!
//! ```bash
//! # Apply pending migrations
//! tokoku-cli migrate
//!
//! # Create an admin account
//! tokoku-cli user create -u admin -e admin@tokoku.test -p secret123 -r ADMIN
//!
//! # Load categories and items from YAML
//! tokoku-cli seed crates/cli/seeds/catalog.yaml
//! ```
//!
//! Every command reads `TOKOKU_DATABASE_URL` (or `DATABASE_URL`), loading a
//! `.env` file first when present.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "tokoku-cli")]
#[command(author, version, about = "Tokoku CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage user accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Seed categories and items from a YAML file
    Seed {
        /// Path to the YAML catalog
        file: PathBuf,

        /// Parse and validate the file without writing anything
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new user
    Create {
        /// Username (at most 25 characters)
        #[arg(short, long)]
        username: String,

        /// Email address
        #[arg(short, long)]
        email: String,

        /// Plain-text password; stored as an Argon2 hash
        #[arg(short, long)]
        password: String,

        /// Role (`ADMIN`, `COURIER`, `CLIENT`)
        #[arg(short, long, default_value = "ADMIN")]
        role: String,
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

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::User { action } => match action {
            UserAction::Create {
                username,
                email,
                password,
                role,
            } => {
                commands::user::create(&username, &email, &password, &role).await?;
            }
        },
        Commands::Seed { file, dry_run } => commands::seed::run(&file, dry_run).await?,
    }
    Ok(())
}
