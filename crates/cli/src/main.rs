//! Eco Brews CLI - catalog seeding and loyalty management.
//!
//! # Usage
//!
//! ```bash
//! # Load menu items, shop products, events and blog posts from YAML
//! eb-cli seed catalog.yaml
//!
//! # Validate a seed file without writing anything
//! eb-cli seed catalog.yaml --dry-run
//!
//! # Credit a member's loyalty balance
//! eb-cli award -u 0b7e7d57-1c4e-4d1b-8a5a-4b0c7e1d2f33 -p 50 -r "Launch party"
//!
//! # Check that the backend answers
//! eb-cli check
//! ```
//!
//! Every command reads `BACKEND_URL` and `BACKEND_ANON_KEY`; `seed` and
//! `award` also need `BACKEND_SERVICE_KEY`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

use eco_brews_core::UserId;

mod commands;

#[derive(Parser)]
#[command(name = "eb-cli")]
#[command(author, version, about = "Eco Brews CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upsert catalog rows from a YAML seed file
    Seed {
        /// Path to the seed file
        file: String,

        /// Parse and validate only
        #[arg(long)]
        dry_run: bool,
    },
    /// Credit loyalty points to a member
    Award {
        /// Member's user id
        #[arg(short, long)]
        user: UserId,

        /// Points to add (positive)
        #[arg(short, long)]
        points: i64,

        /// Ledger description
        #[arg(short, long, default_value = "Bonus points")]
        reason: String,
    },
    /// Check that the backend is reachable
    Check,
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
        Commands::Seed { file, dry_run } => commands::seed::catalog(&file, dry_run).await?,
        Commands::Award {
            user,
            points,
            reason,
        } => commands::loyalty::award(user, points, &reason).await?,
        Commands::Check => commands::check::backend().await?,
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
    fn test_award_parses_user_id() {
        let cli = Cli::try_parse_from([
            "eb-cli",
            "award",
            "-u",
            "0b7e7d57-1c4e-4d1b-8a5a-4b0c7e1d2f33",
            "-p",
            "50",
        ])
        .unwrap_or_else(|e| panic!("{e}"));
        assert!(matches!(
            cli.command,
            Commands::Award { points: 50, ref reason, .. } if reason == "Bonus points"
        ));

        assert!(Cli::try_parse_from(["eb-cli", "award", "-u", "not-a-uuid", "-p", "5"]).is_err());
    }
}
