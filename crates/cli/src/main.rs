//! Customer profile CLI - developer tooling for the profile service.
//!
//! # Usage
//!
//! ```bash
//! # Mint a bearer token accepted by GET/POST /profile/{id}
//! profile-cli token issue --sub user-1 --scope profile --ttl-minutes 30
//!
//! # Verify a token and print its claims
//! profile-cli token inspect <token>
//!
//! # Hash a password read from stdin
//! printf '%s' 'p1' | profile-cli password hash
//! ```
//!
//! # Commands
//!
//! - `token issue` - Sign a token with `PROFILE_TOKEN_SECRET`
//! - `token inspect` - Verify a token and show its claims
//! - `password hash` - Produce an Argon2id PHC string

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

use commands::token::IssueArgs;

#[derive(Parser)]
#[command(name = "profile-cli")]
#[command(author, version, about = "Customer profile CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Issue and inspect bearer tokens
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },
    /// Password utilities
    Password {
        #[command(subcommand)]
        action: PasswordAction,
    },
}

#[derive(Subcommand)]
enum TokenAction {
    /// Sign a new token
    Issue(IssueArgs),
    /// Verify a token and print its claims
    Inspect {
        /// The compact token
        token: String,
    },
}

#[derive(Subcommand)]
enum PasswordAction {
    /// Hash a password read from stdin
    Hash,
}

fn main() {
    // Logs go to stderr; stdout carries the command output
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "customer_profile_cli=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(output) => {
            #[allow(clippy::print_stdout)]
            {
                println!("{output}");
            }
        }
        Err(e) => {
            tracing::error!("Command failed: {e}");
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<String, Box<dyn std::error::Error>> {
    let output = match cli.command {
        Commands::Token { action } => match action {
            TokenAction::Issue(args) => commands::token::issue(&args)?,
            TokenAction::Inspect { token } => commands::token::inspect(&token)?,
        },
        Commands::Password { action } => match action {
            PasswordAction::Hash => commands::password::hash(std::io::stdin().lock())?,
        },
    };
    Ok(output)
}
