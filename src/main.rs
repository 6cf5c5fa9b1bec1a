//! Unified warden CLI.
//!
//! This binary provides a unified interface to all warden components:
//! - `warden serve` - Run the authentication endpoint
//! - `warden user` - Manage registry accounts

use std::process::ExitCode;

use clap::{Parser, Subcommand};

/// Warden unified CLI.
#[derive(Parser)]
#[command(
    name = "warden",
    version,
    about = "Authentication and accounting control plane for proxy deployments",
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the authentication endpoint.
    #[command(name = "serve", alias = "server")]
    Serve(Box<warden_server::ServerArgs>),

    /// Manage registry accounts.
    #[command(name = "user")]
    User(warden_auth::UserArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve(args) => warden_server::cli::run(*args).await,
        Commands::User(args) => warden_auth::cli::run(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
