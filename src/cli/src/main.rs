//! Salon CLI - command-line client for the salon booking API.
//!
//! Provides appointment, identity, health, and configuration commands.

mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{appointment, config, health, whoami};
use output::OutputFormat;

/// Salon - booking API client
#[derive(Parser)]
#[command(
    name = "salon",
    version,
    about = "Salon booking API client",
    long_about = "CLI tool for booking and managing salon appointments.",
    propagate_version = true
)]
pub struct Cli {
    /// Output format
    #[arg(short, long, global = true, default_value = "table")]
    output: OutputFormat,

    /// API server URL
    #[arg(long, global = true, env = "SALON_API_URL")]
    api_url: Option<String>,

    /// Bearer token
    #[arg(long, global = true, env = "SALON_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Appointment operations
    #[command(subcommand)]
    Appointment(appointment::AppointmentCommands),

    /// Show the caller's roles and permissions
    Whoami,

    /// Check system health
    Health(health::HealthArgs),

    /// Configuration management
    #[command(subcommand)]
    Config(config::ConfigCommands),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let api_url = cli
        .api_url
        .clone()
        .or_else(config::load_api_url)
        .unwrap_or_else(|| "http://localhost:8080".to_string());
    let token = cli.token.clone().or_else(config::load_token);

    let client = client::ApiClient::new(&api_url, token)?;
    let format = cli.output;

    let result = match cli.command {
        Commands::Appointment(cmd) => appointment::execute(cmd, &client, format).await,
        Commands::Whoami => whoami::execute(&client, format).await,
        Commands::Health(args) => health::execute(args, &client, format).await,
        Commands::Config(cmd) => config::execute(cmd, format).await,
    };

    if let Err(e) = result {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
