pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "portal")]
#[command(about = "Servicios Compartidos operator CLI")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Apply pending SQL migrations")]
    Migrate,

    #[command(about = "Mint a session token for an active user")]
    Token {
        #[arg(long, help = "Email of the user the token is issued to")]
        email: String,
    },

    #[command(about = "Ping the configured database")]
    Health,

    #[command(about = "List SAP companies from the configured companies file")]
    SapCompanies,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Migrate => commands::database::migrate(output_format).await,
        Commands::Token { email } => commands::token::mint(&email, output_format).await,
        Commands::Health => commands::database::health(output_format).await,
        Commands::SapCompanies => commands::sap::list_companies(output_format),
    }
}
