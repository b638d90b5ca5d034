pub mod client;
pub mod commands;
pub mod config;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "siged")]
#[command(about = "SIGED CLI - Command-line client for the Despacho B2B API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Issue bearer tokens with the local JWT secret")]
    Token {
        #[command(subcommand)]
        cmd: commands::token::TokenCommands,
    },

    #[command(about = "Select the server and token to use")]
    Sesion {
        #[command(subcommand)]
        cmd: commands::sesion::SesionCommands,
    },

    #[command(about = "Notes, progress notes and templates")]
    Notas {
        #[command(subcommand)]
        cmd: commands::notas::NotasCommands,
    },

    #[command(about = "Bookmarked applications")]
    Aplicativos {
        #[command(subcommand)]
        cmd: commands::aplicativos::AplicativosCommands,
    },

    #[command(about = "Mail relay checks")]
    Correo {
        #[command(subcommand)]
        cmd: commands::correo::CorreoCommands,
    },
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
        Commands::Token { cmd } => commands::token::handle(cmd, output_format).await,
        Commands::Sesion { cmd } => commands::sesion::handle(cmd, output_format).await,
        Commands::Notas { cmd } => commands::notas::handle(cmd, output_format).await,
        Commands::Aplicativos { cmd } => commands::aplicativos::handle(cmd, output_format).await,
        Commands::Correo { cmd } => commands::correo::handle(cmd, output_format).await,
    }
}
