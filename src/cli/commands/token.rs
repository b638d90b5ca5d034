use clap::Subcommand;
use serde_json::json;

use crate::auth::{generate_jwt, Claims};
use crate::cli::OutputFormat;
use crate::config;

#[derive(Subcommand)]
pub enum TokenCommands {
    #[command(about = "Mint a token for a user id using JWT_SECRET")]
    Emitir {
        #[arg(long, help = "User id carried in the token")]
        usuario: i64,
        #[arg(long, help = "Display name carried in the token")]
        nombre: Option<String>,
        #[arg(long, help = "Hours until expiry (defaults to SECURITY_JWT_EXPIRY_HOURS)")]
        horas: Option<u64>,
    },
}

pub async fn handle(cmd: TokenCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        TokenCommands::Emitir { usuario, nombre, horas } => {
            let security = &config::config().security;
            let secret = security
                .jwt_secret
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("JWT_SECRET is not set"))?;

            let hours = horas.unwrap_or(security.jwt_expiry_hours);
            let claims = Claims::new(usuario, nombre, hours);
            let token = generate_jwt(&claims, secret)?;

            match output_format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&json!({
                            "token": token,
                            "id": claims.id,
                            "usuario": claims.usuario,
                            "exp": claims.exp
                        }))?
                    );
                }
                OutputFormat::Text => println!("{}", token),
            }
            Ok(())
        }
    }
}
