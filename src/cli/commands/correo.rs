use clap::Subcommand;
use serde_json::json;

use crate::cli::client::ApiClient;
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum CorreoCommands {
    #[command(about = "Check that the server can log in to its SMTP relay")]
    Verificar,
}

pub async fn handle(cmd: CorreoCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        CorreoCommands::Verificar => {
            let response = ApiClient::from_session()?.get("/api/correos/verificar").await?;
            let field = |name: &str| response.get(name).cloned().unwrap_or_default();

            output_success(
                &output_format,
                &format!(
                    "SMTP relay {}:{} accepted credentials for {}",
                    field("host").as_str().unwrap_or("?"),
                    field("port"),
                    field("user").as_str().unwrap_or("?")
                ),
                Some(json!({
                    "host": field("host"),
                    "port": field("port"),
                    "user": field("user"),
                    "from": field("from")
                })),
            )
        }
    }
}
