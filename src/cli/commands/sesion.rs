use clap::Subcommand;
use serde_json::json;

use crate::cli::config::*;
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum SesionCommands {
    #[command(about = "Save server URL and token for later commands")]
    Usar {
        #[arg(long, help = "Base URL, e.g. http://localhost:4000")]
        url: String,
        #[arg(long, help = "Bearer token")]
        token: String,
    },

    #[command(about = "Show the saved session")]
    Actual,
}

pub async fn handle(cmd: SesionCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        SesionCommands::Usar { url, token } => {
            url::Url::parse(&url).map_err(|e| anyhow::anyhow!("Invalid URL '{}': {}", url, e))?;

            let session = SessionConfig::new(url, token);
            let base = session.url.clone().unwrap_or_default();
            let status = ping_server(&base).await;
            if status == ServerStatus::Down {
                tracing::warn!("{} did not answer /health; saving anyway", base);
            }
            save_session_config(&session)?;

            output_success(
                &output_format,
                &format!("Session saved for {}", base),
                Some(json!({ "url": base, "status": status })),
            )
        }
        SesionCommands::Actual => {
            let session = load_session_config()?;
            let Some(url) = session.url else {
                return match output_format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&json!({ "current_session": null }))?);
                        Ok(())
                    }
                    OutputFormat::Text => {
                        println!("No session configured");
                        Ok(())
                    }
                };
            };

            let status = ping_server(&url).await;
            match output_format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&json!({
                            "current_session": {
                                "url": url,
                                "has_token": session.token.is_some(),
                                "updated_at": session.updated_at,
                                "status": status
                            }
                        }))?
                    );
                }
                OutputFormat::Text => {
                    println!("URL: {}", url);
                    println!("Token: {}", if session.token.is_some() { "set" } else { "missing" });
                    println!("Status: {:?}", status);
                }
            }
            Ok(())
        }
    }
}
