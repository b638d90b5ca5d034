use clap::Subcommand;
use serde_json::json;

use crate::cli::client::ApiClient;
use crate::cli::config::{load_preferences, save_preferences};
use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::database::models::nota::{CamposNota, Nota, NuevaNota, TipoNota};

const VISTA_AVANCES: &str = "notas-avances";
const VISTA_PLANTILLAS: &str = "plantillas-adicionales";

#[derive(Subcommand)]
pub enum NotasCommands {
    #[command(about = "List all of your notes")]
    Listar,

    #[command(about = "List progress notes in saved order")]
    Avances,

    #[command(about = "List templates available to you in saved order")]
    Plantillas {
        #[arg(long, help = "Case-insensitive filter on the label")]
        filtro: Option<String>,
    },

    #[command(about = "Create a note")]
    Crear {
        #[arg(long, help = "Label")]
        novedad: String,
        #[arg(long, value_parser = parse_tipo, help = "avance, plantilla or adicional")]
        tipo: Option<TipoNota>,
        #[arg(long)]
        publica: Option<String>,
        #[arg(long)]
        interna: Option<String>,
        #[arg(long)]
        avances: Option<String>,
        #[arg(long)]
        plantilla: Option<String>,
    },

    #[command(about = "Delete a note")]
    Eliminar {
        #[arg(help = "Note id")]
        id: i64,
    },

    #[command(about = "Empty the progress text of a note")]
    LimpiarAvances {
        #[arg(help = "Note id")]
        id: i64,
    },
}

fn parse_tipo(value: &str) -> Result<TipoNota, String> {
    TipoNota::try_from(value.to_lowercase())
}

pub async fn handle(cmd: NotasCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let client = ApiClient::from_session()?;

    match cmd {
        NotasCommands::Listar => {
            let notas: Vec<Nota> = serde_json::from_value(client.get_data("/api/notas").await?)?;
            print_notas(&output_format, notas)
        }
        NotasCommands::Avances => {
            let notas: Vec<Nota> = serde_json::from_value(client.get_data("/api/notas/avances").await?)?;
            let mut store = load_preferences()?;
            let notas = store.view_mut(VISTA_AVANCES).apply_order(notas);
            save_preferences(&store)?;
            print_notas(&output_format, notas)
        }
        NotasCommands::Plantillas { filtro } => {
            let notas: Vec<Nota> =
                serde_json::from_value(client.get_data("/api/notas/plantillas-disponibles").await?)?;
            let mut store = load_preferences()?;
            let notas = store.view_mut(VISTA_PLANTILLAS).apply_order(notas);
            save_preferences(&store)?;

            let notas: Vec<Nota> = match filtro {
                Some(needle) => crate::views::filter_by_nombre(&notas, &needle).into_iter().cloned().collect(),
                None => notas,
            };
            print_notas(&output_format, notas)
        }
        NotasCommands::Crear {
            novedad,
            tipo,
            publica,
            interna,
            avances,
            plantilla,
        } => {
            let nueva = NuevaNota {
                novedad,
                tipo,
                campos: CamposNota {
                    nota_publica: publica.unwrap_or_default(),
                    nota_interna: interna.unwrap_or_default(),
                    nota_avances: avances.unwrap_or_default(),
                    plantilla: plantilla.unwrap_or_default(),
                },
            };
            let response = client.post("/api/notas", &nueva).await?;
            let nota: Nota = serde_json::from_value(response.get("data").cloned().unwrap_or_default())?;
            output_success(
                &output_format,
                &format!("Created {} {} ({})", nota.tipo, nota.id, nota.novedad),
                Some(json!({ "nota": nota })),
            )
        }
        NotasCommands::Eliminar { id } => {
            client.delete(&format!("/api/notas/{}", id)).await?;
            output_success(&output_format, &format!("Deleted nota {}", id), Some(json!({ "id": id })))
        }
        NotasCommands::LimpiarAvances { id } => {
            client.patch(&format!("/api/notas/limpiar-avances/{}", id)).await?;
            output_success(
                &output_format,
                &format!("Cleared progress text on nota {}", id),
                Some(json!({ "id": id })),
            )
        }
    }
}

fn print_notas(output_format: &OutputFormat, notas: Vec<Nota>) -> anyhow::Result<()> {
    if notas.is_empty() {
        return output_empty_collection(output_format, "notas", "No notes found");
    }

    match output_format {
        OutputFormat::Json => output_collection("notas", serde_json::to_value(&notas)?),
        OutputFormat::Text => {
            println!("{:<8} {:<10} {:<30} {}", "ID", "TIPO", "NOVEDAD", "CONTENIDO");
            println!("{}", "-".repeat(90));
            for nota in &notas {
                let contenido = match nota.tipo {
                    TipoNota::Avance => &nota.nota_avances,
                    TipoNota::Plantilla if nota.nota_publica.trim().is_empty() => &nota.nota_interna,
                    TipoNota::Plantilla => &nota.nota_publica,
                    TipoNota::Adicional => &nota.plantilla,
                };
                println!(
                    "{:<8} {:<10} {:<30} {}",
                    nota.id,
                    nota.tipo,
                    truncate(&nota.novedad, 30),
                    truncate(contenido, 40)
                );
            }
            Ok(())
        }
    }
}
