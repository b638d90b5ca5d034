use clap::Subcommand;
use serde_json::json;

use crate::cli::client::ApiClient;
use crate::cli::config::{load_preferences, save_preferences};
use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::database::models::aplicativo::Aplicativo;
use crate::views::{filter_by_nombre, group_by_categoria};

const VISTA: &str = "aplicativos";

#[derive(Subcommand)]
pub enum AplicativosCommands {
    #[command(about = "List aplicativos grouped by category")]
    Listar {
        #[arg(long, help = "Only this category")]
        categoria: Option<String>,
        #[arg(long, help = "Case-insensitive filter on the name")]
        filtro: Option<String>,
    },

    #[command(about = "Save the display order by listing ids first to last")]
    Ordenar {
        #[arg(required = true, help = "Aplicativo ids in the desired order")]
        ids: Vec<i64>,
    },
}

pub async fn handle(cmd: AplicativosCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        AplicativosCommands::Listar { categoria, filtro } => {
            let client = ApiClient::from_session()?;
            let aplicativos: Vec<Aplicativo> = serde_json::from_value(client.get_data("/api/aplicativos").await?)?;

            let mut store = load_preferences()?;
            let prefs = store.view_mut(VISTA);
            let ordered = prefs.apply_order(aplicativos);
            let visible: Vec<Aplicativo> = filter_by_nombre(&ordered, filtro.as_deref().unwrap_or(""))
                .into_iter()
                .filter(|a| categoria.as_deref().map_or(true, |c| a.categoria.eq_ignore_ascii_case(c.trim())))
                .cloned()
                .collect();
            let groups = prefs.apply_categoria_order(group_by_categoria(&visible));

            if groups.is_empty() {
                save_preferences(&store)?;
                return output_empty_collection(&output_format, "categorias", "No aplicativos found");
            }

            match output_format {
                OutputFormat::Json => {
                    let categorias: Vec<_> = groups
                        .iter()
                        .map(|(nombre, miembros)| json!({ "categoria": nombre, "aplicativos": miembros }))
                        .collect();
                    output_collection("categorias", json!(categorias))?;
                }
                OutputFormat::Text => {
                    for (nombre, miembros) in &groups {
                        println!("{}", nombre);
                        for aplicativo in miembros {
                            println!("  {:<6} {:<30} {}", aplicativo.id, truncate(&aplicativo.nombre, 30), aplicativo.url);
                        }
                    }
                }
            }

            save_preferences(&store)
        }
        AplicativosCommands::Ordenar { ids } => {
            let mut store = load_preferences()?;
            store.view_mut(VISTA).set_order(&ids);
            save_preferences(&store)?;

            output_success(
                &output_format,
                &format!("Saved order for {} aplicativos", store.view(VISTA).orden.len()),
                Some(json!({ "orden": store.view(VISTA).orden })),
            )
        }
    }
}
