use serde::Serialize;
use sqlx::PgPool;
use std::collections::HashMap;
use tracing::info;

use crate::database::models::aplicativo::{Aplicativo, DatosAplicativo};
use crate::database::models::nota::is_blank;

const APLICATIVO_COLUMNS: &str = "id, nombre, url, categoria, created_at, updated_at";

#[derive(Debug, thiserror::Error)]
pub enum AplicativoError {
    #[error("{message}")]
    Validation {
        message: String,
        field_errors: HashMap<String, String>,
    },
    #[error("Aplicativo {0} not found")]
    NotFound(i64),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CategoriaEliminada {
    pub categoria: String,
    pub eliminados: u64,
}

/// Trim every field and check that all three are present and the URL is an
/// absolute http(s) address.
pub fn validate_datos(datos: DatosAplicativo) -> Result<DatosAplicativo, AplicativoError> {
    let mut field_errors = HashMap::new();

    for (field, value) in [
        ("nombre", &datos.nombre),
        ("url", &datos.url),
        ("categoria", &datos.categoria),
    ] {
        if is_blank(value) {
            field_errors.insert(field.to_string(), "This field is required".to_string());
        }
    }

    if !is_blank(&datos.url) {
        match url::Url::parse(datos.url.trim()) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
            Ok(parsed) => {
                field_errors.insert(
                    "url".to_string(),
                    format!("Unsupported URL scheme '{}'", parsed.scheme()),
                );
            }
            Err(e) => {
                field_errors.insert("url".to_string(), format!("Invalid URL: {}", e));
            }
        }
    }

    if !field_errors.is_empty() {
        return Err(AplicativoError::Validation {
            message: "Invalid aplicativo".to_string(),
            field_errors,
        });
    }

    Ok(DatosAplicativo {
        nombre: datos.nombre.trim().to_string(),
        url: datos.url.trim().to_string(),
        categoria: datos.categoria.trim().to_string(),
    })
}

/// Global list of aplicativos. There is no per-user scoping.
pub struct AplicativoService {
    pool: PgPool,
}

impl AplicativoService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<Aplicativo>, AplicativoError> {
        let query = format!(
            "SELECT {} FROM aplicativos ORDER BY categoria, nombre, id",
            APLICATIVO_COLUMNS
        );
        Ok(sqlx::query_as::<_, Aplicativo>(&query).fetch_all(&self.pool).await?)
    }

    pub async fn categorias(&self) -> Result<Vec<String>, AplicativoError> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT DISTINCT categoria FROM aplicativos ORDER BY categoria")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(|(categoria,)| categoria).collect())
    }

    pub async fn create(&self, datos: DatosAplicativo) -> Result<Aplicativo, AplicativoError> {
        let datos = validate_datos(datos)?;
        let query = format!(
            "INSERT INTO aplicativos (nombre, url, categoria) VALUES ($1, $2, $3) RETURNING {}",
            APLICATIVO_COLUMNS
        );

        let mut tx = self.pool.begin().await?;
        let aplicativo = sqlx::query_as::<_, Aplicativo>(&query)
            .bind(&datos.nombre)
            .bind(&datos.url)
            .bind(&datos.categoria)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;

        info!("Created aplicativo {} ({})", aplicativo.id, aplicativo.nombre);
        Ok(aplicativo)
    }

    pub async fn update(&self, id: i64, datos: DatosAplicativo) -> Result<Aplicativo, AplicativoError> {
        let datos = validate_datos(datos)?;
        let query = format!(
            "UPDATE aplicativos SET nombre = $2, url = $3, categoria = $4, updated_at = now() \
             WHERE id = $1 RETURNING {}",
            APLICATIVO_COLUMNS
        );

        let mut tx = self.pool.begin().await?;
        let aplicativo = sqlx::query_as::<_, Aplicativo>(&query)
            .bind(id)
            .bind(&datos.nombre)
            .bind(&datos.url)
            .bind(&datos.categoria)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(AplicativoError::NotFound(id))?;
        tx.commit().await?;

        Ok(aplicativo)
    }

    pub async fn delete(&self, id: i64) -> Result<(), AplicativoError> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("DELETE FROM aplicativos WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AplicativoError::NotFound(id));
        }
        tx.commit().await?;

        info!("Deleted aplicativo {}", id);
        Ok(())
    }

    /// Remove a category by deleting every aplicativo filed under it
    pub async fn delete_categoria(&self, categoria: &str) -> Result<CategoriaEliminada, AplicativoError> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("DELETE FROM aplicativos WHERE categoria = $1")
            .bind(categoria)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!("Deleted categoria '{}' ({} aplicativos)", categoria, result.rows_affected());
        Ok(CategoriaEliminada {
            categoria: categoria.to_string(),
            eliminados: result.rows_affected(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn datos(nombre: &str, url: &str, categoria: &str) -> DatosAplicativo {
        DatosAplicativo {
            nombre: nombre.into(),
            url: url.into(),
            categoria: categoria.into(),
        }
    }

    #[test]
    fn trims_valid_input() {
        let ok = validate_datos(datos(" Drive ", " https://drive.google.com ", "Ofimática ")).unwrap();
        assert_eq!(ok.nombre, "Drive");
        assert_eq!(ok.url, "https://drive.google.com");
        assert_eq!(ok.categoria, "Ofimática");
    }

    #[test]
    fn reports_every_missing_field() {
        match validate_datos(datos("", "", " ")) {
            Err(AplicativoError::Validation { field_errors, .. }) => {
                assert_eq!(field_errors.len(), 3);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn rejects_relative_and_non_http_urls() {
        assert!(validate_datos(datos("X", "drive.google.com", "C")).is_err());
        assert!(validate_datos(datos("X", "ftp://files.example", "C")).is_err());
        assert!(validate_datos(datos("X", "http://intranet.local:8080/app", "C")).is_ok());
    }
}
