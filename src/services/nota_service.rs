use serde::Serialize;
use sqlx::PgPool;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::database::models::nota::{
    is_blank, is_misnamed, AsignarPlantilla, CamposNota, Nota, NuevaNota, ReemplazoPlantilla, TipoNota,
};
use crate::middleware::AuthUser;

const NOTA_COLUMNS: &str = "id, usuario_id, plantilla_id, tipo, novedad, nota_publica, nota_interna, \
                            nota_avances, plantilla, created_at, updated_at";

#[derive(Debug, thiserror::Error)]
pub enum NotaError {
    #[error("{message}")]
    Validation {
        message: String,
        field_errors: HashMap<String, String>,
    },
    #[error("Nota {0} not found")]
    NotFound(i64),
    #[error("Plantilla {0} not available")]
    PlantillaNotAvailable(i64),
    #[error("Confirmation required: {candidates} candidate(s)")]
    ConfirmationRequired { candidates: usize },
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl NotaError {
    fn validation(field_errors: HashMap<String, String>) -> Self {
        NotaError::Validation {
            message: "Missing required fields".to_string(),
            field_errors,
        }
    }
}

/// Result of the mis-named template cleanup
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LimpiezaPlantillas {
    pub eliminadas: u64,
    pub ids: Vec<i64>,
}

/// Validate a create/replace payload and settle its kind.
///
/// `novedad` must not be blank and the content field(s) belonging to the kind
/// must carry text.
pub fn validate_campos(
    novedad: &str,
    tipo: Option<TipoNota>,
    campos: &CamposNota,
) -> Result<TipoNota, NotaError> {
    let mut field_errors = HashMap::new();

    if is_blank(novedad) {
        field_errors.insert("novedad".to_string(), "This field is required".to_string());
    }

    let tipo = tipo.unwrap_or_else(|| TipoNota::infer(campos));
    if !tipo.has_content(campos) {
        let message = format!("A '{}' record needs content in this field", tipo);
        for field in tipo.content_fields() {
            field_errors.insert(field.to_string(), message.clone());
        }
    }

    if field_errors.is_empty() {
        Ok(tipo)
    } else {
        Err(NotaError::validation(field_errors))
    }
}

/// Notes CRUD. Every operation takes the caller explicitly and never touches
/// rows owned by someone else.
pub struct NotaService {
    pool: PgPool,
}

impl NotaService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All records owned by the caller
    pub async fn list(&self, user: &AuthUser) -> Result<Vec<Nota>, NotaError> {
        let query = format!("SELECT {} FROM notas WHERE usuario_id = $1 ORDER BY id", NOTA_COLUMNS);
        let notas = sqlx::query_as::<_, Nota>(&query)
            .bind(user.id)
            .fetch_all(&self.pool)
            .await?;
        Ok(notas)
    }

    /// Caller's progress notes that still have progress text
    pub async fn list_avances(&self, user: &AuthUser) -> Result<Vec<Nota>, NotaError> {
        let query = format!(
            "SELECT {} FROM notas WHERE usuario_id = $1 AND tipo = $2 AND btrim(nota_avances) <> '' ORDER BY id",
            NOTA_COLUMNS
        );
        let notas = sqlx::query_as::<_, Nota>(&query)
            .bind(user.id)
            .bind(TipoNota::Avance.as_str())
            .fetch_all(&self.pool)
            .await?;
        Ok(notas)
    }

    /// Shared base templates plus the caller's own templates
    pub async fn list_plantillas_disponibles(&self, user: &AuthUser) -> Result<Vec<Nota>, NotaError> {
        let query = format!(
            "SELECT {} FROM notas \
             WHERE tipo = ANY($2) AND (usuario_id IS NULL OR usuario_id = $1) \
             ORDER BY usuario_id NULLS FIRST, id",
            NOTA_COLUMNS
        );
        let notas = sqlx::query_as::<_, Nota>(&query)
            .bind(user.id)
            .bind(template_kinds())
            .fetch_all(&self.pool)
            .await?;
        Ok(notas)
    }

    pub async fn create(&self, user: &AuthUser, nueva: NuevaNota) -> Result<Nota, NotaError> {
        let tipo = validate_campos(&nueva.novedad, nueva.tipo, &nueva.campos)?;

        let query = format!(
            "INSERT INTO notas (usuario_id, tipo, novedad, nota_publica, nota_interna, nota_avances, plantilla) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
            NOTA_COLUMNS
        );

        let mut tx = self.pool.begin().await?;
        let nota = sqlx::query_as::<_, Nota>(&query)
            .bind(user.id)
            .bind(tipo.as_str())
            .bind(nueva.novedad.trim())
            .bind(&nueva.campos.nota_publica)
            .bind(&nueva.campos.nota_interna)
            .bind(&nueva.campos.nota_avances)
            .bind(&nueva.campos.plantilla)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;

        info!("Created {} nota {} for usuario {}", nota.tipo, nota.id, user.id);
        Ok(nota)
    }

    /// Copy an available base template into a record owned by the caller
    pub async fn assign(&self, user: &AuthUser, asignar: AsignarPlantilla) -> Result<Nota, NotaError> {
        let mut tx = self.pool.begin().await?;

        let select = format!(
            "SELECT {} FROM notas WHERE id = $1 AND tipo = ANY($3) AND (usuario_id IS NULL OR usuario_id = $2)",
            NOTA_COLUMNS
        );
        let base = sqlx::query_as::<_, Nota>(&select)
            .bind(asignar.plantilla_id)
            .bind(user.id)
            .bind(template_kinds())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(NotaError::PlantillaNotAvailable(asignar.plantilla_id))?;

        let novedad = asignar
            .novedad
            .filter(|n| !is_blank(n))
            .map(|n| n.trim().to_string())
            .unwrap_or_else(|| base.novedad.clone());

        let insert = format!(
            "INSERT INTO notas (usuario_id, plantilla_id, tipo, novedad, nota_publica, nota_interna, nota_avances, plantilla) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {}",
            NOTA_COLUMNS
        );
        let nota = sqlx::query_as::<_, Nota>(&insert)
            .bind(user.id)
            .bind(base.id)
            .bind(base.tipo.as_str())
            .bind(&novedad)
            .bind(&base.nota_publica)
            .bind(&base.nota_interna)
            .bind(&base.nota_avances)
            .bind(&base.plantilla)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;

        info!("Assigned plantilla {} to usuario {} as nota {}", base.id, user.id, nota.id);
        Ok(nota)
    }

    /// Replace label and all four text fields of a caller-owned record
    pub async fn replace_plantilla(
        &self,
        user: &AuthUser,
        id: i64,
        reemplazo: ReemplazoPlantilla,
    ) -> Result<Nota, NotaError> {
        let mut tx = self.pool.begin().await?;

        let select = format!(
            "SELECT {} FROM notas WHERE id = $1 AND usuario_id = $2 FOR UPDATE",
            NOTA_COLUMNS
        );
        let actual = sqlx::query_as::<_, Nota>(&select)
            .bind(id)
            .bind(user.id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(NotaError::NotFound(id))?;

        let tipo = validate_campos(
            &reemplazo.novedad,
            Some(reemplazo.tipo.unwrap_or(actual.tipo)),
            &reemplazo.campos,
        )?;

        let update = format!(
            "UPDATE notas SET tipo = $3, novedad = $4, nota_publica = $5, nota_interna = $6, \
             nota_avances = $7, plantilla = $8, updated_at = now() \
             WHERE id = $1 AND usuario_id = $2 RETURNING {}",
            NOTA_COLUMNS
        );
        let nota = sqlx::query_as::<_, Nota>(&update)
            .bind(id)
            .bind(user.id)
            .bind(tipo.as_str())
            .bind(reemplazo.novedad.trim())
            .bind(&reemplazo.campos.nota_publica)
            .bind(&reemplazo.campos.nota_interna)
            .bind(&reemplazo.campos.nota_avances)
            .bind(&reemplazo.campos.plantilla)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;

        debug!("Replaced nota {} for usuario {}", id, user.id);
        Ok(nota)
    }

    pub async fn delete(&self, user: &AuthUser, id: i64) -> Result<(), NotaError> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("DELETE FROM notas WHERE id = $1 AND usuario_id = $2")
            .bind(id)
            .bind(user.id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(NotaError::NotFound(id));
        }
        tx.commit().await?;

        info!("Deleted nota {} for usuario {}", id, user.id);
        Ok(())
    }

    /// Empty `nota_avances` and nothing else
    pub async fn clear_avances(&self, user: &AuthUser, id: i64) -> Result<Nota, NotaError> {
        let query = format!(
            "UPDATE notas SET nota_avances = '', updated_at = now() \
             WHERE id = $1 AND usuario_id = $2 RETURNING {}",
            NOTA_COLUMNS
        );

        let mut tx = self.pool.begin().await?;
        let nota = sqlx::query_as::<_, Nota>(&query)
            .bind(id)
            .bind(user.id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(NotaError::NotFound(id))?;
        tx.commit().await?;

        debug!("Cleared nota_avances on nota {} for usuario {}", id, user.id);
        Ok(nota)
    }

    pub async fn delete_plantilla(&self, user: &AuthUser, id: i64) -> Result<(), NotaError> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("DELETE FROM notas WHERE id = $1 AND usuario_id = $2 AND tipo = ANY($3)")
            .bind(id)
            .bind(user.id)
            .bind(template_kinds())
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(NotaError::NotFound(id));
        }
        tx.commit().await?;

        info!("Deleted plantilla {} for usuario {}", id, user.id);
        Ok(())
    }

    /// Delete the caller's templates whose label is blank or carries an
    /// auto-generated timestamp suffix. Nothing is deleted unless `confirmed`.
    pub async fn cleanup_misnamed(
        &self,
        user: &AuthUser,
        confirmed: bool,
    ) -> Result<LimpiezaPlantillas, NotaError> {
        let mut tx = self.pool.begin().await?;

        let candidatos: Vec<(i64, String)> = sqlx::query_as(
            "SELECT id, novedad FROM notas WHERE usuario_id = $1 AND tipo = ANY($2) ORDER BY id FOR UPDATE",
        )
        .bind(user.id)
        .bind(template_kinds())
        .fetch_all(&mut *tx)
        .await?;

        let ids: Vec<i64> = candidatos
            .into_iter()
            .filter(|(_, novedad)| is_misnamed(novedad))
            .map(|(id, _)| id)
            .collect();

        if ids.is_empty() {
            return Ok(LimpiezaPlantillas { eliminadas: 0, ids });
        }

        if !confirmed {
            return Err(NotaError::ConfirmationRequired { candidates: ids.len() });
        }

        let result = sqlx::query("DELETE FROM notas WHERE usuario_id = $1 AND id = ANY($2)")
            .bind(user.id)
            .bind(&ids)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!(
            "Removed {} mis-named plantilla(s) for usuario {}",
            result.rows_affected(),
            user.id
        );
        Ok(LimpiezaPlantillas {
            eliminadas: result.rows_affected(),
            ids,
        })
    }
}

fn template_kinds() -> Vec<&'static str> {
    TipoNota::TEMPLATE_KINDS.iter().map(TipoNota::as_str).collect()
}
