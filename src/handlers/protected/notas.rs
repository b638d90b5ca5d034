// handlers/protected/notas.rs - /api/notas/*

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use super::path_id;
use crate::database::models::nota::{AsignarPlantilla, Nota, NuevaNota, ReemplazoPlantilla};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::routes::AppState;
use crate::services::nota_service::LimpiezaPlantillas;
use crate::services::NotaService;

#[derive(Debug, Serialize)]
pub struct Eliminada {
    pub id: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct Confirmacion {
    #[serde(default)]
    pub confirmar: Option<bool>,
}

fn service(state: &AppState) -> NotaService {
    NotaService::new(state.pool.clone())
}

/// GET /api/notas/
pub async fn list(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<Vec<Nota>> {
    Ok(ApiResponse::success(service(&state).list(&user).await?))
}

/// GET /api/notas/avances
pub async fn avances(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<Vec<Nota>> {
    Ok(ApiResponse::success(service(&state).list_avances(&user).await?))
}

/// GET /api/notas/plantillas-disponibles
pub async fn plantillas_disponibles(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Vec<Nota>> {
    Ok(ApiResponse::success(
        service(&state).list_plantillas_disponibles(&user).await?,
    ))
}

/// POST /api/notas/
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<NuevaNota>, JsonRejection>,
) -> ApiResult<Nota> {
    let Json(nueva) = payload?;
    let nota = service(&state).create(&user, nueva).await?;
    Ok(ApiResponse::created(nota))
}

/// POST /api/notas/asignar
pub async fn asignar(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<AsignarPlantilla>, JsonRejection>,
) -> ApiResult<Nota> {
    let Json(asignar) = payload?;
    let nota = service(&state).assign(&user, asignar).await?;
    Ok(ApiResponse::created(nota))
}

/// PUT /api/notas/plantilla/:id
pub async fn replace_plantilla(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<ReemplazoPlantilla>, JsonRejection>,
) -> ApiResult<Nota> {
    let id = path_id(path)?;
    let Json(reemplazo) = payload?;
    let nota = service(&state).replace_plantilla(&user, id, reemplazo).await?;
    Ok(ApiResponse::success(nota))
}

/// DELETE /api/notas/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Eliminada> {
    let id = path_id(path)?;
    service(&state).delete(&user, id).await?;
    Ok(ApiResponse::success(Eliminada { id }).with_message("Nota eliminada"))
}

/// PATCH /api/notas/limpiar-avances/:id
pub async fn limpiar_avances(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Nota> {
    let id = path_id(path)?;
    Ok(ApiResponse::success(service(&state).clear_avances(&user, id).await?))
}

/// DELETE /api/notas/plantilla/:id
pub async fn delete_plantilla(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Eliminada> {
    let id = path_id(path)?;
    service(&state).delete_plantilla(&user, id).await?;
    Ok(ApiResponse::success(Eliminada { id }).with_message("Plantilla eliminada"))
}

/// DELETE /api/notas/limpiar-plantillas-incorrectas?confirmar=true
pub async fn limpiar_plantillas_incorrectas(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    query: Result<Query<Confirmacion>, QueryRejection>,
) -> ApiResult<LimpiezaPlantillas> {
    let Query(confirmacion) = query?;
    let confirmed = confirmacion.confirmar.unwrap_or(false);
    let limpieza = service(&state).cleanup_misnamed(&user, confirmed).await?;
    let message = format!("{} plantillas eliminadas", limpieza.eliminadas);
    Ok(ApiResponse::success(limpieza).with_message(message))
}
