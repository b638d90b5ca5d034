// handlers/protected/aplicativos.rs - /api/aplicativos/*

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Json,
};

use super::path_id;
use crate::database::models::aplicativo::{Aplicativo, DatosAplicativo};
use crate::middleware::{ApiResponse, ApiResult};
use crate::routes::AppState;
use crate::services::aplicativo_service::CategoriaEliminada;
use crate::services::AplicativoService;

fn service(state: &AppState) -> AplicativoService {
    AplicativoService::new(state.pool.clone())
}

/// GET /api/aplicativos
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<Aplicativo>> {
    Ok(ApiResponse::success(service(&state).list().await?))
}

/// GET /api/aplicativos/categorias
pub async fn categorias(State(state): State<AppState>) -> ApiResult<Vec<String>> {
    Ok(ApiResponse::success(service(&state).categorias().await?))
}

/// POST /api/aplicativos
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<DatosAplicativo>, JsonRejection>,
) -> ApiResult<Aplicativo> {
    let Json(datos) = payload?;
    Ok(ApiResponse::created(service(&state).create(datos).await?))
}

/// PUT /api/aplicativos/:id
pub async fn update(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<DatosAplicativo>, JsonRejection>,
) -> ApiResult<Aplicativo> {
    let id = path_id(path)?;
    let Json(datos) = payload?;
    Ok(ApiResponse::success(service(&state).update(id, datos).await?))
}

/// DELETE /api/aplicativos/:id
pub async fn delete(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<i64> {
    let id = path_id(path)?;
    service(&state).delete(id).await?;
    Ok(ApiResponse::success(id).with_message("Aplicativo eliminado"))
}

/// DELETE /api/aplicativos/categoria/:categoria
pub async fn delete_categoria(
    State(state): State<AppState>,
    Path(categoria): Path<String>,
) -> ApiResult<CategoriaEliminada> {
    Ok(ApiResponse::success(service(&state).delete_categoria(&categoria).await?))
}
