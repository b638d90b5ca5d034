// handlers/protected/correos.rs - /api/correos/*
//
// Mail answers with top-level fields instead of a `data` object.

use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::routes::AppState;
use crate::services::mail_service::CorreoSaliente;
use crate::services::MailService;

/// POST /api/correos/enviar
pub async fn enviar(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<CorreoSaliente>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(correo) = payload?;
    tracing::debug!("Usuario {} sending mail", user.id);

    let envio = MailService::new(state.config.smtp.clone()).send(correo).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Correo enviado correctamente",
        "messageId": envio.message_id,
        "adjuntos": envio.adjuntos
    })))
}

/// GET /api/correos/verificar
pub async fn verificar(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let verificacion = MailService::new(state.config.smtp.clone()).verify().await?;
    Ok(Json(json!({
        "success": true,
        "message": "Configuración SMTP verificada",
        "host": verificacion.host,
        "port": verificacion.port,
        "user": verificacion.user,
        "from": verificacion.from
    })))
}
