// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Every handler here runs behind `jwt_auth_middleware` and receives the
// caller as `Extension<AuthUser>`.

pub mod aplicativos;
pub mod correos;
pub mod notas;

use axum::extract::{rejection::PathRejection, Path};

use crate::error::ApiError;

/// Unwrap a numeric `:id` segment, answering with the JSON error envelope
pub(crate) fn path_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, ApiError> {
    path.map(|Path(id)| id)
        .map_err(|_| ApiError::bad_request("Path parameter 'id' must be an integer"))
}
