use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::auth::{extract_bearer, validate_jwt, Claims};
use crate::error::ApiError;
use crate::routes::AppState;

/// Caller identity taken from a verified token. Handlers receive it through
/// `Extension<AuthUser>` and pass it on explicitly.
#[derive(Clone, Debug, PartialEq)]
pub struct AuthUser {
    pub id: i64,
    pub usuario: Option<String>,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.id,
            usuario: claims.usuario,
        }
    }
}

/// JWT authentication middleware that validates tokens and extracts user context
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // A header that is not valid UTF-8 is as good as malformed
    let header = match request.headers().get(AUTHORIZATION) {
        Some(value) => Some(value.to_str().map_err(|_| crate::auth::TokenError::Malformed)?),
        None => None,
    };

    let token = extract_bearer(header)?;
    let claims = validate_jwt(token, state.config.security.jwt_secret.as_deref())?;

    debug!("Authenticated user {} ({:?})", claims.id, claims.usuario);
    request.extensions_mut().insert(AuthUser::from(claims));

    Ok(next.run(request).await)
}
