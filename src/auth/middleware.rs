use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;

use crate::api::state::AppState;
use crate::auth::{cookies, jwt};
use crate::domain::KanbanError;

/// Identity of the caller, inserted into request extensions once the access
/// token checks out.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, KanbanError> {
    let token = access_token(&req)
        .ok_or_else(|| KanbanError::Unauthenticated("Missing access token".into()))?;

    let signing_key = jwt::get_or_create_signing_key(state.require_db()?)
        .await
        .map_err(|e| KanbanError::Internal(format!("Failed to load JWT signing key: {}", e)))?;
    let claims = jwt::verify_token(&signing_key, &token).map_err(|e| {
        tracing::debug!(error = %e, "Rejected access token");
        KanbanError::Unauthenticated("Invalid or expired access token".into())
    })?;

    req.extensions_mut().insert(AuthUser {
        user_id: claims.sub,
    });

    Ok(next.run(req).await)
}

fn access_token(req: &Request) -> Option<String> {
    let bearer = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());

    bearer.or_else(|| cookies::cookie_value(req.headers(), cookies::ACCESS_TOKEN_COOKIE))
}
