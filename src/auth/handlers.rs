use axum::{
    extract::{Extension, State},
    http::{header, HeaderMap, StatusCode},
    response::{AppendHeaders, IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::state::AppState;
use crate::auth::{cookies, credentials, jwt, middleware::AuthUser};
use crate::domain::KanbanError;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub email: String,
}

/// Tokens are returned in the body for API clients and as HttpOnly cookies
/// for browsers.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct UserWithPassword {
    id: String,
    username: String,
    display_name: String,
    email: String,
    password_hash: String,
}

async fn fetch_user(
    db: &sqlx::SqlitePool,
    user_id: &str,
) -> Result<Option<UserResponse>, sqlx::Error> {
    sqlx::query_as("SELECT id, username, display_name, email FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(db)
        .await
}

async fn issue_tokens(
    pool: &sqlx::SqlitePool,
    user_id: &str,
) -> Result<(String, String), KanbanError> {
    let signing_key = jwt::get_or_create_signing_key(pool)
        .await
        .map_err(|e| KanbanError::Internal(format!("Failed to load JWT signing key: {}", e)))?;
    let token = jwt::create_token(&signing_key, user_id)
        .map_err(|e| KanbanError::Internal(format!("Failed to create JWT token: {}", e)))?;

    let refresh_token = jwt::create_refresh_token();
    let now = chrono::Utc::now();
    let expires_at = now + chrono::Duration::days(jwt::REFRESH_TOKEN_TTL_DAYS);

    sqlx::query(
        "INSERT INTO refresh_tokens (id, user_id, token_hash, expires_at, created_at, revoked) VALUES (?, ?, ?, ?, ?, 0)",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(user_id)
    .bind(jwt::hash_refresh_token(&refresh_token))
    .bind(expires_at.to_rfc3339())
    .bind(now.to_rfc3339())
    .execute(pool)
    .await?;

    Ok((token, refresh_token))
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Response, KanbanError> {
    let username = credentials::validate_registration(&req.username, &req.password)?;
    let display_name = req
        .display_name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| username.clone());
    let email = req.email.unwrap_or_default();

    let db = state.require_db()?;

    let existing: Option<(String,)> = sqlx::query_as("SELECT id FROM users WHERE username = ?")
        .bind(&username)
        .fetch_optional(db)
        .await?;
    if existing.is_some() {
        return Err(KanbanError::InvalidInput("Username is already taken".into()));
    }

    let password_hash = credentials::hash_password(&req.password)
        .map_err(|e| KanbanError::Internal(format!("Failed to hash password: {}", e)))?;
    let user_id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        "INSERT INTO users (id, username, display_name, email, password_hash, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&user_id)
    .bind(&username)
    .bind(&display_name)
    .bind(&email)
    .bind(&password_hash)
    .bind(&now)
    .bind(&now)
    .execute(db)
    .await?;

    tracing::info!(user_id = user_id.as_str(), "User registered");

    let (token, refresh_token) = issue_tokens(db, &user_id).await?;
    build_auth_response(
        StatusCode::CREATED,
        UserResponse {
            id: user_id,
            username,
            display_name,
            email,
        },
        token,
        refresh_token,
        state.config.cookie_secure,
    )
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Response, KanbanError> {
    let db = state.require_db()?;

    let user: UserWithPassword = sqlx::query_as(
        "SELECT id, username, display_name, email, password_hash FROM users WHERE username = ?",
    )
    .bind(req.username.trim())
    .fetch_optional(db)
    .await?
    .ok_or_else(|| KanbanError::Unauthenticated("Invalid username or password".into()))?;

    let valid = credentials::verify_password(&req.password, &user.password_hash)
        .map_err(|e| KanbanError::Internal(format!("Failed to verify password: {}", e)))?;
    if !valid {
        return Err(KanbanError::Unauthenticated(
            "Invalid username or password".into(),
        ));
    }

    let (token, refresh_token) = issue_tokens(db, &user.id).await?;
    build_auth_response(
        StatusCode::OK,
        UserResponse {
            id: user.id,
            username: user.username,
            display_name: user.display_name,
            email: user.email,
        },
        token,
        refresh_token,
        state.config.cookie_secure,
    )
}

/// Rotates a refresh token: the presented one is revoked and a new pair issued.
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
    req: Option<Json<RefreshRequest>>,
) -> Result<Response, KanbanError> {
    let db = state.require_db()?;
    let presented = cookies::cookie_value(&headers, cookies::REFRESH_TOKEN_COOKIE)
        .or_else(|| req.map(|Json(body)| body.refresh_token.trim().to_string()))
        .filter(|token| !token.is_empty())
        .ok_or_else(|| KanbanError::Unauthenticated("Invalid refresh token".into()))?;
    let now = chrono::Utc::now().to_rfc3339();

    let (token_id, user_id): (String, String) = sqlx::query_as(
        "SELECT id, user_id FROM refresh_tokens WHERE token_hash = ? AND revoked = 0 AND expires_at > ? ORDER BY created_at DESC LIMIT 1",
    )
    .bind(jwt::hash_refresh_token(&presented))
    .bind(&now)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| KanbanError::Unauthenticated("Invalid refresh token".into()))?;

    sqlx::query("UPDATE refresh_tokens SET revoked = 1 WHERE id = ?")
        .bind(&token_id)
        .execute(db)
        .await?;

    let user = fetch_user(db, &user_id)
        .await?
        .ok_or_else(|| KanbanError::Unauthenticated("Invalid refresh token".into()))?;

    let (token, refresh_token) = issue_tokens(db, &user.id).await?;
    build_auth_response(
        StatusCode::OK,
        user,
        token,
        refresh_token,
        state.config.cookie_secure,
    )
}

pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, KanbanError> {
    let db = state.require_db()?;

    if let Some(refresh_token) = cookies::cookie_value(&headers, cookies::REFRESH_TOKEN_COOKIE) {
        sqlx::query("UPDATE refresh_tokens SET revoked = 1 WHERE token_hash = ?")
            .bind(jwt::hash_refresh_token(&refresh_token))
            .execute(db)
            .await?;
    }

    let secure = state.config.cookie_secure;
    Ok((
        StatusCode::NO_CONTENT,
        AppendHeaders([
            (
                header::SET_COOKIE,
                cookies::build_clear_cookie(cookies::ACCESS_TOKEN_COOKIE, secure),
            ),
            (
                header::SET_COOKIE,
                cookies::build_clear_cookie(cookies::REFRESH_TOKEN_COOKIE, secure),
            ),
        ]),
    )
        .into_response())
}

pub async fn me(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<UserResponse>, KanbanError> {
    let db = state.require_db()?;
    let user = fetch_user(db, &auth_user.user_id)
        .await?
        .ok_or_else(|| KanbanError::NotFound("User not found".into()))?;
    Ok(Json(user))
}

fn build_auth_response(
    status: StatusCode,
    user: UserResponse,
    access_token: String,
    refresh_token: String,
    secure: bool,
) -> Result<Response, KanbanError> {
    let access_cookie = cookies::build_token_cookie(
        cookies::ACCESS_TOKEN_COOKIE,
        &access_token,
        jwt::ACCESS_TOKEN_TTL_SECS,
        secure,
    );
    let refresh_cookie = cookies::build_token_cookie(
        cookies::REFRESH_TOKEN_COOKIE,
        &refresh_token,
        jwt::REFRESH_TOKEN_TTL_DAYS * 24 * 60 * 60,
        secure,
    );

    let body = AuthResponse {
        user,
        access_token,
        refresh_token,
        expires_in: jwt::ACCESS_TOKEN_TTL_SECS,
    };

    Ok((
        status,
        AppendHeaders([
            (header::SET_COOKIE, access_cookie),
            (header::SET_COOKIE, refresh_cookie),
        ]),
        Json(body),
    )
        .into_response())
}
