use std::collections::HashSet;

use anyhow::Result;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use uuid::Uuid;

pub const ACCESS_TOKEN_TTL_SECS: i64 = 15 * 60;
pub const REFRESH_TOKEN_TTL_DAYS: i64 = 30;

const SIGNING_KEY_NAME: &str = "jwt_signing_key";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub iat: usize,
    pub nbf: usize,
    pub jti: String,
}

/// Loads the HS256 key, generating and storing one on first use.
pub async fn get_or_create_signing_key(pool: &SqlitePool) -> Result<Vec<u8>> {
    let existing: Option<(Vec<u8>,)> =
        sqlx::query_as("SELECT value FROM app_secrets WHERE key = ?")
            .bind(SIGNING_KEY_NAME)
            .fetch_optional(pool)
            .await?;

    if let Some((value,)) = existing {
        return Ok(value);
    }

    let mut key_bytes = [0_u8; 64];
    rand::thread_rng().fill_bytes(&mut key_bytes);
    let now = chrono::Utc::now().to_rfc3339();

    // A concurrent first request may win the insert; read back whichever landed.
    sqlx::query("INSERT OR IGNORE INTO app_secrets (key, value, created_at) VALUES (?, ?, ?)")
        .bind(SIGNING_KEY_NAME)
        .bind(key_bytes.to_vec())
        .bind(&now)
        .execute(pool)
        .await?;

    let stored: (Vec<u8>,) = sqlx::query_as("SELECT value FROM app_secrets WHERE key = ?")
        .bind(SIGNING_KEY_NAME)
        .fetch_one(pool)
        .await?;

    Ok(stored.0)
}

pub fn create_token(key: &[u8], user_id: &str) -> Result<String> {
    let now = chrono::Utc::now().timestamp() as usize;
    let claims = Claims {
        sub: user_id.to_string(),
        exp: now + ACCESS_TOKEN_TTL_SECS as usize,
        iat: now,
        nbf: now,
        jti: Uuid::new_v4().to_string(),
    };

    let token = encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(key))?;
    Ok(token)
}

pub fn verify_token(key: &[u8], token: &str) -> Result<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_nbf = true;
    validation.required_spec_claims = HashSet::from([
        "exp".to_string(),
        "nbf".to_string(),
        "iat".to_string(),
        "sub".to_string(),
        "jti".to_string(),
    ]);

    let token_data = decode::<Claims>(token, &DecodingKey::from_secret(key), &validation)?;
    Ok(token_data.claims)
}

pub fn create_refresh_token() -> String {
    let mut token_bytes = [0_u8; 32];
    rand::thread_rng().fill_bytes(&mut token_bytes);
    to_hex(&token_bytes)
}

/// Refresh tokens are only ever stored hashed.
pub fn hash_refresh_token(token: &str) -> String {
    to_hex(&Sha256::digest(token.as_bytes()))
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
