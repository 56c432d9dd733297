use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub cors_origin: String,
    pub cookie_secure: bool,
    /// Upper bound on a single gateway call made over HTTP.
    pub request_timeout_secs: u64,
    /// Base URL `HttpGateway` clients point at.
    pub api_base_url: String,
    pub seed_demo: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(21547);

        Ok(Self {
            port,
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:kanban.db".into()),
            cors_origin: std::env::var("CORS_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:21548,http://127.0.0.1:21548".into()),
            cookie_secure: parse_flag("COOKIE_SECURE")?.unwrap_or(false),
            request_timeout_secs: match std::env::var("REQUEST_TIMEOUT_SECS") {
                Ok(v) => v.parse()?,
                Err(_) => 10,
            },
            api_base_url: std::env::var("API_BASE_URL")
                .unwrap_or_else(|_| format!("http://127.0.0.1:{}", port)),
            seed_demo: parse_flag("SEED_DEMO")?.unwrap_or(false),
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_flag(name: &str) -> Result<Option<bool>, anyhow::Error> {
    match std::env::var(name) {
        Ok(v) => match v.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(Some(true)),
            "0" | "false" | "no" | "" => Ok(Some(false)),
            other => Err(anyhow::anyhow!("{} must be a boolean, got {:?}", name, other)),
        },
        Err(_) => Ok(None),
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 21547,
            database_url: "sqlite:kanban.db".into(),
            cors_origin: "http://localhost:21548,http://127.0.0.1:21548".into(),
            cookie_secure: false,
            request_timeout_secs: 10,
            api_base_url: "http://127.0.0.1:21547".into(),
            seed_demo: false,
        }
    }
}
