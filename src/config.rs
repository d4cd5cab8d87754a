use std::{env, fmt::Display, str::FromStr};

use anyhow::{anyhow, Context};
use tracing::{info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(format!("unknown environment `{other}`")),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub environment: Environment,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub nats_url: Option<String>,
    pub jwt_secret: String,
    pub jwt_expires_in_days: i64,
    pub jwt_cookie_expires_in_days: i64,
    pub bcrypt_cost: u32,
    pub frontend_url: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let jwt_secret = var("JWT_SECRET").ok_or_else(|| anyhow!("JWT_SECRET must be set"))?;

        Ok(Self {
            port: try_load("PORT", "8083")?,
            environment: try_load("APP_ENV", "development")?,
            database_url: var("DATABASE_URL"),
            database_max_connections: try_load("DATABASE_MAX_CONNECTIONS", "10")?,
            nats_url: var("NATS_URL"),
            jwt_secret,
            jwt_expires_in_days: try_load("JWT_EXPIRES_IN_DAYS", "90")?,
            jwt_cookie_expires_in_days: try_load("JWT_COOKIE_EXPIRES_IN_DAYS", "90")?,
            bcrypt_cost: try_load("BCRYPT_COST", "12")?,
            frontend_url: try_load("FRONTEND_URL", "http://localhost:5173")?,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Settings for tests and local tooling: cheap hashing, no external services.
    pub fn for_tests() -> Self {
        Self {
            port: 0,
            environment: Environment::Development,
            database_url: None,
            database_max_connections: 1,
            nats_url: None,
            jwt_secret: "test-secret-please-change".to_string(),
            jwt_expires_in_days: 90,
            jwt_cookie_expires_in_days: 90,
            bcrypt_cost: 4,
            frontend_url: "http://localhost:5173".to_string(),
        }
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn try_load<T: FromStr>(key: &str, default: &str) -> anyhow::Result<T>
where
    T::Err: Display,
{
    let raw = var(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse().map_err(|e: T::Err| {
        warn!("Invalid {key} value: {e}");
        anyhow!("{e}")
    })
    .with_context(|| format!("Environment misconfigured: {key}"))
}
