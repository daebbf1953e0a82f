use std::{env, str::FromStr, time::Duration};

use anyhow::{Context, bail};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "pg" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => bail!("unknown STORE_BACKEND `{other}`"),
        }
    }
}

/// Connection settings shared by the server and the `migrate`/`seed` bins.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub connect_timeout: Duration,
    pub max_connections: u32,
}

impl DbConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        Ok(Self {
            url,
            connect_timeout: Duration::from_secs(env_or("DB_CONNECT_TIMEOUT_SECS", 5)?),
            max_connections: env_or("DB_MAX_CONNECTIONS", 10)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store: StoreBackend,
    /// Present whenever `store` is Postgres.
    pub db: Option<DbConfig>,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_audience: Option<String>,
    pub request_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let store = match env::var("STORE_BACKEND") {
            Ok(value) => value.parse()?,
            Err(_) => StoreBackend::Postgres,
        };
        let db = match store {
            StoreBackend::Postgres => Some(DbConfig::from_env()?),
            StoreBackend::Memory => None,
        };
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        Ok(Self {
            store,
            db,
            host,
            port: env_or("APP_PORT", 3000)?,
            jwt_secret,
            jwt_audience: env::var("JWT_AUDIENCE").ok().filter(|a| !a.is_empty()),
            request_timeout: Duration::from_secs(env_or("REQUEST_TIMEOUT_SECS", 15)?),
        })
    }

    pub fn database(&self) -> anyhow::Result<&DbConfig> {
        self.db.as_ref().context("DATABASE_URL must be set")
    }
}

fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    parse_or(key, env::var(key).ok(), default)
}

/// Unset means `default`; a set but malformed value is an error.
fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value `{value}`")),
    }
}
