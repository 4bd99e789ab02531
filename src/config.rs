use anyhow::Context;

/// Token lifetime used when `JWT_TTL_MINUTES` is not set.
pub const DEFAULT_TTL_MINUTES: i64 = 30;
/// Upper bound accepted for `JWT_TTL_MINUTES` (one year).
pub const MAX_TTL_MINUTES: i64 = 60 * 24 * 365;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Postgres,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store: StoreBackend,
    pub database_url: Option<String>,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").filter(|v| !v.trim().is_empty());

        let store = match lookup("STORE_BACKEND").map(|v| v.trim().to_lowercase()) {
            Some(v) if v == "memory" => StoreBackend::Memory,
            Some(v) if v == "postgres" => StoreBackend::Postgres,
            Some(other) => anyhow::bail!("unknown STORE_BACKEND `{other}` (expected memory or postgres)"),
            None if database_url.is_some() => StoreBackend::Postgres,
            None => StoreBackend::Memory,
        };
        if store == StoreBackend::Postgres && database_url.is_none() {
            anyhow::bail!("STORE_BACKEND=postgres requires DATABASE_URL");
        }

        let secret = lookup("JWT_SECRET").context("JWT_SECRET must be set")?;
        anyhow::ensure!(!secret.is_empty(), "JWT_SECRET must not be empty");

        let ttl_minutes = match lookup("JWT_TTL_MINUTES") {
            None => DEFAULT_TTL_MINUTES,
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|v| (1..=MAX_TTL_MINUTES).contains(v))
                .with_context(|| {
                    format!("JWT_TTL_MINUTES must be an integer in 1..={MAX_TTL_MINUTES}, got `{raw}`")
                })?,
        };

        let jwt = JwtConfig {
            secret,
            issuer: lookup("JWT_ISSUER").unwrap_or_else(|| "usersapi".into()),
            audience: lookup("JWT_AUDIENCE").unwrap_or_else(|| "usersapi-clients".into()),
            ttl_minutes,
        };
        Ok(Self {
            store,
            database_url,
            jwt,
        })
    }
}
