use std::{env, time::Duration};

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub db_max_connections: u32,
    /// Upper bound for one order-submission transaction.
    pub order_timeout: Duration,
    /// Reject orders whose total differs from the sum of their line items.
    pub strict_totals: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET is not set")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = parse_or("APP_PORT", 3000u16)?;
        let token_ttl = Duration::from_secs(parse_or("TOKEN_TTL_MINUTES", 60u64)? * 60);
        let db_max_connections = parse_or("DB_MAX_CONNECTIONS", 10u32)?;
        let order_timeout = Duration::from_secs(parse_or("ORDER_TIMEOUT_SECS", 10u64)?);
        let strict_totals = parse_or("ORDER_STRICT_TOTALS", true)?;

        Ok(Self {
            database_url,
            host,
            port,
            jwt_secret,
            token_ttl,
            db_max_connections,
            order_timeout,
            strict_totals,
        })
    }
}

fn parse_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("invalid value for {key}: {raw:?}")),
        Err(_) => Ok(default),
    }
}
