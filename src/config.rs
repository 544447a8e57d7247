use std::str::FromStr;

use anyhow::Context;
use serde::Deserialize;
use sqlx::postgres::PgConnectOptions;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookingConfig {
    /// Used when the `prices` table has no active row.
    pub default_nightly_price: f64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: PgConnectOptions,
    pub jwt: JwtConfig,
    pub server: ServerConfig,
    pub booking: BookingConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database = match std::env::var("DATABASE_URL") {
            Ok(url) => {
                PgConnectOptions::from_str(&url).context("DATABASE_URL is not a valid URL")?
            }
            Err(_) => database_from_parts(
                &env_or("DB_HOST", "localhost"),
                &env_or("DB_PORT", "5432"),
                &env_or("DB_USER", "postgres"),
                &std::env::var("DB_PASSWORD")
                    .context("DATABASE_URL or DB_PASSWORD must be set")?,
                &env_or("DB_NAME", "posada_db"),
            )?,
        };
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            issuer: env_or("JWT_ISSUER", "posada"),
            audience: env_or("JWT_AUDIENCE", "posada-users"),
            ttl_minutes: env_parse("JWT_TTL_MINUTES", 30)?,
            refresh_ttl_minutes: env_parse("JWT_REFRESH_TTL_MINUTES", 60 * 24 * 14)?,
        };
        let server = ServerConfig {
            host: env_or("APP_HOST", "0.0.0.0"),
            port: std::env::var("APP_PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()
                .context("APP_PORT must be a valid port number")?,
        };
        let booking = BookingConfig {
            default_nightly_price: env_parse("DEFAULT_NIGHTLY_PRICE", 50_000.0)?,
        };
        anyhow::ensure!(
            booking.default_nightly_price.is_finite() && booking.default_nightly_price > 0.0,
            "DEFAULT_NIGHTLY_PRICE must be a positive amount"
        );
        Ok(Self {
            database,
            jwt,
            server,
            booking,
        })
    }
}

/// Connection options from the discrete `DB_*` settings. Credentials are passed
/// as-is, so any character is allowed in them.
pub fn database_from_parts(
    host: &str,
    port: &str,
    user: &str,
    password: &str,
    database: &str,
) -> anyhow::Result<PgConnectOptions> {
    anyhow::ensure!(!host.is_empty(), "DB_HOST must not be empty");
    anyhow::ensure!(!user.is_empty(), "DB_USER must not be empty");
    anyhow::ensure!(!database.is_empty(), "DB_NAME must not be empty");
    let port: u16 = port
        .parse()
        .with_context(|| format!("DB_PORT must be numeric, got {:?}", port))?;
    Ok(PgConnectOptions::new()
        .host(host)
        .port(port)
        .username(user)
        .password(password)
        .database(database))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parses `key` when set; a value that does not parse is an error, not the default.
fn env_parse<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value {raw:?}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_options_from_parts() {
        let opts = database_from_parts("db", "5433", "posada", "s3cret", "posada_db")
            .expect("valid parts");
        assert_eq!(opts.get_host(), "db");
        assert_eq!(opts.get_port(), 5433);
        assert_eq!(opts.get_username(), "posada");
        assert_eq!(opts.get_database(), Some("posada_db"));
    }

    #[test]
    fn reserved_characters_in_credentials_do_not_move_the_host() {
        let opts = database_from_parts("db", "5432", "posada@ops", "p@ss/w#rd:1", "posada_db")
            .expect("valid parts");
        assert_eq!(opts.get_host(), "db");
        assert_eq!(opts.get_port(), 5432);
        assert_eq!(opts.get_username(), "posada@ops");
        assert_eq!(opts.get_database(), Some("posada_db"));
    }

    #[test]
    fn rejects_non_numeric_port() {
        let err = database_from_parts("db", "five", "posada", "pw", "posada_db").unwrap_err();
        assert!(err.to_string().contains("DB_PORT"));
    }

    #[test]
    fn rejects_missing_database_name() {
        assert!(database_from_parts("db", "5432", "posada", "pw", "").is_err());
    }

    #[test]
    fn env_parse_uses_default_when_unset() {
        let ttl: i64 = env_parse("POSADA_TEST_UNSET_TTL", 30).expect("default");
        assert_eq!(ttl, 30);
    }

    #[test]
    fn env_parse_fails_on_garbage() {
        std::env::set_var("POSADA_TEST_BAD_TTL", "thirty");
        let err = env_parse::<i64>("POSADA_TEST_BAD_TTL", 30).unwrap_err();
        std::env::remove_var("POSADA_TEST_BAD_TTL");
        assert!(err.to_string().contains("POSADA_TEST_BAD_TTL"));
    }

    #[test]
    fn env_parse_reads_a_valid_price() {
        std::env::set_var("POSADA_TEST_PRICE", " 62500.50 ");
        let price: f64 = env_parse("POSADA_TEST_PRICE", 50_000.0).expect("valid price");
        std::env::remove_var("POSADA_TEST_PRICE");
        assert_eq!(price, 62_500.5);
    }
}
