use std::path::PathBuf;
use std::str::FromStr;

use sqlx::postgres::PgConnectOptions;

use crate::auth::jwt::JwtConfig;

/// Errors raised while reading configuration from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Parse `name` from the environment, falling back to `default` when unset.
pub fn parse_env<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Credentials for the admin account seeded into an empty database.
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub username: String,
    pub password: String,
}

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// PostgreSQL connection options.
    pub database: PgConnectOptions,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Spreadsheet read by `POST /import`.
    pub import_file_path: PathBuf,
    pub jwt: JwtConfig,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                           |
    /// |----------------------------|-----------------------------------|
    /// | `HOST`                     | `0.0.0.0`                         |
    /// | `PORT`                     | `3000`                            |
    /// | `DATABASE_URL`             | built from `DB_*` (see below)     |
    /// | `CORS_ORIGINS`             | `http://localhost:5173`           |
    /// | `REQUEST_TIMEOUT_SECS`     | `30`                              |
    /// | `IMPORT_FILE_PATH`         | `data/import.xlsx`                |
    /// | `BOOTSTRAP_ADMIN_USERNAME` | unset                             |
    /// | `BOOTSTRAP_ADMIN_PASSWORD` | unset                             |
    pub fn from_env() -> Result<Self, ConfigError> {
        let cors_origins = env_or("CORS_ORIGINS", "http://localhost:5173")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let bootstrap_admin = match (
            std::env::var("BOOTSTRAP_ADMIN_USERNAME"),
            std::env::var("BOOTSTRAP_ADMIN_PASSWORD"),
        ) {
            (Ok(username), Ok(password)) if !username.trim().is_empty() => Some(BootstrapAdmin {
                username: username.trim().to_string(),
                password,
            }),
            _ => None,
        };

        Ok(Self {
            host: env_or("HOST", "0.0.0.0"),
            port: parse_env("PORT", 3000)?,
            database: database_options_from_env()?,
            cors_origins,
            request_timeout_secs: parse_env("REQUEST_TIMEOUT_SECS", 30)?,
            import_file_path: PathBuf::from(env_or("IMPORT_FILE_PATH", "data/import.xlsx")),
            jwt: JwtConfig::from_env()?,
            bootstrap_admin,
        })
    }
}

/// `DATABASE_URL` if set, otherwise assembled from `DB_HOST` (`localhost`),
/// `DB_PORT` (`5432`), `DB_NAME` (`cmms`), `DB_USER` (`postgres`) and
/// `DB_PASSWORD` (empty).
fn database_options_from_env() -> Result<PgConnectOptions, ConfigError> {
    if let Ok(url) = std::env::var("DATABASE_URL") {
        if !url.trim().is_empty() {
            return PgConnectOptions::from_str(url.trim()).map_err(|_| ConfigError::Invalid {
                name: "DATABASE_URL",
                value: url,
            });
        }
    }
    let port: u16 = parse_env("DB_PORT", 5432)?;
    Ok(build_connect_options(
        &env_or("DB_HOST", "localhost"),
        port,
        &env_or("DB_NAME", "cmms"),
        &env_or("DB_USER", "postgres"),
        &env_or("DB_PASSWORD", ""),
    ))
}

/// Connection options from discrete parts. Values are passed through
/// as-is, so passwords may contain URL-reserved characters.
pub fn build_connect_options(
    host: &str,
    port: u16,
    name: &str,
    user: &str,
    password: &str,
) -> PgConnectOptions {
    let options = PgConnectOptions::new()
        .host(host)
        .port(port)
        .database(name)
        .username(user);
    if password.is_empty() {
        options
    } else {
        options.password(password)
    }
}
