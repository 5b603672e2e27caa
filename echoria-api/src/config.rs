//! Portal Configuration Module
//!
//! Settings come from environment variables, optionally seeded from a
//! `.env` file. Only malformed values are fatal here; settings that are
//! merely absent surface as `ConfigurationMissing` where they are used, or
//! disable the bot with a warning.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use echoria_core::NominationCatalog;
use secrecy::SecretString;

use crate::db::DbConfig;
use crate::error::{ApiError, ApiResult};

/// Which dotenv file, if any, populated the environment.
///
/// Loading happens before logging is up, so the caller logs this once the
/// subscriber is installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DotenvSource {
    Env(PathBuf),
    /// `.env` was missing or lacked `CLIENT_ID`.
    Example(PathBuf),
    Missing,
}

impl DotenvSource {
    pub fn log(&self) {
        match self {
            DotenvSource::Env(path) => {
                tracing::debug!(path = %path.display(), "Loaded .env");
            }
            DotenvSource::Example(path) => {
                tracing::warn!(path = %path.display(), "CLIENT_ID missing after .env, loaded .env.example instead");
            }
            DotenvSource::Missing => tracing::debug!("No .env file found"),
        }
    }
}

/// Load `.env` from the working directory, falling back to `.env.example`
/// when it does not provide the OAuth client id.
pub fn load_dotenv() -> DotenvSource {
    match std::env::current_dir() {
        Ok(dir) => load_dotenv_in(&dir),
        Err(_) => DotenvSource::Missing,
    }
}

pub fn load_dotenv_in(dir: &Path) -> DotenvSource {
    let env_path = dir.join(".env");
    let loaded = dotenv::from_path(&env_path).is_ok();

    if std::env::var("CLIENT_ID").is_err() {
        let example = dir.join(".env.example");
        if dotenv::from_path(&example).is_ok() {
            return DotenvSource::Example(example);
        }
    }

    if loaded {
        DotenvSource::Env(env_path)
    } else {
        DotenvSource::Missing
    }
}

// ============================================================================
// OAUTH CONFIGURATION
// ============================================================================

/// Discord OAuth application settings.
#[derive(Debug, Clone, Default)]
pub struct OAuthConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<SecretString>,
    pub redirect_uri: Option<String>,
    /// Guild the voter must belong to.
    pub guild_id: Option<String>,
}

// ============================================================================
// STORE SELECTION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    #[default]
    Postgres,
    /// Process-local store for runs without a database.
    Memory,
}

// ============================================================================
// APP CONFIGURATION
// ============================================================================

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub oauth: OAuthConfig,
    pub admin_id: Option<String>,
    pub discord_token: Option<SecretString>,
    pub leaderboard_channel_id: Option<u64>,
    pub session_secret: Option<SecretString>,
    pub bind_addr: SocketAddr,
    pub nominations: NominationCatalog,
    /// Bound on every identity provider request.
    pub http_timeout: Duration,
    /// Bound on every chat platform REST call.
    pub chat_timeout: Duration,
    pub reset_confirm_ttl: Duration,
    pub cookie_secure: bool,
    pub store: StoreBackend,
    pub db: DbConfig,
}

impl AppConfig {
    /// Create AppConfig from environment variables.
    ///
    /// Environment variables:
    /// - `CLIENT_ID`, `CLIENT_SECRET`, `REDIRECT_URI`, `GUILD_ID`: Discord OAuth
    /// - `ADMIN_ID`: Discord user id allowed to reset and view `/admin`
    /// - `DISCORD_TOKEN`: bot token (bot disabled when absent)
    /// - `LEADERBOARD_CHANNEL_ID`: channel holding the live leaderboard
    /// - `SESSION_SECRET`: cookie signing key
    /// - `PORT` (default: 3000), `ECHORIA_BIND` (default: 0.0.0.0)
    /// - `ECHORIA_NOMINATIONS`: `|`-separated nomination list
    /// - `ECHORIA_HTTP_TIMEOUT_SECS` (default: 10)
    /// - `ECHORIA_CHAT_TIMEOUT_SECS` (default: 10)
    /// - `ECHORIA_RESET_CONFIRM_TTL_SECS` (default: 300)
    /// - `ECHORIA_COOKIE_SECURE`: "true" or "false" (default: false)
    /// - `ECHORIA_STORE`: "postgres" or "memory" (default: postgres)
    /// - `ECHORIA_DB_*`: see [`DbConfig::from_lookup`]
    pub fn from_env() -> ApiResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as absent.
    pub fn from_lookup<F>(lookup: F) -> ApiResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let secret = |key: &str| get(key).map(SecretString::from);

        let oauth = OAuthConfig {
            client_id: get("CLIENT_ID"),
            client_secret: secret("CLIENT_SECRET"),
            redirect_uri: get("REDIRECT_URI"),
            guild_id: get("GUILD_ID"),
        };

        let leaderboard_channel_id = get("LEADERBOARD_CHANNEL_ID")
            .map(|raw| parse_channel_id(&raw))
            .transpose()?;

        let nominations = match get("ECHORIA_NOMINATIONS") {
            Some(list) => NominationCatalog::parse(&list)
                .map_err(|e| ApiError::invalid_setting("ECHORIA_NOMINATIONS", e))?,
            None => NominationCatalog::default(),
        };

        let store = match get("ECHORIA_STORE").as_deref() {
            None | Some("postgres") => StoreBackend::Postgres,
            Some("memory") => StoreBackend::Memory,
            Some(other) => {
                return Err(ApiError::invalid_setting(
                    "ECHORIA_STORE",
                    format!("expected postgres or memory, got {}", other),
                ))
            }
        };

        Ok(Self {
            oauth,
            admin_id: get("ADMIN_ID"),
            discord_token: secret("DISCORD_TOKEN"),
            leaderboard_channel_id,
            session_secret: secret("SESSION_SECRET"),
            bind_addr: resolve_bind_addr(get("ECHORIA_BIND"), get("PORT"))?,
            nominations,
            http_timeout: secs(&get, "ECHORIA_HTTP_TIMEOUT_SECS", 10)?,
            chat_timeout: secs(&get, "ECHORIA_CHAT_TIMEOUT_SECS", 10)?,
            reset_confirm_ttl: secs(&get, "ECHORIA_RESET_CONFIRM_TTL_SECS", 300)?,
            cookie_secure: get("ECHORIA_COOKIE_SECURE")
                .map(|s| s == "true" || s == "1")
                .unwrap_or(false),
            store,
            db: DbConfig::from_lookup(&get),
        })
    }
}

fn parse_channel_id(raw: &str) -> ApiResult<u64> {
    match raw.parse::<u64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ApiError::invalid_setting(
            "LEADERBOARD_CHANNEL_ID",
            format!("expected a Discord snowflake, got {}", raw),
        )),
    }
}

fn secs<F>(get: &F, key: &str, default: u64) -> ApiResult<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(Duration::from_secs(default)),
        Some(raw) => match raw.parse::<u64>() {
            Ok(0) => Err(ApiError::invalid_setting(key, "must be greater than zero")),
            Ok(secs) => Ok(Duration::from_secs(secs)),
            Err(_) => Err(ApiError::invalid_setting(
                key,
                format!("expected seconds, got {}", raw),
            )),
        },
    }
}

fn resolve_bind_addr(host: Option<String>, port: Option<String>) -> ApiResult<SocketAddr> {
    let host = host.unwrap_or_else(|| "0.0.0.0".to_string());
    let port_str = port.unwrap_or_else(|| "3000".to_string());
    let port = port_str
        .parse::<u16>()
        .map_err(|_| ApiError::invalid_setting("PORT", format!("invalid port {}", port_str)))?;

    let addr = format!("{}:{}", host, port);
    addr.parse::<SocketAddr>()
        .map_err(|e| ApiError::invalid_setting("ECHORIA_BIND", format!("{}: {}", addr, e)))
}
