//! Echoria API - Voting Portal
//!
//! The HTTP side of Echoria Awards: Discord login, one vote per member and
//! nomination, and admin standings. Accepted votes nudge the leaderboard
//! publisher from `echoria-bot`.

pub mod config;
pub mod db;
pub mod error;
pub mod macros;
pub mod oauth;
pub mod routes;
pub mod session;
pub mod state;
pub mod telemetry;

#[cfg(test)]
mod test_env;

pub use config::{load_dotenv, DotenvSource, AppConfig, OAuthConfig, StoreBackend};
pub use db::{DbConfig, PgVoteStore};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use oauth::{DiscordIdentity, DiscordOAuth, IdentityProvider, OAuthError};
pub use routes::{create_router, create_router_with_timeout};
pub use session::{CurrentUser, RequireUser, SessionStore, SessionUser, SESSION_COOKIE};
pub use state::{AppState, PortalPolicy};
pub use telemetry::{init_logging, LogFormat};
