//! Shared application state for Axum routers.

use std::sync::Arc;

use echoria_bot::{PublishOutcome, Publisher};
use echoria_core::AdminPolicy;
use echoria_storage::{Aggregator, Ballot};

use crate::oauth::IdentityProvider;
use crate::session::SessionStore;

/// Access rules for the portal.
#[derive(Debug, Clone, Default)]
pub struct PortalPolicy {
    pub admin: AdminPolicy,
    /// Guild a voter must belong to. Logins fail while it is unset.
    pub guild_id: Option<String>,
}

/// Application-wide state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    pub ballot: Ballot,
    pub aggregator: Aggregator,
    pub sessions: Arc<SessionStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub policy: Arc<PortalPolicy>,
    /// Absent when the bot is disabled.
    pub publisher: Option<Arc<Publisher>>,
}

impl AppState {
    /// Refresh the live leaderboard in the background.
    ///
    /// Failures are logged; the HTTP response never waits on chat.
    pub fn republish(&self) {
        let Some(publisher) = self.publisher.clone() else {
            return;
        };
        tokio::spawn(async move {
            match publisher.publish(None).await {
                Ok(PublishOutcome::Skipped) => {
                    tracing::debug!("Leaderboard republish skipped");
                }
                Ok(outcome) => tracing::debug!(?outcome, "Leaderboard republished"),
                Err(e) => tracing::warn!(error = %e, "Leaderboard republish failed"),
            }
        });
    }
}

crate::impl_from_ref!(Ballot, ballot);
crate::impl_from_ref!(Aggregator, aggregator);
crate::impl_from_ref!(Arc<SessionStore>, sessions);
crate::impl_from_ref!(Arc<dyn IdentityProvider>, identity);
crate::impl_from_ref!(Arc<PortalPolicy>, policy);
