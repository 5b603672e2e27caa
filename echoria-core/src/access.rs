//! Admin authorization.

/// Who may run destructive or admin-only actions.
///
/// With no admin configured every identity passes; the portal logs a
/// warning at start-up when that is the case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminPolicy {
    admin_id: Option<String>,
}

impl AdminPolicy {
    pub fn new(admin_id: Option<String>) -> Self {
        Self {
            admin_id: admin_id.filter(|id| !id.trim().is_empty()),
        }
    }

    pub fn admin_id(&self) -> Option<&str> {
        self.admin_id.as_deref()
    }

    pub fn is_configured(&self) -> bool {
        self.admin_id.is_some()
    }

    pub fn allows(&self, identity: &str) -> bool {
        match &self.admin_id {
            Some(admin) => admin == identity,
            None => true,
        }
    }
}
