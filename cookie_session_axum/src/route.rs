use std::sync::Arc;

use cookie_session::{ConfigError, RoutePolicy, SessionAuth};

/// State for [`require_auth`](crate::require_auth): the strategy registry and
/// the policy of the routes it guards.
#[derive(Clone, Debug)]
pub struct RouteAuth {
    pub(crate) auth: Arc<SessionAuth>,
    pub(crate) policy: Arc<RoutePolicy>,
}

impl RouteAuth {
    /// Fails when the policy names a strategy that is not registered.
    pub fn new(auth: Arc<SessionAuth>, policy: RoutePolicy) -> Result<Self, ConfigError> {
        auth.check_policy(&policy)?;
        Ok(Self {
            auth,
            policy: Arc::new(policy),
        })
    }

    pub fn policy(&self) -> &RoutePolicy {
        &self.policy
    }
}
