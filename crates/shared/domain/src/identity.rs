//! Caller identity.
//!
//! The persistence layer never reads identity from ambient state. A request
//! builds an [`IdentityProvider`] (usually from validated token claims) and
//! hands it to the unit of work it creates.

use serde::{Deserialize, Serialize};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Supplies the authenticated caller for the current request, if any.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
pub trait IdentityProvider: Send + Sync {
    /// Identifier of the authenticated user (`uid` claim)
    fn user_id(&self) -> Option<String>;

    /// Display name of the authenticated user (`name` claim)
    fn name(&self) -> Option<String>;

    /// Whether a caller is authenticated at all
    fn is_authenticated(&self) -> bool {
        self.user_id().is_some()
    }
}

/// Identity of an unauthenticated request.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl IdentityProvider for Anonymous {
    fn user_id(&self) -> Option<String> {
        None
    }

    fn name(&self) -> Option<String> {
        None
    }
}

/// Identity resolved once per request from token claims.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity {
    #[serde(rename = "uid")]
    pub user_id: Option<String>,
    pub name: Option<String>,
}

impl CallerIdentity {
    /// Identity for an authenticated user
    pub fn new(user_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            name: Some(name.into()),
        }
    }
}

impl IdentityProvider for CallerIdentity {
    fn user_id(&self) -> Option<String> {
        self.user_id.clone()
    }

    fn name(&self) -> Option<String> {
        self.name.clone()
    }
}
