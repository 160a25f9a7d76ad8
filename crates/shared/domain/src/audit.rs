//! Audit stamping context.
//!
//! An [`AuditContext`] is built once per request from the caller identity,
//! the audit clock and the audit policy. Every write asks it for an
//! [`AuditStamp`] immediately before the statement is issued.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::clock::{Clock, SystemClock};
use crate::constants::SYSTEM_ACTOR;
use crate::error::{DomainError, DomainResult};
use crate::identity::{Anonymous, IdentityProvider};

/// Kind of change an audit stamp is requested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::Insert => write!(f, "insert"),
            ChangeKind::Update => write!(f, "update"),
            ChangeKind::Delete => write!(f, "delete"),
        }
    }
}

/// Who and when, resolved for one write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStamp {
    pub actor: String,
    pub at: DateTime<FixedOffset>,
}

/// Rules applied when resolving a stamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditPolicy {
    /// Actor recorded when no caller is authenticated
    pub fallback_actor: String,
    /// Reject soft deletes from anonymous callers
    pub require_actor_on_delete: bool,
}

impl Default for AuditPolicy {
    fn default() -> Self {
        Self {
            fallback_actor: SYSTEM_ACTOR.to_string(),
            require_actor_on_delete: false,
        }
    }
}

/// Request-scoped audit inputs.
#[derive(Clone)]
pub struct AuditContext {
    identity: Arc<dyn IdentityProvider>,
    clock: Arc<dyn Clock>,
    policy: AuditPolicy,
}

impl fmt::Debug for AuditContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuditContext")
            .field("user_id", &self.identity.user_id())
            .field("policy", &self.policy)
            .finish()
    }
}

impl AuditContext {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        clock: Arc<dyn Clock>,
        policy: AuditPolicy,
    ) -> Self {
        Self {
            identity,
            clock,
            policy,
        }
    }

    /// Anonymous caller, system clock, default policy.
    pub fn anonymous() -> Self {
        Self::new(
            Arc::new(Anonymous),
            Arc::new(SystemClock::default()),
            AuditPolicy::default(),
        )
    }

    pub fn identity(&self) -> &dyn IdentityProvider {
        self.identity.as_ref()
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn policy(&self) -> &AuditPolicy {
        &self.policy
    }

    /// Resolve the stamp for a change of the given kind.
    ///
    /// Deletes fail with [`DomainError::MissingActor`] when the policy
    /// requires an authenticated caller and there is none.
    pub fn stamp(&self, kind: ChangeKind) -> DomainResult<AuditStamp> {
        let actor = match self.identity.user_id() {
            Some(user_id) => user_id,
            None if kind == ChangeKind::Delete && self.policy.require_actor_on_delete => {
                return Err(DomainError::missing_actor("delete records"));
            }
            None => self.policy.fallback_actor.clone(),
        };

        Ok(AuditStamp {
            actor,
            at: self.clock.now(),
        })
    }
}

impl Default for AuditContext {
    fn default() -> Self {
        Self::anonymous()
    }
}
