//! Per-request identity context
//!
//! The identity provider is trusted: it hands us an opaque id and a display
//! name. An `IdentityContext` pairs that principal with the stored statistics
//! and is passed explicitly to every operation acting on its behalf.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::db::LedgerStore;
use crate::model::Identity;
use crate::types::{Result, TribunalError};

/// Authenticated caller as reported by the identity provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: String,
    pub display_name: String,
}

impl Principal {
    /// Empty display names fall back to the id
    pub fn new(id: &str, display_name: Option<&str>) -> Result<Self> {
        let id = id.trim();
        if id.is_empty() {
            return Err(TribunalError::Validation("Identity id is required".into()));
        }
        let display_name = display_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(id);
        Ok(Self {
            id: id.to_string(),
            display_name: display_name.to_string(),
        })
    }
}

/// Caller plus the last authoritative copy of its statistics
#[derive(Debug, Clone)]
pub struct IdentityContext {
    principal: Principal,
    stats: Identity,
}

impl IdentityContext {
    /// Load the caller's record, creating it with zeroed counters on first sight
    pub async fn establish(
        store: &dyn LedgerStore,
        principal: Principal,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let stats = store
            .ensure_identity(&principal.id, &principal.display_name, now)
            .await?;
        debug!(
            "Identity context for {} (posted {}, judged {})",
            stats.id, stats.cases_posted, stats.cases_judged
        );
        Ok(Self { principal, stats })
    }

    pub fn id(&self) -> &str {
        &self.principal.id
    }

    /// Display name from the identity provider for this request
    pub fn display_name(&self) -> &str {
        &self.principal.display_name
    }

    pub fn stats(&self) -> &Identity {
        &self.stats
    }

    /// Replace cached statistics with the state a mutation returned
    pub fn absorb(&mut self, identity: Identity) {
        if identity.id == self.principal.id {
            self.stats = identity;
        }
    }
}
