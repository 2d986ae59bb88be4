//! Case creation and retrieval

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::identity::IdentityContext;
use super::quota::QuotaTracker;
use crate::clock::Clock;
use crate::db::{CaseCommit, LedgerStore};
use crate::model::{Case, CaseDraft, CaseOrder, CaseQuery, CaseVerdict, QuotaAction, Recency};
use crate::types::{Result, TribunalError};

/// A case together with its derived verdict
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseView {
    #[serde(flatten)]
    pub case: Case,
    pub verdict: CaseVerdict,
    /// Rendered verdict label, e.g. `GUILTY (70%)`
    pub verdict_label: String,
}

impl CaseView {
    /// View for anyone. Anonymous cases carry no author id.
    pub fn public(mut case: Case) -> Self {
        if case.is_anonymous {
            case.author_id.clear();
        }
        Self::owned(case)
    }

    /// View for the author or a moderator, author id included
    pub fn owned(case: Case) -> Self {
        let verdict = case.verdict();
        Self {
            verdict_label: verdict.to_string(),
            verdict,
            case,
        }
    }
}

/// Creates and reads cases
#[derive(Clone)]
pub struct CaseStore {
    store: Arc<dyn LedgerStore>,
    clock: Arc<dyn Clock>,
    quota: QuotaTracker,
}

impl CaseStore {
    pub fn new(store: Arc<dyn LedgerStore>, clock: Arc<dyn Clock>, quota: QuotaTracker) -> Self {
        Self { store, clock, quota }
    }

    /// Create an unverified case with zero tallies, charging the author's daily posting slot
    pub async fn create(&self, ctx: &mut IdentityContext, draft: CaseDraft) -> Result<Case> {
        let draft = draft.validate()?;
        let now = self.clock.now();

        if !self.quota.can_post(ctx.stats(), now) {
            warn!("Posting quota reached for {}", ctx.id());
            return Err(TribunalError::QuotaExceeded(QuotaAction::Post));
        }

        let case = Case::new(
            Uuid::new_v4().to_string(),
            ctx.id(),
            ctx.display_name(),
            draft,
            now,
        );
        let claim = self.quota.claim(QuotaAction::Post, now);

        match self.store.commit_case(case, claim).await? {
            CaseCommit::Committed { case, identity } => {
                info!("Case {} created by {} (pending verification)", case.id, ctx.id());
                ctx.absorb(identity);
                Ok(case)
            }
            CaseCommit::QuotaExceeded => {
                warn!("Posting quota reached for {} at commit", ctx.id());
                Err(TribunalError::QuotaExceeded(QuotaAction::Post))
            }
            CaseCommit::IdentityMissing => {
                Err(TribunalError::NotFound(format!("identity {}", ctx.id())))
            }
        }
    }

    /// Fetch a case. Unverified cases are visible only to their author.
    pub async fn get(&self, id: &str, viewer: Option<&str>) -> Result<Case> {
        let case = self
            .store
            .get_case(id)
            .await?
            .ok_or_else(|| TribunalError::NotFound(format!("case {}", id)))?;

        if !case.is_verified && viewer != Some(case.author_id.as_str()) {
            debug!("Case {} requested before verification", id);
            return Err(TribunalError::Unverified(format!("case {}", id)));
        }
        Ok(case)
    }

    /// Fetch a case that must be published, for actions on it
    pub(crate) async fn get_published(&self, id: &str) -> Result<Case> {
        self.get(id, None).await
    }

    /// Public feed: most popular first, ties by most recent
    pub async fn list_verified(&self) -> Result<Vec<Case>> {
        self.store
            .query_cases(&CaseQuery {
                verified: Some(true),
                author_id: None,
                order: CaseOrder::Popularity,
            })
            .await
    }

    /// Every case an identity authored, pending ones included, newest first
    pub async fn list_by_author(&self, author_id: &str) -> Result<Vec<Case>> {
        self.store
            .query_cases(&CaseQuery {
                verified: None,
                author_id: Some(author_id.to_string()),
                order: CaseOrder::Created(Recency::NewestFirst),
            })
            .await
    }
}
