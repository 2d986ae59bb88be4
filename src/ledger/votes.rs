//! Vote ledger
//!
//! A vote is stored under the deterministic key `{caseId}_{identityId}`, so
//! the key itself is the at-most-once guard. The insert, the tally increments
//! and the judging charge commit together through [`LedgerStore::commit_vote`].

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::cases::CaseStore;
use super::identity::IdentityContext;
use super::quota::QuotaTracker;
use crate::clock::Clock;
use crate::db::{LedgerStore, Recount, VoteCommit};
use crate::model::{vote_key, Case, QuotaAction, Verdict, Vote, VoteQuery};
use crate::types::{Result, TribunalError};

/// Authoritative state after a vote commits
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteReceipt {
    pub vote: Vote,
    pub case: Case,
}

/// Records votes and keeps case tallies consistent with them
#[derive(Clone)]
pub struct VoteLedger {
    store: Arc<dyn LedgerStore>,
    clock: Arc<dyn Clock>,
    quota: QuotaTracker,
    cases: CaseStore,
}

impl VoteLedger {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        clock: Arc<dyn Clock>,
        quota: QuotaTracker,
        cases: CaseStore,
    ) -> Self {
        Self {
            store,
            clock,
            quota,
            cases,
        }
    }

    /// Cast a verdict on a published case.
    ///
    /// Preconditions are checked in order: the case exists and is verified,
    /// the caller has a judging slot left today, and the caller has not
    /// voted on this case. The commit re-checks all three.
    pub async fn cast_vote(
        &self,
        ctx: &mut IdentityContext,
        case_id: &str,
        verdict: Verdict,
    ) -> Result<VoteReceipt> {
        self.cases.get_published(case_id).await?;

        let now = self.clock.now();
        if !self.quota.can_judge(ctx.stats(), now) {
            warn!("Judging quota reached for {}", ctx.id());
            return Err(TribunalError::QuotaExceeded(QuotaAction::Judge));
        }

        let key = vote_key(case_id, ctx.id());
        if self.store.get_vote(&key).await?.is_some() {
            debug!("Duplicate vote attempt {}", key);
            return Err(TribunalError::DuplicateVote);
        }

        let vote = Vote::new(case_id, ctx.id(), verdict, now);
        let claim = self.quota.claim(QuotaAction::Judge, now);

        match self.store.commit_vote(vote, claim).await? {
            VoteCommit::Committed {
                vote,
                case,
                identity,
            } => {
                info!(
                    "Vote {} recorded as {} (case now {}/{} of {})",
                    vote.id, vote.verdict, case.guilty_count, case.innocent_count, case.total_votes
                );
                ctx.absorb(identity);
                Ok(VoteReceipt { vote, case })
            }
            VoteCommit::Duplicate => {
                debug!("Duplicate vote {} rejected at commit", key);
                Err(TribunalError::DuplicateVote)
            }
            VoteCommit::CaseUnavailable => {
                Err(TribunalError::Unverified(format!("case {}", case_id)))
            }
            VoteCommit::QuotaExceeded => {
                warn!("Judging quota reached for {} at commit", ctx.id());
                Err(TribunalError::QuotaExceeded(QuotaAction::Judge))
            }
            VoteCommit::IdentityMissing => {
                Err(TribunalError::NotFound(format!("identity {}", ctx.id())))
            }
        }
    }

    /// The caller's vote on a case, if any
    pub async fn get_own_vote(&self, identity_id: &str, case_id: &str) -> Result<Option<Vote>> {
        self.store.get_vote(&vote_key(case_id, identity_id)).await
    }

    /// Votes an identity has cast, newest first
    pub async fn votes_by(&self, identity_id: &str) -> Result<Vec<Vote>> {
        self.store.query_votes(&VoteQuery::by_identity(identity_id)).await
    }

    /// Rederive a case's tallies from its stored votes.
    ///
    /// The store runs the scan and the overwrite as one unit, so a vote
    /// committed while the recount runs is never dropped from the tallies.
    pub async fn recount(&self, case_id: &str) -> Result<Case> {
        let Recount { previous, case } = self
            .store
            .recount_case(case_id)
            .await?
            .ok_or_else(|| TribunalError::NotFound(format!("case {}", case_id)))?;

        if previous.tally() != case.tally() || !previous.tally_consistent() {
            warn!(
                "Case {} tally drifted: stored {}/{} (total {}), recounted {}/{}",
                case_id,
                previous.guilty_count,
                previous.innocent_count,
                previous.total_votes,
                case.guilty_count,
                case.innocent_count
            );
        }
        Ok(case)
    }
}
