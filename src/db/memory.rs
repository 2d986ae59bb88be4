//! In-memory ledger store
//!
//! All collections live behind one lock. Every atomic unit validates all of
//! its preconditions before the first write, so a rejected commit leaves no
//! trace. Used in development mode and by the test suite.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

use super::store::{CaseCommit, InsertOutcome, LedgerStore, Recount, VoteCommit};
use crate::ledger::quota::QuotaClaim;
use crate::model::{
    Case, CaseQuery, Comment, CommentQuery, Identity, Tally, Vote, VoteQuery,
};
use crate::types::Result;

#[derive(Debug, Default)]
struct Collections {
    identities: HashMap<String, Identity>,
    cases: HashMap<String, Case>,
    votes: HashMap<String, Vote>,
    comments: HashMap<String, Comment>,
}

/// Process-local store with the same contract as the MongoDB backend
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record counts as (identities, cases, votes, comments)
    pub async fn counts(&self) -> (usize, usize, usize, usize) {
        let db = self.inner.read().await;
        (
            db.identities.len(),
            db.cases.len(),
            db.votes.len(),
            db.comments.len(),
        )
    }

    /// Overwrite a case's tally fields without touching its votes
    pub async fn force_tally(&self, id: &str, tally: Tally) -> Option<Case> {
        let mut db = self.inner.write().await;
        db.cases.get_mut(id).map(|case| {
            case.set_tally(tally);
            case.clone()
        })
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn get_identity(&self, id: &str) -> Result<Option<Identity>> {
        Ok(self.inner.read().await.identities.get(id).cloned())
    }

    async fn ensure_identity(
        &self,
        id: &str,
        display_name: &str,
        now: DateTime<Utc>,
    ) -> Result<Identity> {
        let mut db = self.inner.write().await;
        let identity = db
            .identities
            .entry(id.to_string())
            .or_insert_with(|| Identity::new(id, display_name).joined_at(now));
        Ok(identity.clone())
    }

    async fn commit_case(&self, case: Case, claim: QuotaClaim) -> Result<CaseCommit> {
        let mut db = self.inner.write().await;

        let Some(current) = db.identities.get(&case.author_id) else {
            return Ok(CaseCommit::IdentityMissing);
        };
        let mut identity = current.clone();
        if !claim.apply(&mut identity) {
            return Ok(CaseCommit::QuotaExceeded);
        }

        db.identities.insert(identity.id.clone(), identity.clone());
        db.cases.insert(case.id.clone(), case.clone());
        debug!("memory: committed case {}", case.id);

        Ok(CaseCommit::Committed { case, identity })
    }

    async fn get_case(&self, id: &str) -> Result<Option<Case>> {
        Ok(self.inner.read().await.cases.get(id).cloned())
    }

    async fn query_cases(&self, query: &CaseQuery) -> Result<Vec<Case>> {
        let db = self.inner.read().await;
        let mut cases: Vec<Case> = db
            .cases
            .values()
            .filter(|c| query.matches(c))
            .cloned()
            .collect();
        query.order.sort(&mut cases);
        Ok(cases)
    }

    async fn set_case_verified(&self, id: &str, verified: bool) -> Result<Option<Case>> {
        let mut db = self.inner.write().await;
        Ok(db.cases.get_mut(id).map(|case| {
            case.is_verified = verified;
            case.clone()
        }))
    }

    async fn recount_case(&self, id: &str) -> Result<Option<Recount>> {
        let mut db = self.inner.write().await;
        let mut tally = Tally::default();
        for vote in db.votes.values().filter(|v| v.case_id == id) {
            tally.record(vote.verdict);
        }
        Ok(db.cases.get_mut(id).map(|case| {
            let previous = case.clone();
            case.set_tally(tally);
            Recount {
                previous,
                case: case.clone(),
            }
        }))
    }

    async fn commit_vote(&self, vote: Vote, claim: QuotaClaim) -> Result<VoteCommit> {
        let mut db = self.inner.write().await;

        if db.votes.contains_key(&vote.id) {
            return Ok(VoteCommit::Duplicate);
        }
        let mut case = match db.cases.get(&vote.case_id) {
            Some(case) if case.is_verified => case.clone(),
            _ => return Ok(VoteCommit::CaseUnavailable),
        };
        let Some(current) = db.identities.get(&vote.identity_id) else {
            return Ok(VoteCommit::IdentityMissing);
        };
        let mut identity = current.clone();
        if !claim.apply(&mut identity) {
            return Ok(VoteCommit::QuotaExceeded);
        }
        case.record_verdict(vote.verdict);

        db.votes.insert(vote.id.clone(), vote.clone());
        db.cases.insert(case.id.clone(), case.clone());
        db.identities.insert(identity.id.clone(), identity.clone());
        debug!("memory: committed vote {}", vote.id);

        Ok(VoteCommit::Committed {
            vote,
            case,
            identity,
        })
    }

    async fn get_vote(&self, key: &str) -> Result<Option<Vote>> {
        Ok(self.inner.read().await.votes.get(key).cloned())
    }

    async fn query_votes(&self, query: &VoteQuery) -> Result<Vec<Vote>> {
        let db = self.inner.read().await;
        let mut votes: Vec<Vote> = db
            .votes
            .values()
            .filter(|v| query.matches(v))
            .cloned()
            .collect();
        votes.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(votes)
    }

    async fn insert_comment(&self, comment: Comment) -> Result<InsertOutcome> {
        let mut db = self.inner.write().await;
        let exists = db.comments.values().any(|c| {
            c.case_id == comment.case_id && c.identity_id == comment.identity_id
        });
        if exists || db.comments.contains_key(&comment.id) {
            return Ok(InsertOutcome::AlreadyExists);
        }
        db.comments.insert(comment.id.clone(), comment);
        Ok(InsertOutcome::Inserted)
    }

    async fn query_comments(&self, query: &CommentQuery) -> Result<Vec<Comment>> {
        let db = self.inner.read().await;
        let mut comments: Vec<Comment> = db
            .comments
            .values()
            .filter(|c| query.matches(c))
            .cloned()
            .collect();
        query.sort(&mut comments);
        Ok(comments)
    }

    async fn set_comment_verified(&self, id: &str, verified: bool) -> Result<Option<Comment>> {
        let mut db = self.inner.write().await;
        Ok(db.comments.get_mut(id).map(|comment| {
            comment.is_verified = verified;
            comment.clone()
        }))
    }
}
