//! Document store seam
//!
//! `LedgerStore` is the contract the ledger holds with its document store.
//! Multi-record mutations are exposed as single atomic units so that no
//! caller ever observes a vote without its tallies, or a case without its
//! quota charge.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::ledger::quota::QuotaClaim;
use crate::model::{
    Case, CaseQuery, Comment, CommentQuery, Identity, Vote, VoteQuery,
};
use crate::types::Result;

/// Outcome of a keyed insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A record with the same key already exists and was left untouched
    AlreadyExists,
}

/// Outcome of an atomic case creation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseCommit {
    Committed { case: Case, identity: Identity },
    QuotaExceeded,
    IdentityMissing,
}

/// Outcome of an atomic vote
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteCommit {
    Committed {
        vote: Vote,
        case: Case,
        identity: Identity,
    },
    /// A vote for this (case, identity) already exists
    Duplicate,
    /// Case missing or not verified at commit time
    CaseUnavailable,
    QuotaExceeded,
    IdentityMissing,
}

/// Tallies of a case before and after a recount
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recount {
    pub previous: Case,
    pub case: Case,
}

/// Storage operations required by the ledger
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Short backend name for logs and health output
    fn backend(&self) -> &'static str;

    /// Liveness probe against the backing store
    async fn ping(&self) -> Result<()>;

    // -- identities --

    async fn get_identity(&self, id: &str) -> Result<Option<Identity>>;

    /// Create the identity with zeroed counters unless it exists; returns the stored record.
    /// `now` becomes its creation time and is ignored for existing records.
    async fn ensure_identity(
        &self,
        id: &str,
        display_name: &str,
        now: DateTime<Utc>,
    ) -> Result<Identity>;

    // -- cases --

    /// Charge one posting slot to the author and insert the case, all or nothing
    async fn commit_case(&self, case: Case, claim: QuotaClaim) -> Result<CaseCommit>;

    async fn get_case(&self, id: &str) -> Result<Option<Case>>;

    async fn query_cases(&self, query: &CaseQuery) -> Result<Vec<Case>>;

    /// Returns the updated case, or `None` if missing
    async fn set_case_verified(&self, id: &str, verified: bool) -> Result<Option<Case>>;

    /// Rederive every tally field from the case's stored votes. The scan and
    /// the write form one atomic unit with respect to `commit_vote`.
    /// `None` if the case is missing.
    async fn recount_case(&self, id: &str) -> Result<Option<Recount>>;

    // -- votes --

    /// Insert the vote under its deterministic key, increment the case
    /// tallies and charge one judging slot, all or nothing
    async fn commit_vote(&self, vote: Vote, claim: QuotaClaim) -> Result<VoteCommit>;

    async fn get_vote(&self, key: &str) -> Result<Option<Vote>>;

    /// Matching votes, newest first
    async fn query_votes(&self, query: &VoteQuery) -> Result<Vec<Vote>>;

    // -- comments --

    /// Insert unless the same identity already commented on the same case
    async fn insert_comment(&self, comment: Comment) -> Result<InsertOutcome>;

    async fn query_comments(&self, query: &CommentQuery) -> Result<Vec<Comment>>;

    /// Returns the updated comment, or `None` if missing
    async fn set_comment_verified(&self, id: &str, verified: bool) -> Result<Option<Comment>>;
}
