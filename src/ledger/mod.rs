//! The case/verdict ledger
//!
//! Components, leaves first: [`QuotaTracker`] gates actions, [`CaseStore`]
//! and [`VoteLedger`] perform mutations, [`CommentGate`] admits comments
//! behind a prior vote, and [`ProfileAggregator`] reads the results.
//! [`Tribunal`] wires them to one store and one clock.

pub mod cases;
pub mod comments;
pub mod identity;
pub mod moderation;
pub mod profile;
pub mod quota;
pub mod votes;

pub use cases::{CaseStore, CaseView};
pub use comments::CommentGate;
pub use identity::{IdentityContext, Principal};
pub use moderation::Moderation;
pub use profile::{History, Profile, ProfileAggregator, VerdictBreakdown};
pub use quota::{QuotaClaim, QuotaStatus, QuotaTracker};
pub use votes::{VoteLedger, VoteReceipt};

use std::sync::Arc;

use crate::clock::{Clock, DayPolicy};
use crate::db::LedgerStore;
use crate::model::{Case, CaseDraft, Comment, Verdict, Vote};
use crate::types::Result;

/// Entry point for every ledger operation
#[derive(Clone)]
pub struct Tribunal {
    store: Arc<dyn LedgerStore>,
    clock: Arc<dyn Clock>,
    cases: CaseStore,
    votes: VoteLedger,
    comments: CommentGate,
    profiles: ProfileAggregator,
    moderation: Moderation,
}

impl Tribunal {
    pub fn new(store: Arc<dyn LedgerStore>, clock: Arc<dyn Clock>, policy: DayPolicy) -> Self {
        let quota = QuotaTracker::new(policy);
        let cases = CaseStore::new(Arc::clone(&store), Arc::clone(&clock), quota);
        let votes = VoteLedger::new(Arc::clone(&store), Arc::clone(&clock), quota, cases.clone());
        let comments = CommentGate::new(Arc::clone(&store), Arc::clone(&clock), cases.clone());
        let profiles =
            ProfileAggregator::new(Arc::clone(&clock), quota, cases.clone(), votes.clone());
        let moderation = Moderation::new(Arc::clone(&store), votes.clone());

        Self {
            store,
            clock,
            cases,
            votes,
            comments,
            profiles,
            moderation,
        }
    }

    pub fn store(&self) -> &Arc<dyn LedgerStore> {
        &self.store
    }

    pub fn moderation(&self) -> &Moderation {
        &self.moderation
    }

    /// Build the context for a request made by `principal`
    pub async fn establish(&self, principal: Principal) -> Result<IdentityContext> {
        IdentityContext::establish(self.store.as_ref(), principal, self.clock.now()).await
    }

    pub async fn create_case(&self, ctx: &mut IdentityContext, draft: CaseDraft) -> Result<Case> {
        self.cases.create(ctx, draft).await
    }

    pub async fn cast_vote(
        &self,
        ctx: &mut IdentityContext,
        case_id: &str,
        verdict: Verdict,
    ) -> Result<VoteReceipt> {
        self.votes.cast_vote(ctx, case_id, verdict).await
    }

    pub async fn submit_comment(
        &self,
        ctx: &IdentityContext,
        case_id: &str,
        text: &str,
    ) -> Result<Comment> {
        self.comments.submit(ctx, case_id, text).await
    }

    pub async fn list_verified_cases(&self) -> Result<Vec<Case>> {
        self.cases.list_verified().await
    }

    /// `viewer` is the caller's identity id, if any
    pub async fn get_case(&self, case_id: &str, viewer: Option<&str>) -> Result<Case> {
        self.cases.get(case_id, viewer).await
    }

    pub async fn list_by_author(&self, author_id: &str) -> Result<Vec<Case>> {
        self.cases.list_by_author(author_id).await
    }

    pub async fn list_verified_comments(&self, case_id: &str) -> Result<Vec<Comment>> {
        self.comments.list_verified(case_id).await
    }

    pub async fn get_own_vote(&self, ctx: &IdentityContext, case_id: &str) -> Result<Option<Vote>> {
        self.votes.get_own_vote(ctx.id(), case_id).await
    }

    pub async fn get_own_comment(
        &self,
        ctx: &IdentityContext,
        case_id: &str,
    ) -> Result<Option<Comment>> {
        self.comments.get_own_comment(ctx.id(), case_id).await
    }

    pub async fn verdict_breakdown(&self, identity_id: &str) -> Result<VerdictBreakdown> {
        self.profiles.verdict_breakdown(identity_id).await
    }

    pub async fn history(&self, identity_id: &str) -> Result<History> {
        self.profiles.history(identity_id).await
    }

    pub async fn get_profile(&self, ctx: &IdentityContext) -> Result<Profile> {
        self.profiles.profile(ctx).await
    }
}
