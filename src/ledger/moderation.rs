//! Moderator operations: publishing cases and comments, tally repair

use std::sync::Arc;
use tracing::info;

use super::votes::VoteLedger;
use crate::db::LedgerStore;
use crate::model::{Case, CaseOrder, CaseQuery, Comment, CommentQuery, Recency};
use crate::types::{Result, TribunalError};

#[derive(Clone)]
pub struct Moderation {
    store: Arc<dyn LedgerStore>,
    votes: VoteLedger,
}

impl Moderation {
    pub fn new(store: Arc<dyn LedgerStore>, votes: VoteLedger) -> Self {
        Self { store, votes }
    }

    /// Publish a case. Idempotent.
    pub async fn verify_case(&self, case_id: &str) -> Result<Case> {
        let case = self
            .store
            .set_case_verified(case_id, true)
            .await?
            .ok_or_else(|| TribunalError::NotFound(format!("case {}", case_id)))?;
        info!("Case {} verified", case_id);
        Ok(case)
    }

    /// Publish a comment. Idempotent.
    pub async fn verify_comment(&self, comment_id: &str) -> Result<Comment> {
        let comment = self
            .store
            .set_comment_verified(comment_id, true)
            .await?
            .ok_or_else(|| TribunalError::NotFound(format!("comment {}", comment_id)))?;
        info!("Comment {} on case {} verified", comment_id, comment.case_id);
        Ok(comment)
    }

    /// Review queue, oldest first
    pub async fn pending_cases(&self) -> Result<Vec<Case>> {
        self.store
            .query_cases(&CaseQuery {
                verified: Some(false),
                author_id: None,
                order: CaseOrder::Created(Recency::OldestFirst),
            })
            .await
    }

    /// Review queue, oldest first
    pub async fn pending_comments(&self) -> Result<Vec<Comment>> {
        self.store
            .query_comments(&CommentQuery {
                case_id: None,
                identity_id: None,
                verified: Some(false),
                order: Recency::OldestFirst,
            })
            .await
    }

    pub async fn recount(&self, case_id: &str) -> Result<Case> {
        let case = self.votes.recount(case_id).await?;
        info!(
            "Case {} recounted: {} guilty, {} innocent",
            case_id, case.guilty_count, case.innocent_count
        );
        Ok(case)
    }
}
