//! Vote-gated comments

use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use super::cases::CaseStore;
use super::identity::IdentityContext;
use crate::clock::Clock;
use crate::db::{InsertOutcome, LedgerStore};
use crate::model::{validate_comment_text, vote_key, Comment, CommentQuery, Recency};
use crate::types::{Result, TribunalError};

/// Admits one comment per (case, identity), only after that identity voted
#[derive(Clone)]
pub struct CommentGate {
    store: Arc<dyn LedgerStore>,
    clock: Arc<dyn Clock>,
    cases: CaseStore,
}

impl CommentGate {
    pub fn new(store: Arc<dyn LedgerStore>, clock: Arc<dyn Clock>, cases: CaseStore) -> Self {
        Self { store, clock, cases }
    }

    /// Submit a comment; it stays pending until a moderator verifies it
    pub async fn submit(&self, ctx: &IdentityContext, case_id: &str, text: &str) -> Result<Comment> {
        let vote = self
            .store
            .get_vote(&vote_key(case_id, ctx.id()))
            .await?
            .ok_or(TribunalError::VoteRequired)?;

        if self.get_own_comment(ctx.id(), case_id).await?.is_some() {
            debug!("Duplicate comment attempt by {} on {}", ctx.id(), case_id);
            return Err(TribunalError::DuplicateComment);
        }

        let text = validate_comment_text(text)?;

        let comment = Comment {
            id: Uuid::new_v4().to_string(),
            case_id: case_id.to_string(),
            identity_id: ctx.id().to_string(),
            user_display_name: ctx.display_name().to_string(),
            judge_verdict: vote.verdict,
            text,
            created_at: self.clock.now(),
            is_verified: false,
        };

        match self.store.insert_comment(comment.clone()).await? {
            InsertOutcome::Inserted => {
                info!("Comment {} on case {} pending verification", comment.id, case_id);
                Ok(comment)
            }
            InsertOutcome::AlreadyExists => Err(TribunalError::DuplicateComment),
        }
    }

    /// Published comments on a published case, newest first
    pub async fn list_verified(&self, case_id: &str) -> Result<Vec<Comment>> {
        self.cases.get_published(case_id).await?;
        self.store
            .query_comments(&CommentQuery {
                case_id: Some(case_id.to_string()),
                identity_id: None,
                verified: Some(true),
                order: Recency::NewestFirst,
            })
            .await
    }

    /// The caller's own comment on a case, verified or not
    pub async fn get_own_comment(&self, identity_id: &str, case_id: &str) -> Result<Option<Comment>> {
        let mut found = self
            .store
            .query_comments(&CommentQuery {
                case_id: Some(case_id.to_string()),
                identity_id: Some(identity_id.to_string()),
                verified: None,
                order: Recency::NewestFirst,
            })
            .await?;
        Ok(if found.is_empty() {
            None
        } else {
            Some(found.swap_remove(0))
        })
    }
}
