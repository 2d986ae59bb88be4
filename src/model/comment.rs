//! Comment record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Recency, Verdict};
use crate::types::{Result, TribunalError};

/// Maximum comment length in characters, after trimming
pub const COMMENT_MAX_CHARS: usize = 200;

/// Trim comment text and enforce `1..=200` characters
pub fn validate_comment_text(text: &str) -> Result<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(TribunalError::Validation("Please enter a comment".into()));
    }
    if trimmed.chars().count() > COMMENT_MAX_CHARS {
        return Err(TribunalError::Validation(format!(
            "Comment must be {} characters or less",
            COMMENT_MAX_CHARS
        )));
    }
    Ok(trimmed.to_string())
}

/// A judge's comment on a case, pending until verified
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub case_id: String,
    pub identity_id: String,
    pub user_display_name: String,
    /// The author's verdict on the case
    pub judge_verdict: Verdict,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub is_verified: bool,
}

/// Filter for comment queries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentQuery {
    pub case_id: Option<String>,
    pub identity_id: Option<String>,
    pub verified: Option<bool>,
    pub order: Recency,
}

impl CommentQuery {
    pub fn matches(&self, comment: &Comment) -> bool {
        self.case_id.as_deref().map_or(true, |c| comment.case_id == c)
            && self
                .identity_id
                .as_deref()
                .map_or(true, |i| comment.identity_id == i)
            && self.verified.map_or(true, |v| comment.is_verified == v)
    }

    pub fn sort(&self, comments: &mut [Comment]) {
        comments.sort_by(|a, b| {
            let ord = a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id));
            match self.order {
                Recency::NewestFirst => ord.reverse(),
                Recency::OldestFirst => ord,
            }
        });
    }
}
