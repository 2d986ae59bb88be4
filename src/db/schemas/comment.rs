//! Comment document schema

use bson::{doc, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::IntoIndexes;
use crate::model::{Comment, Verdict};

/// Collection name for comments
pub const COMMENT_COLLECTION: &str = "comments";

/// Comment document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CommentDoc {
    /// Comment id (UUID)
    pub _id: String,

    pub case_id: String,

    pub identity_id: String,

    pub user_display_name: String,

    /// Copy of the author's verdict on the case
    pub judge_verdict: Verdict,

    pub text: String,

    pub created_at: DateTime,

    #[serde(default)]
    pub is_verified: bool,
}

impl From<Comment> for CommentDoc {
    fn from(comment: Comment) -> Self {
        Self {
            _id: comment.id,
            case_id: comment.case_id,
            identity_id: comment.identity_id,
            user_display_name: comment.user_display_name,
            judge_verdict: comment.judge_verdict,
            text: comment.text,
            created_at: DateTime::from_chrono(comment.created_at),
            is_verified: comment.is_verified,
        }
    }
}

impl From<CommentDoc> for Comment {
    fn from(doc: CommentDoc) -> Self {
        Self {
            id: doc._id,
            case_id: doc.case_id,
            identity_id: doc.identity_id,
            user_display_name: doc.user_display_name,
            judge_verdict: doc.judge_verdict,
            text: doc.text,
            created_at: doc.created_at.to_chrono(),
            is_verified: doc.is_verified,
        }
    }
}

impl IntoIndexes for CommentDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // One comment per (case, identity)
            (
                doc! { "case_id": 1, "identity_id": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("case_identity_unique".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "case_id": 1, "is_verified": 1, "created_at": -1 },
                Some(
                    IndexOptions::builder()
                        .name("case_verified_index".to_string())
                        .build(),
                ),
            ),
            // Moderation queue
            (
                doc! { "is_verified": 1, "created_at": 1 },
                Some(
                    IndexOptions::builder()
                        .name("pending_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}
