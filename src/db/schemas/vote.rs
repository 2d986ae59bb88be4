//! Vote document schema
//!
//! Votes are keyed by `{caseId}_{identityId}`; the `_id` uniqueness is the
//! one-vote-per-pair guard.

use bson::{doc, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::IntoIndexes;
use crate::model::{Verdict, Vote};

/// Collection name for votes
pub const VOTE_COLLECTION: &str = "votes";

/// Vote document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct VoteDoc {
    /// Deterministic key `{case_id}_{identity_id}`
    pub _id: String,

    pub case_id: String,

    pub identity_id: String,

    pub verdict: Verdict,

    pub created_at: DateTime,
}

impl From<Vote> for VoteDoc {
    fn from(vote: Vote) -> Self {
        Self {
            _id: vote.id,
            case_id: vote.case_id,
            identity_id: vote.identity_id,
            verdict: vote.verdict,
            created_at: DateTime::from_chrono(vote.created_at),
        }
    }
}

impl From<VoteDoc> for Vote {
    fn from(doc: VoteDoc) -> Self {
        Self {
            id: doc._id,
            case_id: doc.case_id,
            identity_id: doc.identity_id,
            verdict: doc.verdict,
            created_at: doc.created_at.to_chrono(),
        }
    }
}

impl IntoIndexes for VoteDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "identity_id": 1, "created_at": -1 },
                Some(
                    IndexOptions::builder()
                        .name("identity_history_index".to_string())
                        .build(),
                ),
            ),
            // Tally recounts scan by case
            (
                doc! { "case_id": 1 },
                Some(
                    IndexOptions::builder()
                        .name("case_id_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}
