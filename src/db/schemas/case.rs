//! Case document schema

use bson::{doc, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use super::to_count;
use crate::db::mongo::IntoIndexes;
use crate::model::Case;

/// Collection name for cases
pub const CASE_COLLECTION: &str = "cases";

/// Case document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CaseDoc {
    /// Case id (UUID)
    pub _id: String,

    pub title: String,

    pub description: String,

    /// Identity that posted the case, kept even when anonymous
    pub author_id: String,

    /// Author display name, or "Anonymous"
    pub author_display_name: String,

    #[serde(default)]
    pub is_anonymous: bool,

    pub created_at: DateTime,

    /// Set by moderation; unverified cases are hidden from public lists
    #[serde(default)]
    pub is_verified: bool,

    #[serde(default)]
    pub guilty_count: i64,

    #[serde(default)]
    pub innocent_count: i64,

    #[serde(default)]
    pub total_votes: i64,

    #[serde(default)]
    pub popularity: i64,
}

impl From<Case> for CaseDoc {
    fn from(case: Case) -> Self {
        Self {
            _id: case.id,
            title: case.title,
            description: case.description,
            author_id: case.author_id,
            author_display_name: case.author_display_name,
            is_anonymous: case.is_anonymous,
            created_at: DateTime::from_chrono(case.created_at),
            is_verified: case.is_verified,
            guilty_count: i64::from(case.guilty_count),
            innocent_count: i64::from(case.innocent_count),
            total_votes: i64::from(case.total_votes),
            popularity: i64::from(case.popularity),
        }
    }
}

impl From<CaseDoc> for Case {
    fn from(doc: CaseDoc) -> Self {
        Self {
            id: doc._id,
            title: doc.title,
            description: doc.description,
            author_id: doc.author_id,
            author_display_name: doc.author_display_name,
            is_anonymous: doc.is_anonymous,
            created_at: doc.created_at.to_chrono(),
            is_verified: doc.is_verified,
            guilty_count: to_count(doc.guilty_count),
            innocent_count: to_count(doc.innocent_count),
            total_votes: to_count(doc.total_votes),
            popularity: to_count(doc.popularity),
        }
    }
}

impl IntoIndexes for CaseDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // Public feed: verified cases by popularity, newest first on ties
            (
                doc! { "is_verified": 1, "popularity": -1, "created_at": -1 },
                Some(
                    IndexOptions::builder()
                        .name("verified_feed_index".to_string())
                        .build(),
                ),
            ),
            // Profile history
            (
                doc! { "author_id": 1, "created_at": -1 },
                Some(
                    IndexOptions::builder()
                        .name("author_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}
