//! Identity document schema
//!
//! Per-identity counters, keyed by the identity provider's id.

use bson::{DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use super::to_count;
use crate::clock::DayKey;
use crate::db::mongo::IntoIndexes;
use crate::model::Identity;

/// Collection name for identities
pub const IDENTITY_COLLECTION: &str = "identities";

/// Identity document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct IdentityDoc {
    /// Identity provider id
    pub _id: String,

    pub display_name: String,

    #[serde(default)]
    pub cases_posted: i64,

    #[serde(default)]
    pub cases_judged: i64,

    #[serde(default)]
    pub daily_cases_posted: i64,

    #[serde(default)]
    pub daily_cases_judged: i64,

    /// `YYYY-MM-DD` the posting counter belongs to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_case_day: Option<String>,

    /// `YYYY-MM-DD` the judging counter belongs to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_judged_day: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
}

impl From<IdentityDoc> for Identity {
    fn from(doc: IdentityDoc) -> Self {
        Self {
            id: doc._id,
            display_name: doc.display_name,
            cases_posted: to_count(doc.cases_posted),
            cases_judged: to_count(doc.cases_judged),
            daily_cases_posted: to_count(doc.daily_cases_posted),
            daily_cases_judged: to_count(doc.daily_cases_judged),
            last_case_day: doc.last_case_day.as_deref().and_then(DayKey::parse),
            last_judged_day: doc.last_judged_day.as_deref().and_then(DayKey::parse),
            created_at: doc.created_at.map(DateTime::to_chrono),
        }
    }
}

impl IntoIndexes for IdentityDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        // Point lookups by _id only
        Vec::new()
    }
}
