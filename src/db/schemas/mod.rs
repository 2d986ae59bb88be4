//! Database schemas for Tribunal
//!
//! MongoDB document structures for cases, votes, comments and identities,
//! with conversions to and from the ledger records.

mod case;
mod comment;
mod identity;
mod vote;

pub use case::{CaseDoc, CASE_COLLECTION};
pub use comment::{CommentDoc, COMMENT_COLLECTION};
pub use identity::{IdentityDoc, IDENTITY_COLLECTION};
pub use vote::{VoteDoc, VOTE_COLLECTION};

/// Stored counters are i64 (what `$inc` produces); records use u32
pub(crate) fn to_count(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}
