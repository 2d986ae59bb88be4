//! Ledger records
//!
//! Plain data shared by the store seam, the ledger components and the HTTP
//! layer. Derived values (verdict classification, quota status) are computed
//! from these records and never stored.

mod case;
mod comment;
mod identity;
mod vote;

pub use case::{
    BackgroundTier, Case, CaseDraft, CaseOrder, CaseQuery, CaseVerdict, Classification, Tally,
    ANONYMOUS_AUTHOR, DESCRIPTION_MAX_CHARS, TITLE_MAX_CHARS,
};
pub(crate) use case::rounded_percent;
pub use comment::{validate_comment_text, Comment, CommentQuery, COMMENT_MAX_CHARS};
pub use identity::{Identity, QuotaAction, DAILY_JUDGE_LIMIT, DAILY_POST_LIMIT};
pub use vote::{vote_key, Verdict, Vote, VoteQuery};

/// Sort direction on `created_at`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Recency {
    #[default]
    NewestFirst,
    OldestFirst,
}
