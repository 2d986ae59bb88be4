//! MongoDB-backed ledger store
//!
//! Vote and case commits run as multi-document transactions, so MongoDB must
//! be deployed as a replica set. Tallies change only through `$inc`, and quota
//! counters only through a conditional pipeline update that resets a stale
//! day and increments in one server-side step.

use async_trait::async_trait;
use bson::{doc, Document};
use chrono::{DateTime, Utc};
use mongodb::{
    error::{Error as MongoError, TRANSIENT_TRANSACTION_ERROR, UNKNOWN_TRANSACTION_COMMIT_RESULT},
    options::ReturnDocument,
    ClientSession,
};
use tracing::{debug, info, warn};

use super::mongo::{is_duplicate_key, MongoClient, MongoCollection};
use super::schemas::{
    CaseDoc, CommentDoc, IdentityDoc, VoteDoc, CASE_COLLECTION, COMMENT_COLLECTION,
    IDENTITY_COLLECTION, VOTE_COLLECTION,
};
use super::store::{CaseCommit, InsertOutcome, LedgerStore, Recount, VoteCommit};
use crate::ledger::quota::QuotaClaim;
use crate::model::{
    Case, CaseOrder, CaseQuery, Comment, CommentQuery, Identity, QuotaAction, Recency, Tally,
    Verdict, Vote, VoteQuery,
};
use crate::types::{Result, TribunalError};

/// Field names a quota claim touches
struct QuotaFields {
    daily: &'static str,
    day: &'static str,
    lifetime: &'static str,
}

fn quota_fields(action: QuotaAction) -> QuotaFields {
    match action {
        QuotaAction::Post => QuotaFields {
            daily: "daily_cases_posted",
            day: "last_case_day",
            lifetime: "cases_posted",
        },
        QuotaAction::Judge => QuotaFields {
            daily: "daily_cases_judged",
            day: "last_judged_day",
            lifetime: "cases_judged",
        },
    }
}

/// Filter matching the identity only while it has a free slot on `claim.day`
fn claim_filter(identity_id: &str, claim: &QuotaClaim) -> Document {
    let f = quota_fields(claim.action);
    let day = claim.day.to_string();
    doc! {
        "_id": identity_id,
        "$or": [
            { f.day: { "$ne": day.as_str() } },
            { f.daily: { "$lt": i64::from(claim.limit) } },
        ],
    }
}

/// Pipeline update: reset a stale daily counter, then increment it and the lifetime counter
fn claim_update(claim: &QuotaClaim) -> Vec<Document> {
    let f = quota_fields(claim.action);
    let day = claim.day.to_string();
    let daily_ref = format!("${}", f.daily);
    let day_ref = format!("${}", f.day);
    let lifetime_ref = format!("${}", f.lifetime);
    vec![doc! {
        "$set": {
            f.daily: {
                "$cond": [
                    { "$eq": [day_ref.as_str(), day.as_str()] },
                    { "$add": [{ "$ifNull": [daily_ref.as_str(), 0_i64] }, 1_i64] },
                    1_i64,
                ]
            },
            f.day: day.as_str(),
            f.lifetime: { "$add": [{ "$ifNull": [lifetime_ref.as_str(), 0_i64] }, 1_i64] },
        }
    }]
}

fn tally_field(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Guilty => "guilty_count",
        Verdict::Innocent => "innocent_count",
    }
}

fn case_filter(query: &CaseQuery) -> Document {
    let mut filter = Document::new();
    if let Some(verified) = query.verified {
        filter.insert("is_verified", verified);
    }
    if let Some(ref author) = query.author_id {
        filter.insert("author_id", author.as_str());
    }
    filter
}

fn case_sort(order: CaseOrder) -> Document {
    match order {
        CaseOrder::Popularity => doc! { "popularity": -1, "created_at": -1, "_id": 1 },
        CaseOrder::Created(Recency::NewestFirst) => doc! { "created_at": -1, "_id": 1 },
        CaseOrder::Created(Recency::OldestFirst) => doc! { "created_at": 1, "_id": 1 },
    }
}

fn vote_filter(query: &VoteQuery) -> Document {
    let mut filter = Document::new();
    if let Some(ref case_id) = query.case_id {
        filter.insert("case_id", case_id.as_str());
    }
    if let Some(ref identity_id) = query.identity_id {
        filter.insert("identity_id", identity_id.as_str());
    }
    filter
}

fn comment_filter(query: &CommentQuery) -> Document {
    let mut filter = Document::new();
    if let Some(ref case_id) = query.case_id {
        filter.insert("case_id", case_id.as_str());
    }
    if let Some(ref identity_id) = query.identity_id {
        filter.insert("identity_id", identity_id.as_str());
    }
    if let Some(verified) = query.verified {
        filter.insert("is_verified", verified);
    }
    filter
}

fn comment_sort(order: Recency) -> Document {
    match order {
        Recency::NewestFirst => doc! { "created_at": -1, "_id": 1 },
        Recency::OldestFirst => doc! { "created_at": 1, "_id": 1 },
    }
}

/// Ledger store over four MongoDB collections
pub struct MongoStore {
    client: MongoClient,
    cases: MongoCollection<CaseDoc>,
    votes: MongoCollection<VoteDoc>,
    comments: MongoCollection<CommentDoc>,
    identities: MongoCollection<IdentityDoc>,
    txn_attempts: u32,
}

impl MongoStore {
    /// Open the collections and apply their indexes
    pub async fn connect(client: MongoClient, txn_attempts: u32) -> Result<Self> {
        let cases = client.collection::<CaseDoc>(CASE_COLLECTION).await?;
        let votes = client.collection::<VoteDoc>(VOTE_COLLECTION).await?;
        let comments = client.collection::<CommentDoc>(COMMENT_COLLECTION).await?;
        let identities = client.collection::<IdentityDoc>(IDENTITY_COLLECTION).await?;

        info!(
            "Ledger collections ready in '{}' (transaction attempts: {})",
            client.db_name(),
            txn_attempts
        );

        Ok(Self {
            client,
            cases,
            votes,
            comments,
            identities,
            txn_attempts: txn_attempts.max(1),
        })
    }

    /// Charge a quota slot inside `session`. `Ok(None)` when no slot was free
    /// or the identity is missing.
    async fn claim_in(
        &self,
        identity_id: &str,
        claim: &QuotaClaim,
        session: &mut ClientSession,
    ) -> std::result::Result<Option<IdentityDoc>, MongoError> {
        self.identities
            .inner()
            .find_one_and_update(claim_filter(identity_id, claim), claim_update(claim))
            .return_document(ReturnDocument::After)
            .session(session)
            .await
    }

    async fn identity_exists(
        &self,
        identity_id: &str,
        session: &mut ClientSession,
    ) -> std::result::Result<bool, MongoError> {
        Ok(self
            .identities
            .inner()
            .find_one(doc! { "_id": identity_id })
            .session(session)
            .await?
            .is_some())
    }

    /// Commit, retrying only the commit when its result is unknown
    async fn commit(&self, session: &mut ClientSession) -> std::result::Result<(), MongoError> {
        let mut attempt = 1;
        loop {
            match session.commit_transaction().await {
                Err(e)
                    if e.contains_label(UNKNOWN_TRANSACTION_COMMIT_RESULT)
                        && attempt < self.txn_attempts =>
                {
                    warn!("Commit result unknown, retrying commit (attempt {})", attempt);
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    async fn try_commit_case(
        &self,
        case: &Case,
        claim: &QuotaClaim,
    ) -> std::result::Result<CaseCommit, MongoError> {
        let mut session = self.client.inner().start_session().await?;
        session.start_transaction().await?;

        let Some(identity) = self.claim_in(&case.author_id, claim, &mut session).await? else {
            let exists = self.identity_exists(&case.author_id, &mut session).await?;
            session.abort_transaction().await?;
            return Ok(if exists {
                CaseCommit::QuotaExceeded
            } else {
                CaseCommit::IdentityMissing
            });
        };

        self.cases
            .inner()
            .insert_one(CaseDoc::from(case.clone()))
            .session(&mut session)
            .await?;

        self.commit(&mut session).await?;

        Ok(CaseCommit::Committed {
            case: case.clone(),
            identity: identity.into(),
        })
    }

    async fn try_commit_vote(
        &self,
        vote: &Vote,
        claim: &QuotaClaim,
    ) -> std::result::Result<VoteCommit, MongoError> {
        let mut session = self.client.inner().start_session().await?;
        session.start_transaction().await?;

        // The deterministic _id is the uniqueness gate
        if let Err(e) = self
            .votes
            .inner()
            .insert_one(VoteDoc::from(vote.clone()))
            .session(&mut session)
            .await
        {
            if let Err(abort) = session.abort_transaction().await {
                warn!("Abort after failed vote insert {} failed: {}", vote.id, abort);
            }
            return if is_duplicate_key(&e) {
                Ok(VoteCommit::Duplicate)
            } else {
                Err(e)
            };
        }

        let case = self
            .cases
            .inner()
            .find_one_and_update(
                doc! { "_id": vote.case_id.as_str(), "is_verified": true },
                doc! {
                    "$inc": {
                        tally_field(vote.verdict): 1_i64,
                        "total_votes": 1_i64,
                        "popularity": 1_i64,
                    }
                },
            )
            .return_document(ReturnDocument::After)
            .session(&mut session)
            .await?;
        let Some(case) = case else {
            session.abort_transaction().await?;
            return Ok(VoteCommit::CaseUnavailable);
        };

        let Some(identity) = self.claim_in(&vote.identity_id, claim, &mut session).await? else {
            let exists = self.identity_exists(&vote.identity_id, &mut session).await?;
            session.abort_transaction().await?;
            return Ok(if exists {
                VoteCommit::QuotaExceeded
            } else {
                VoteCommit::IdentityMissing
            });
        };

        self.commit(&mut session).await?;

        Ok(VoteCommit::Committed {
            vote: vote.clone(),
            case: case.into(),
            identity: identity.into(),
        })
    }

    /// Scan the case's votes and `$set` the tallies in one transaction. A vote
    /// committing concurrently touches the same case document, so one of the
    /// two transactions hits a write conflict and is retried.
    async fn try_recount_case(&self, id: &str) -> std::result::Result<Option<Recount>, MongoError> {
        let mut session = self.client.inner().start_session().await?;
        session.start_transaction().await?;

        let Some(previous) = self
            .cases
            .inner()
            .find_one(doc! { "_id": id })
            .session(&mut session)
            .await?
        else {
            session.abort_transaction().await?;
            return Ok(None);
        };

        let mut tally = Tally::default();
        let mut cursor = self
            .votes
            .inner()
            .find(doc! { "case_id": id })
            .session(&mut session)
            .await?;
        while let Some(vote) = cursor.next(&mut session).await {
            tally.record(Vote::from(vote?).verdict);
        }

        let total = i64::from(tally.total());
        let case = self
            .cases
            .inner()
            .find_one_and_update(
                doc! { "_id": id },
                doc! {
                    "$set": {
                        "guilty_count": i64::from(tally.guilty),
                        "innocent_count": i64::from(tally.innocent),
                        "total_votes": total,
                        "popularity": total,
                    }
                },
            )
            .return_document(ReturnDocument::After)
            .session(&mut session)
            .await?;
        let Some(case) = case else {
            session.abort_transaction().await?;
            return Ok(None);
        };

        self.commit(&mut session).await?;

        Ok(Some(Recount {
            previous: previous.into(),
            case: case.into(),
        }))
    }

    fn should_retry(&self, err: &MongoError, attempt: u32) -> bool {
        err.contains_label(TRANSIENT_TRANSACTION_ERROR) && attempt < self.txn_attempts
    }
}

#[async_trait]
impl LedgerStore for MongoStore {
    fn backend(&self) -> &'static str {
        "mongodb"
    }

    async fn ping(&self) -> Result<()> {
        self.client.ping().await
    }

    async fn get_identity(&self, id: &str) -> Result<Option<Identity>> {
        Ok(self
            .identities
            .find_one(doc! { "_id": id })
            .await?
            .map(Identity::from))
    }

    async fn ensure_identity(
        &self,
        id: &str,
        display_name: &str,
        now: DateTime<Utc>,
    ) -> Result<Identity> {
        let result = self
            .identities
            .inner()
            .find_one_and_update(
                doc! { "_id": id },
                doc! {
                    "$setOnInsert": {
                        "display_name": display_name,
                        "cases_posted": 0_i64,
                        "cases_judged": 0_i64,
                        "daily_cases_posted": 0_i64,
                        "daily_cases_judged": 0_i64,
                        "created_at": bson::DateTime::from_chrono(now),
                    }
                },
            )
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await;

        match result {
            Ok(Some(doc)) => Ok(doc.into()),
            // Two concurrent upserts on one _id: the loser reads the winner's record
            Err(e) if is_duplicate_key(&e) => self
                .get_identity(id)
                .await?
                .ok_or_else(|| TribunalError::NotFound(format!("identity {}", id))),
            Ok(None) => Err(TribunalError::Internal(
                "Upsert returned no identity".into(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    async fn commit_case(&self, case: Case, claim: QuotaClaim) -> Result<CaseCommit> {
        let mut attempt = 1;
        loop {
            match self.try_commit_case(&case, &claim).await {
                Err(e) if self.should_retry(&e, attempt) => {
                    warn!("Transient error committing case {}: {}", case.id, e);
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
                Ok(outcome) => {
                    debug!("Case commit {} -> {}", case.id, commit_label(&outcome));
                    return Ok(outcome);
                }
            }
        }
    }

    async fn get_case(&self, id: &str) -> Result<Option<Case>> {
        Ok(self.cases.find_one(doc! { "_id": id }).await?.map(Case::from))
    }

    async fn query_cases(&self, query: &CaseQuery) -> Result<Vec<Case>> {
        let docs = self
            .cases
            .find_many(case_filter(query), case_sort(query.order))
            .await?;
        Ok(docs.into_iter().map(Case::from).collect())
    }

    async fn set_case_verified(&self, id: &str, verified: bool) -> Result<Option<Case>> {
        Ok(self
            .cases
            .inner()
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": { "is_verified": verified } })
            .return_document(ReturnDocument::After)
            .await?
            .map(Case::from))
    }

    async fn recount_case(&self, id: &str) -> Result<Option<Recount>> {
        let mut attempt = 1;
        loop {
            match self.try_recount_case(id).await {
                Err(e) if self.should_retry(&e, attempt) => {
                    warn!("Transient error recounting case {}: {}", id, e);
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
                Ok(outcome) => return Ok(outcome),
            }
        }
    }

    async fn commit_vote(&self, vote: Vote, claim: QuotaClaim) -> Result<VoteCommit> {
        let mut attempt = 1;
        loop {
            match self.try_commit_vote(&vote, &claim).await {
                Err(e) if self.should_retry(&e, attempt) => {
                    warn!("Transient error committing vote {}: {}", vote.id, e);
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
                Ok(outcome) => return Ok(outcome),
            }
        }
    }

    async fn get_vote(&self, key: &str) -> Result<Option<Vote>> {
        Ok(self.votes.find_one(doc! { "_id": key }).await?.map(Vote::from))
    }

    async fn query_votes(&self, query: &VoteQuery) -> Result<Vec<Vote>> {
        let docs = self
            .votes
            .find_many(vote_filter(query), doc! { "created_at": -1, "_id": 1 })
            .await?;
        Ok(docs.into_iter().map(Vote::from).collect())
    }

    async fn insert_comment(&self, comment: Comment) -> Result<InsertOutcome> {
        self.comments.insert_unique(CommentDoc::from(comment)).await
    }

    async fn query_comments(&self, query: &CommentQuery) -> Result<Vec<Comment>> {
        let docs = self
            .comments
            .find_many(comment_filter(query), comment_sort(query.order))
            .await?;
        Ok(docs.into_iter().map(Comment::from).collect())
    }

    async fn set_comment_verified(&self, id: &str, verified: bool) -> Result<Option<Comment>> {
        Ok(self
            .comments
            .inner()
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": { "is_verified": verified } })
            .return_document(ReturnDocument::After)
            .await?
            .map(Comment::from))
    }
}

fn commit_label(outcome: &CaseCommit) -> &'static str {
    match outcome {
        CaseCommit::Committed { .. } => "committed",
        CaseCommit::QuotaExceeded => "quota_exceeded",
        CaseCommit::IdentityMissing => "identity_missing",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::DayKey;
    use chrono::NaiveDate;

    fn claim(action: QuotaAction) -> QuotaClaim {
        QuotaClaim::new(action, DayKey::new(NaiveDate::from_ymd_opt(2026, 2, 3).unwrap()))
    }

    #[test]
    fn test_claim_filter_admits_stale_day_or_free_slot() {
        let filter = claim_filter("u1", &claim(QuotaAction::Judge));
        assert_eq!(filter.get_str("_id").unwrap(), "u1");
        let or = filter.get_array("$or").unwrap();
        assert_eq!(or.len(), 2);
        let stale = or[0].as_document().unwrap();
        assert_eq!(
            stale.get_document("last_judged_day").unwrap().get_str("$ne").unwrap(),
            "2026-02-03"
        );
        let free = or[1].as_document().unwrap();
        assert_eq!(
            free.get_document("daily_cases_judged").unwrap().get_i64("$lt").unwrap(),
            10
        );
    }

    #[test]
    fn test_claim_update_targets_action_fields() {
        let update = claim_update(&claim(QuotaAction::Post));
        assert_eq!(update.len(), 1);
        let set = update[0].get_document("$set").unwrap();
        assert!(set.contains_key("daily_cases_posted"));
        assert_eq!(set.get_str("last_case_day").unwrap(), "2026-02-03");
        assert!(set.contains_key("cases_posted"));
        assert!(!set.contains_key("daily_cases_judged"));
    }

    #[test]
    fn test_case_filter_and_sort() {
        let query = CaseQuery {
            verified: Some(true),
            author_id: None,
            order: CaseOrder::Popularity,
        };
        let filter = case_filter(&query);
        assert!(filter.get_bool("is_verified").unwrap());
        assert!(!filter.contains_key("author_id"));

        let sort = case_sort(CaseOrder::Popularity);
        let keys: Vec<_> = sort.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["popularity", "created_at", "_id"]);
    }

    #[test]
    fn test_comment_filter_combines_fields() {
        let query = CommentQuery {
            case_id: Some("c1".into()),
            identity_id: Some("u1".into()),
            verified: None,
            order: Recency::NewestFirst,
        };
        let filter = comment_filter(&query);
        assert_eq!(filter.get_str("case_id").unwrap(), "c1");
        assert_eq!(filter.get_str("identity_id").unwrap(), "u1");
        assert!(!filter.contains_key("is_verified"));
    }
}
