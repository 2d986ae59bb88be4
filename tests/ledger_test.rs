//! Ledger integration tests
//!
//! Runs the full `Tribunal` facade against the in-memory store:
//! - Case round trip through moderation
//! - Vote uniqueness and tally invariants, including concurrent votes
//! - Daily quotas and day rollover
//! - Comment gating and visibility
//! - Profile rollups
//! - All-or-nothing vote commits under store failure

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio_test::{assert_err, assert_ok};

use tribunal::clock::{Clock, DayPolicy, FixedClock};
use tribunal::db::{
    CaseCommit, InsertOutcome, LedgerStore, MemoryStore, Recount, VoteCommit,
};
use tribunal::ledger::{IdentityContext, Principal, QuotaClaim};
use tribunal::model::{
    Case, CaseDraft, CaseQuery, Classification, Comment, CommentQuery, Identity, QuotaAction,
    Tally, Verdict, Vote, VoteQuery, DAILY_JUDGE_LIMIT,
};
use tribunal::{Tribunal, TribunalError};

// =============================================================================
// Fixtures
// =============================================================================

struct Harness {
    tribunal: Tribunal,
    store: Arc<MemoryStore>,
    clock: Arc<FixedClock>,
}

fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap(),
    ));
    let tribunal = Tribunal::new(
        Arc::clone(&store) as Arc<dyn LedgerStore>,
        Arc::clone(&clock) as Arc<dyn Clock>,
        DayPolicy::utc(),
    );
    Harness {
        tribunal,
        store,
        clock,
    }
}

async fn login(tribunal: &Tribunal, id: &str) -> IdentityContext {
    tribunal
        .establish(Principal::new(id, Some(&format!("User {}", id))).unwrap())
        .await
        .unwrap()
}

fn draft(title: &str) -> CaseDraft {
    CaseDraft {
        title: title.to_string(),
        description: "I kept the last slice of pizza for myself".to_string(),
        anonymous: false,
    }
}

/// Create a case as `author` and publish it
async fn published_case(h: &Harness, author: &str, title: &str) -> Case {
    let mut ctx = login(&h.tribunal, author).await;
    let case = h.tribunal.create_case(&mut ctx, draft(title)).await.unwrap();
    h.tribunal.moderation().verify_case(&case.id).await.unwrap()
}

// =============================================================================
// Cases
// =============================================================================

#[tokio::test]
async fn test_case_round_trip_through_moderation() {
    let h = harness();
    let mut author = login(&h.tribunal, "author").await;

    let case = h.tribunal.create_case(&mut author, draft("AITA?")).await.unwrap();
    assert!(!case.is_verified);
    assert_eq!(case.total_votes, 0);
    assert_eq!(case.author_display_name, "User author");
    assert_eq!(author.stats().cases_posted, 1);
    assert_eq!(author.stats().daily_cases_posted, 1);

    // Pending: absent from the feed, visible to its author only
    assert!(h.tribunal.list_verified_cases().await.unwrap().is_empty());
    assert_ok!(h.tribunal.get_case(&case.id, Some("author")).await);
    assert!(matches!(
        h.tribunal.get_case(&case.id, Some("someone-else")).await,
        Err(TribunalError::Unverified(_))
    ));
    assert!(matches!(
        h.tribunal.get_case(&case.id, None).await,
        Err(TribunalError::Unverified(_))
    ));

    let pending = h.tribunal.moderation().pending_cases().await.unwrap();
    assert_eq!(pending.len(), 1);

    h.tribunal.moderation().verify_case(&case.id).await.unwrap();

    let feed = h.tribunal.list_verified_cases().await.unwrap();
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0].id, case.id);
    assert_ok!(h.tribunal.get_case(&case.id, None).await);
    assert!(h.tribunal.moderation().pending_cases().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_anonymous_case_hides_author_name() {
    let h = harness();
    let mut ctx = login(&h.tribunal, "shy").await;
    let mut d = draft("Anonymous one");
    d.anonymous = true;

    let case = h.tribunal.create_case(&mut ctx, d).await.unwrap();
    assert!(case.is_anonymous);
    assert_eq!(case.author_display_name, "Anonymous");
    assert_eq!(case.author_id, "shy");

    // Still counted in the author's history
    let history = h.tribunal.history("shy").await.unwrap();
    assert_eq!(history.cases.len(), 1);
}

#[tokio::test]
async fn test_case_validation_rejects_without_mutation() {
    let h = harness();
    let mut ctx = login(&h.tribunal, "u1").await;

    let empty = draft("   ");
    assert!(matches!(
        h.tribunal.create_case(&mut ctx, empty).await,
        Err(TribunalError::Validation(_))
    ));

    let long = draft(&"x".repeat(101));
    assert!(matches!(
        h.tribunal.create_case(&mut ctx, long).await,
        Err(TribunalError::Validation(_))
    ));

    assert_eq!(h.store.counts().await.1, 0);
    // Validation failures do not use up the daily slot
    assert_ok!(h.tribunal.create_case(&mut ctx, draft(&"x".repeat(100))).await);
}

#[tokio::test]
async fn test_feed_orders_by_popularity_then_recency() {
    let h = harness();
    let older = published_case(&h, "a1", "Older").await;
    h.clock.advance(Duration::minutes(5));
    let newer = published_case(&h, "a2", "Newer").await;
    h.clock.advance(Duration::minutes(5));
    let popular = published_case(&h, "a3", "Popular").await;

    let mut judge = login(&h.tribunal, "judge").await;
    h.tribunal
        .cast_vote(&mut judge, &popular.id, Verdict::Guilty)
        .await
        .unwrap();

    let feed = h.tribunal.list_verified_cases().await.unwrap();
    let ids: Vec<&str> = feed.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec![popular.id.as_str(), newer.id.as_str(), older.id.as_str()]);
}

// =============================================================================
// Votes
// =============================================================================

#[tokio::test]
async fn test_duplicate_vote_leaves_tallies_unchanged() {
    let h = harness();
    let case = published_case(&h, "author", "Dup").await;
    let mut judge = login(&h.tribunal, "judge").await;

    let receipt = h
        .tribunal
        .cast_vote(&mut judge, &case.id, Verdict::Guilty)
        .await
        .unwrap();
    assert_eq!(receipt.vote.id, format!("{}_judge", case.id));
    assert_eq!(receipt.case.guilty_count, 1);
    assert_eq!(receipt.case.total_votes, 1);
    assert_eq!(receipt.case.popularity, 1);
    assert_eq!(judge.stats().cases_judged, 1);

    let again = h
        .tribunal
        .cast_vote(&mut judge, &case.id, Verdict::Innocent)
        .await;
    assert!(matches!(again, Err(TribunalError::DuplicateVote)));

    let case = h.tribunal.get_case(&case.id, None).await.unwrap();
    assert_eq!(case.guilty_count, 1);
    assert_eq!(case.innocent_count, 0);
    assert_eq!(case.total_votes, 1);
    assert!(case.tally_consistent());

    // The rejected attempt consumed no judging slot
    let stored = h.store.get_identity("judge").await.unwrap().unwrap();
    assert_eq!(stored.daily_cases_judged, 1);
    assert_eq!(stored.cases_judged, 1);
}

#[tokio::test]
async fn test_vote_preconditions_in_order() {
    let h = harness();
    let mut judge = login(&h.tribunal, "judge").await;

    assert!(matches!(
        h.tribunal.cast_vote(&mut judge, "missing", Verdict::Guilty).await,
        Err(TribunalError::NotFound(_))
    ));

    let mut author = login(&h.tribunal, "author").await;
    let pending = h.tribunal.create_case(&mut author, draft("Pending")).await.unwrap();
    assert!(matches!(
        h.tribunal.cast_vote(&mut judge, &pending.id, Verdict::Guilty).await,
        Err(TribunalError::Unverified(_))
    ));

    // Unverified is reported before an exhausted quota
    let mut exhausted = Identity::new("judge", "User judge");
    exhausted.daily_cases_judged = DAILY_JUDGE_LIMIT;
    exhausted.last_judged_day = Some(DayPolicy::utc().day_key(h.clock.now()));
    judge.absorb(exhausted);
    assert!(matches!(
        h.tribunal.cast_vote(&mut judge, &pending.id, Verdict::Guilty).await,
        Err(TribunalError::Unverified(_))
    ));

    assert_eq!(h.store.counts().await.2, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_opposite_votes_are_both_counted() {
    let h = harness();
    let case = published_case(&h, "author", "Race").await;

    let mut alice = login(&h.tribunal, "alice").await;
    let mut bob = login(&h.tribunal, "bob").await;

    let t1 = h.tribunal.clone();
    let c1 = case.id.clone();
    let first = tokio::spawn(async move { t1.cast_vote(&mut alice, &c1, Verdict::Guilty).await });
    let t2 = h.tribunal.clone();
    let c2 = case.id.clone();
    let second = tokio::spawn(async move { t2.cast_vote(&mut bob, &c2, Verdict::Innocent).await });

    assert_ok!(first.await.unwrap());
    assert_ok!(second.await.unwrap());

    let case = h.tribunal.get_case(&case.id, None).await.unwrap();
    assert_eq!(case.total_votes, 2);
    assert_eq!(case.guilty_count, 1);
    assert_eq!(case.innocent_count, 1);
    assert_eq!(case.popularity, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_same_identity_votes_once() {
    let h = harness();
    let case = published_case(&h, "author", "Double click").await;
    let ctx = login(&h.tribunal, "judge").await;

    let mut handles = Vec::new();
    for i in 0..8 {
        let tribunal = h.tribunal.clone();
        let case_id = case.id.clone();
        let mut ctx = ctx.clone();
        let verdict = if i % 2 == 0 { Verdict::Guilty } else { Verdict::Innocent };
        handles.push(tokio::spawn(async move {
            tribunal.cast_vote(&mut ctx, &case_id, verdict).await
        }));
    }

    let mut committed = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => committed += 1,
            Err(TribunalError::DuplicateVote) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(committed, 1);

    let case = h.tribunal.get_case(&case.id, None).await.unwrap();
    assert_eq!(case.total_votes, 1);
    assert!(case.tally_consistent());
    let judge = h.store.get_identity("judge").await.unwrap().unwrap();
    assert_eq!(judge.cases_judged, 1);
}

#[tokio::test]
async fn test_verdict_classification_follows_tallies() {
    let h = harness();
    let case = published_case(&h, "author", "Seventy percent").await;

    for i in 0..10 {
        let mut judge = login(&h.tribunal, &format!("j{}", i)).await;
        let verdict = if i < 7 { Verdict::Guilty } else { Verdict::Innocent };
        h.tribunal.cast_vote(&mut judge, &case.id, verdict).await.unwrap();
    }

    let case = h.tribunal.get_case(&case.id, None).await.unwrap();
    let verdict = case.verdict();
    assert_eq!(verdict.classification, Classification::Guilty);
    assert_eq!(verdict.to_string(), "GUILTY (70%)");
}

#[tokio::test]
async fn test_recount_repairs_drifted_tallies() {
    let h = harness();
    let case = published_case(&h, "author", "Drift").await;
    for (id, verdict) in [("j1", Verdict::Guilty), ("j2", Verdict::Guilty), ("j3", Verdict::Innocent)] {
        let mut judge = login(&h.tribunal, id).await;
        h.tribunal.cast_vote(&mut judge, &case.id, verdict).await.unwrap();
    }

    h.store.force_tally(&case.id, Tally::new(9, 0)).await.unwrap();
    let repaired = h.tribunal.moderation().recount(&case.id).await.unwrap();
    assert_eq!(repaired.guilty_count, 2);
    assert_eq!(repaired.innocent_count, 1);
    assert_eq!(repaired.total_votes, 3);
    assert_eq!(repaired.popularity, 3);

    assert!(matches!(
        h.tribunal.moderation().recount("missing").await,
        Err(TribunalError::NotFound(_))
    ));
}

// =============================================================================
// Quotas
// =============================================================================

#[tokio::test]
async fn test_judging_quota_and_rollover() {
    let h = harness();
    let mut cases = Vec::new();
    for i in 0..=DAILY_JUDGE_LIMIT {
        cases.push(published_case(&h, &format!("author{}", i), "Case").await);
    }

    let mut judge = login(&h.tribunal, "judge").await;
    for case in cases.iter().take(DAILY_JUDGE_LIMIT as usize) {
        assert_ok!(h.tribunal.cast_vote(&mut judge, &case.id, Verdict::Guilty).await);
    }
    assert_eq!(judge.stats().daily_cases_judged, DAILY_JUDGE_LIMIT);

    let last = &cases[DAILY_JUDGE_LIMIT as usize];
    let rejected = h.tribunal.cast_vote(&mut judge, &last.id, Verdict::Guilty).await;
    assert!(matches!(
        rejected,
        Err(TribunalError::QuotaExceeded(QuotaAction::Judge))
    ));
    assert_eq!(h.tribunal.get_case(&last.id, None).await.unwrap().total_votes, 0);

    // Next day: counter treated as zero, then incremented to one
    h.clock.advance(Duration::days(1));
    let receipt = h
        .tribunal
        .cast_vote(&mut judge, &last.id, Verdict::Innocent)
        .await
        .unwrap();
    assert_eq!(receipt.case.innocent_count, 1);
    assert_eq!(judge.stats().daily_cases_judged, 1);
    assert_eq!(judge.stats().cases_judged, DAILY_JUDGE_LIMIT + 1);
}

#[tokio::test]
async fn test_posting_quota_is_one_per_day() {
    let h = harness();
    let mut ctx = login(&h.tribunal, "poster").await;

    assert_ok!(h.tribunal.create_case(&mut ctx, draft("First")).await);
    assert!(matches!(
        h.tribunal.create_case(&mut ctx, draft("Second")).await,
        Err(TribunalError::QuotaExceeded(QuotaAction::Post))
    ));
    assert_eq!(h.store.counts().await.1, 1);

    h.clock.advance(Duration::days(1));
    assert_ok!(h.tribunal.create_case(&mut ctx, draft("Second")).await);
    assert_eq!(ctx.stats().cases_posted, 2);
    assert_eq!(ctx.stats().daily_cases_posted, 1);
}

#[tokio::test]
async fn test_stale_context_is_rechecked_at_commit() {
    let h = harness();
    let mut first = login(&h.tribunal, "poster").await;
    let mut stale = first.clone();

    assert_ok!(h.tribunal.create_case(&mut first, draft("First")).await);
    // `stale` still believes a slot is free; the store refuses
    let err = assert_err!(h.tribunal.create_case(&mut stale, draft("Second")).await);
    assert!(matches!(err, TribunalError::QuotaExceeded(QuotaAction::Post)));
    assert_eq!(h.store.counts().await.1, 1);
}

// =============================================================================
// Comments
// =============================================================================

#[tokio::test]
async fn test_comment_requires_prior_vote_and_is_unique() {
    let h = harness();
    let case = published_case(&h, "author", "Comments").await;
    let mut judge = login(&h.tribunal, "judge").await;

    let err = assert_err!(h.tribunal.submit_comment(&judge, &case.id, "Hot take").await);
    assert!(matches!(err, TribunalError::VoteRequired));
    assert_eq!(h.store.counts().await.3, 0);

    h.tribunal
        .cast_vote(&mut judge, &case.id, Verdict::Innocent)
        .await
        .unwrap();

    let err = assert_err!(h.tribunal.submit_comment(&judge, &case.id, "   ").await);
    assert!(matches!(err, TribunalError::Validation(_)));
    let err = assert_err!(h.tribunal.submit_comment(&judge, &case.id, &"y".repeat(201)).await);
    assert!(matches!(err, TribunalError::Validation(_)));

    let comment = h
        .tribunal
        .submit_comment(&judge, &case.id, "  Not their fault  ")
        .await
        .unwrap();
    assert_eq!(comment.text, "Not their fault");
    assert_eq!(comment.judge_verdict, Verdict::Innocent);
    assert!(!comment.is_verified);

    let err = assert_err!(h.tribunal.submit_comment(&judge, &case.id, "Again").await);
    assert!(matches!(err, TribunalError::DuplicateComment));
    assert_eq!(h.store.counts().await.3, 1);

    // Comments never touch tallies or quotas
    let case = h.tribunal.get_case(&case.id, None).await.unwrap();
    assert_eq!(case.total_votes, 1);
}

#[tokio::test]
async fn test_pending_comment_visible_to_author_only() {
    let h = harness();
    let case = published_case(&h, "author", "Visibility").await;
    let mut judge = login(&h.tribunal, "judge").await;
    let other = login(&h.tribunal, "other").await;
    h.tribunal.cast_vote(&mut judge, &case.id, Verdict::Guilty).await.unwrap();
    let comment = h.tribunal.submit_comment(&judge, &case.id, "Guilty").await.unwrap();

    assert!(h.tribunal.list_verified_comments(&case.id).await.unwrap().is_empty());
    assert_eq!(
        h.tribunal.get_own_comment(&judge, &case.id).await.unwrap(),
        Some(comment.clone())
    );
    assert_eq!(h.tribunal.get_own_comment(&other, &case.id).await.unwrap(), None);

    let pending = h.tribunal.moderation().pending_comments().await.unwrap();
    assert_eq!(pending.len(), 1);

    h.tribunal.moderation().verify_comment(&comment.id).await.unwrap();
    let public = h.tribunal.list_verified_comments(&case.id).await.unwrap();
    assert_eq!(public.len(), 1);
    assert!(public[0].is_verified);
}

#[tokio::test]
async fn test_verified_comments_newest_first() {
    let h = harness();
    let case = published_case(&h, "author", "Order").await;

    for id in ["early", "late"] {
        let mut judge = login(&h.tribunal, id).await;
        h.tribunal.cast_vote(&mut judge, &case.id, Verdict::Guilty).await.unwrap();
        let c = h.tribunal.submit_comment(&judge, &case.id, id).await.unwrap();
        h.tribunal.moderation().verify_comment(&c.id).await.unwrap();
        h.clock.advance(Duration::minutes(1));
    }

    let texts: Vec<String> = h
        .tribunal
        .list_verified_comments(&case.id)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.text)
        .collect();
    assert_eq!(texts, vec!["late", "early"]);
}

// =============================================================================
// Profile
// =============================================================================

#[tokio::test]
async fn test_profile_breakdown_and_history() {
    let h = harness();
    let mut judge = login(&h.tribunal, "judge").await;
    let joined = h.clock.now();

    let empty = h.tribunal.verdict_breakdown("judge").await.unwrap();
    assert_eq!((empty.guilty_pct, empty.innocent_pct), (0, 0));

    for (i, verdict) in [Verdict::Guilty, Verdict::Guilty, Verdict::Innocent].into_iter().enumerate() {
        let case = published_case(&h, &format!("a{}", i), "Case").await;
        h.clock.advance(Duration::minutes(1));
        h.tribunal.cast_vote(&mut judge, &case.id, verdict).await.unwrap();
    }

    let profile = h.tribunal.get_profile(&judge).await.unwrap();
    assert_eq!(profile.breakdown.guilty_pct, 67);
    assert_eq!(profile.breakdown.innocent_pct, 33);
    assert_eq!(profile.votes.len(), 3);
    assert!(profile.votes[0].created_at >= profile.votes[1].created_at);
    assert_eq!(profile.judging.used, 3);
    assert_eq!(profile.judging.remaining, DAILY_JUDGE_LIMIT - 3);
    assert_eq!(profile.posting.used, 0);
    assert_eq!(profile.identity.cases_judged, 3);

    h.clock.advance(Duration::days(1));
    let judge = login(&h.tribunal, "judge").await;
    let tomorrow = h.tribunal.get_profile(&judge).await.unwrap();
    assert_eq!(tomorrow.judging.used, 0);
    assert_eq!(tomorrow.identity.cases_judged, 3);
    // Member since the first request, not the latest login
    assert_eq!(tomorrow.identity.created_at, Some(joined));
}

#[tokio::test]
async fn test_profile_lists_pending_cases_newest_first() {
    let h = harness();
    let mut author = login(&h.tribunal, "author").await;
    let first = h.tribunal.create_case(&mut author, draft("First")).await.unwrap();
    h.tribunal.moderation().verify_case(&first.id).await.unwrap();
    h.clock.advance(Duration::days(1));
    let second = h.tribunal.create_case(&mut author, draft("Second")).await.unwrap();

    let profile = h.tribunal.get_profile(&author).await.unwrap();
    let ids: Vec<&str> = profile.cases.iter().map(|c| c.case.id.as_str()).collect();
    assert_eq!(ids, vec![second.id.as_str(), first.id.as_str()]);
    assert!(!profile.cases[0].case.is_verified);
    assert_eq!(profile.posting.remaining, 0);
}

// =============================================================================
// Store failure
// =============================================================================

/// Memory store with injected faults: it can fail the next `commit_vote`
/// before touching anything, and land a queued vote as soon as a recount has
/// read the case's votes
struct FlakyStore {
    inner: MemoryStore,
    fail_next_vote: AtomicBool,
    vote_during_recount: Mutex<Option<(Vote, QuotaClaim)>>,
}

impl FlakyStore {
    fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            fail_next_vote: AtomicBool::new(false),
            vote_during_recount: Mutex::new(None),
        }
    }

    async fn land_queued_vote(&self) {
        let queued = self.vote_during_recount.lock().unwrap().take();
        if let Some((vote, claim)) = queued {
            let outcome = self.inner.commit_vote(vote, claim).await.unwrap();
            assert!(matches!(outcome, VoteCommit::Committed { .. }));
        }
    }
}

#[async_trait]
impl LedgerStore for FlakyStore {
    fn backend(&self) -> &'static str {
        "flaky"
    }

    async fn ping(&self) -> tribunal::Result<()> {
        self.inner.ping().await
    }

    async fn get_identity(&self, id: &str) -> tribunal::Result<Option<Identity>> {
        self.inner.get_identity(id).await
    }

    async fn ensure_identity(
        &self,
        id: &str,
        display_name: &str,
        now: DateTime<Utc>,
    ) -> tribunal::Result<Identity> {
        self.inner.ensure_identity(id, display_name, now).await
    }

    async fn commit_case(&self, case: Case, claim: QuotaClaim) -> tribunal::Result<CaseCommit> {
        self.inner.commit_case(case, claim).await
    }

    async fn get_case(&self, id: &str) -> tribunal::Result<Option<Case>> {
        self.inner.get_case(id).await
    }

    async fn query_cases(&self, query: &CaseQuery) -> tribunal::Result<Vec<Case>> {
        self.inner.query_cases(query).await
    }

    async fn set_case_verified(&self, id: &str, verified: bool) -> tribunal::Result<Option<Case>> {
        self.inner.set_case_verified(id, verified).await
    }

    async fn recount_case(&self, id: &str) -> tribunal::Result<Option<Recount>> {
        let recount = self.inner.recount_case(id).await;
        self.land_queued_vote().await;
        recount
    }

    async fn commit_vote(&self, vote: Vote, claim: QuotaClaim) -> tribunal::Result<VoteCommit> {
        if self.fail_next_vote.swap(false, Ordering::SeqCst) {
            return Err(TribunalError::StoreUnavailable("connection reset".into()));
        }
        self.inner.commit_vote(vote, claim).await
    }

    async fn get_vote(&self, key: &str) -> tribunal::Result<Option<Vote>> {
        self.inner.get_vote(key).await
    }

    async fn query_votes(&self, query: &VoteQuery) -> tribunal::Result<Vec<Vote>> {
        let votes = self.inner.query_votes(query).await;
        self.land_queued_vote().await;
        votes
    }

    async fn insert_comment(&self, comment: Comment) -> tribunal::Result<InsertOutcome> {
        self.inner.insert_comment(comment).await
    }

    async fn query_comments(&self, query: &CommentQuery) -> tribunal::Result<Vec<Comment>> {
        self.inner.query_comments(query).await
    }

    async fn set_comment_verified(
        &self,
        id: &str,
        verified: bool,
    ) -> tribunal::Result<Option<Comment>> {
        self.inner.set_comment_verified(id, verified).await
    }
}

#[tokio::test]
async fn test_failed_vote_commit_leaves_no_trace_and_can_be_retried() {
    let store = Arc::new(FlakyStore::new());
    let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap()));
    let tribunal = Tribunal::new(
        Arc::clone(&store) as Arc<dyn LedgerStore>,
        clock as Arc<dyn Clock>,
        DayPolicy::utc(),
    );

    let mut author = login(&tribunal, "author").await;
    let case = tribunal.create_case(&mut author, draft("Flaky")).await.unwrap();
    tribunal.moderation().verify_case(&case.id).await.unwrap();

    let mut judge = login(&tribunal, "judge").await;
    store.fail_next_vote.store(true, Ordering::SeqCst);

    let err = assert_err!(tribunal.cast_vote(&mut judge, &case.id, Verdict::Guilty).await);
    assert!(err.is_retryable());
    assert_eq!(store.inner.counts().await.2, 0);
    let untouched = tribunal.get_case(&case.id, None).await.unwrap();
    assert_eq!(untouched.total_votes, 0);
    assert_eq!(judge.stats().cases_judged, 0);

    let receipt = tribunal
        .cast_vote(&mut judge, &case.id, Verdict::Guilty)
        .await
        .unwrap();
    assert_eq!(receipt.case.guilty_count, 1);
    assert_eq!(judge.stats().cases_judged, 1);
    assert_eq!(tribunal.get_own_vote(&judge, &case.id).await.unwrap(), Some(receipt.vote));
}

#[tokio::test]
async fn test_vote_landing_during_recount_is_kept() {
    let store = Arc::new(FlakyStore::new());
    let now = Utc.with_ymd_and_hms(2026, 5, 2, 8, 0, 0).unwrap();
    let clock = Arc::new(FixedClock::new(now));
    let tribunal = Tribunal::new(
        Arc::clone(&store) as Arc<dyn LedgerStore>,
        clock as Arc<dyn Clock>,
        DayPolicy::utc(),
    );

    let mut author = login(&tribunal, "author").await;
    let case = tribunal.create_case(&mut author, draft("Busy")).await.unwrap();
    tribunal.moderation().verify_case(&case.id).await.unwrap();

    let mut early = login(&tribunal, "early").await;
    tribunal.cast_vote(&mut early, &case.id, Verdict::Guilty).await.unwrap();

    login(&tribunal, "late").await;
    let claim = QuotaClaim::new(QuotaAction::Judge, DayPolicy::utc().day_key(now));
    *store.vote_during_recount.lock().unwrap() =
        Some((Vote::new(&case.id, "late", Verdict::Innocent, now), claim));

    tribunal.moderation().recount(&case.id).await.unwrap();
    assert!(store.vote_during_recount.lock().unwrap().is_none());

    let votes = store.inner.query_votes(&VoteQuery::by_case(&case.id)).await.unwrap();
    let stored = tribunal.get_case(&case.id, None).await.unwrap();
    assert_eq!(votes.len(), 2);
    assert_eq!(stored.total_votes as usize, votes.len());
    assert_eq!(stored.guilty_count, 1);
    assert_eq!(stored.innocent_count, 1);
    assert!(stored.tally_consistent());
}
