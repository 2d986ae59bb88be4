//! Read-only profile rollups

use serde::Serialize;
use std::sync::Arc;

use super::cases::{CaseStore, CaseView};
use super::identity::IdentityContext;
use super::quota::{QuotaStatus, QuotaTracker};
use super::votes::VoteLedger;
use crate::clock::Clock;
use crate::model::{rounded_percent, Case, Identity, QuotaAction, Tally, Vote};
use crate::types::Result;

/// Share of an identity's votes per verdict, in whole percent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerdictBreakdown {
    pub guilty_pct: u32,
    pub innocent_pct: u32,
    pub votes: u32,
}

impl VerdictBreakdown {
    pub fn from_votes(votes: &[Vote]) -> Self {
        let mut tally = Tally::default();
        for vote in votes {
            tally.record(vote.verdict);
        }
        let total = tally.total();
        Self {
            guilty_pct: rounded_percent(tally.guilty, total),
            innocent_pct: rounded_percent(tally.innocent, total),
            votes: total,
        }
    }
}

/// Cases authored and votes cast, each newest first
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct History {
    pub cases: Vec<Case>,
    pub votes: Vec<Vote>,
}

/// Everything the profile page shows
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub identity: Identity,
    pub posting: QuotaStatus,
    pub judging: QuotaStatus,
    pub breakdown: VerdictBreakdown,
    pub cases: Vec<CaseView>,
    pub votes: Vec<Vote>,
}

#[derive(Clone)]
pub struct ProfileAggregator {
    clock: Arc<dyn Clock>,
    quota: QuotaTracker,
    cases: CaseStore,
    votes: VoteLedger,
}

impl ProfileAggregator {
    pub fn new(
        clock: Arc<dyn Clock>,
        quota: QuotaTracker,
        cases: CaseStore,
        votes: VoteLedger,
    ) -> Self {
        Self {
            clock,
            quota,
            cases,
            votes,
        }
    }

    /// 0% / 0% when the identity has not voted
    pub async fn verdict_breakdown(&self, identity_id: &str) -> Result<VerdictBreakdown> {
        let votes = self.votes.votes_by(identity_id).await?;
        Ok(VerdictBreakdown::from_votes(&votes))
    }

    pub async fn history(&self, identity_id: &str) -> Result<History> {
        let cases = self.cases.list_by_author(identity_id).await?;
        let votes = self.votes.votes_by(identity_id).await?;
        Ok(History { cases, votes })
    }

    /// Profile for the caller, with quota status as of now
    pub async fn profile(&self, ctx: &IdentityContext) -> Result<Profile> {
        let now = self.clock.now();
        let History { cases, votes } = self.history(ctx.id()).await?;
        let identity = ctx.stats().clone();

        Ok(Profile {
            posting: self.quota.status(&identity, QuotaAction::Post, now),
            judging: self.quota.status(&identity, QuotaAction::Judge, now),
            breakdown: VerdictBreakdown::from_votes(&votes),
            cases: cases.into_iter().map(CaseView::owned).collect(),
            votes,
            identity,
        })
    }
}
