//! Daily posting and judging allowances
//!
//! Counters are stored per identity together with the day they belong to.
//! A counter whose day is not today reads as zero; the reset happens inside
//! the same atomic step that applies the next increment.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::clock::{DayKey, DayPolicy};
use crate::model::{Identity, QuotaAction};
use crate::types::{Result, TribunalError};

/// A request to charge one slot of `action` on `day`.
///
/// Store backends apply it inside their atomic section via [`QuotaClaim::apply`]
/// (or an equivalent conditional update), so check and increment cannot interleave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaClaim {
    pub action: QuotaAction,
    pub day: DayKey,
    pub limit: u32,
}

impl QuotaClaim {
    pub fn new(action: QuotaAction, day: DayKey) -> Self {
        Self {
            action,
            day,
            limit: action.daily_limit(),
        }
    }

    /// Counter value on `self.day`, treating a stale day as zero
    pub fn effective_count(&self, identity: &Identity) -> u32 {
        if identity.last_day(self.action) == Some(self.day) {
            identity.daily_count(self.action)
        } else {
            0
        }
    }

    /// Check-then-act: reset a stale counter, then increment it and the
    /// lifetime counter. Returns `false` without mutating when the limit is reached.
    pub fn apply(&self, identity: &mut Identity) -> bool {
        let current = self.effective_count(identity);
        if current >= self.limit {
            return false;
        }
        match self.action {
            QuotaAction::Post => {
                identity.daily_cases_posted = current + 1;
                identity.last_case_day = Some(self.day);
                identity.cases_posted += 1;
            }
            QuotaAction::Judge => {
                identity.daily_cases_judged = current + 1;
                identity.last_judged_day = Some(self.day);
                identity.cases_judged += 1;
            }
        }
        true
    }
}

/// Allowance snapshot for one action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaStatus {
    pub action: QuotaAction,
    pub day: DayKey,
    pub used: u32,
    pub limit: u32,
    pub remaining: u32,
}

/// Decides whether an action is allowed today
#[derive(Debug, Clone, Copy, Default)]
pub struct QuotaTracker {
    policy: DayPolicy,
}

impl QuotaTracker {
    pub fn new(policy: DayPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> DayPolicy {
        self.policy
    }

    pub fn today(&self, now: DateTime<Utc>) -> DayKey {
        self.policy.day_key(now)
    }

    /// Claim for one slot of `action` on the day containing `now`
    pub fn claim(&self, action: QuotaAction, now: DateTime<Utc>) -> QuotaClaim {
        QuotaClaim::new(action, self.today(now))
    }

    /// Pure predicate; does not reset stored counters
    pub fn allows(&self, identity: &Identity, action: QuotaAction, now: DateTime<Utc>) -> bool {
        let claim = self.claim(action, now);
        claim.effective_count(identity) < claim.limit
    }

    pub fn can_post(&self, identity: &Identity, now: DateTime<Utc>) -> bool {
        self.allows(identity, QuotaAction::Post, now)
    }

    pub fn can_judge(&self, identity: &Identity, now: DateTime<Utc>) -> bool {
        self.allows(identity, QuotaAction::Judge, now)
    }

    /// Today's usage with rollover applied
    pub fn status(&self, identity: &Identity, action: QuotaAction, now: DateTime<Utc>) -> QuotaStatus {
        let claim = self.claim(action, now);
        let used = claim.effective_count(identity);
        QuotaStatus {
            action,
            day: claim.day,
            used,
            limit: claim.limit,
            remaining: claim.limit.saturating_sub(used),
        }
    }

    /// Apply one slot of `action` to an in-memory record
    pub fn record(&self, identity: &mut Identity, action: QuotaAction, now: DateTime<Utc>) -> Result<()> {
        if self.claim(action, now).apply(identity) {
            Ok(())
        } else {
            Err(TribunalError::QuotaExceeded(action))
        }
    }

    pub fn record_post(&self, identity: &mut Identity, now: DateTime<Utc>) -> Result<()> {
        self.record(identity, QuotaAction::Post, now)
    }

    pub fn record_judge(&self, identity: &mut Identity, now: DateTime<Utc>) -> Result<()> {
        self.record(identity, QuotaAction::Judge, now)
    }
}
