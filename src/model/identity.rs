//! Identity statistics record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::clock::DayKey;

/// Cases an identity may post per day
pub const DAILY_POST_LIMIT: u32 = 1;

/// Cases an identity may judge per day
pub const DAILY_JUDGE_LIMIT: u32 = 10;

/// Quota-limited actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuotaAction {
    Post,
    Judge,
}

impl QuotaAction {
    pub fn daily_limit(&self) -> u32 {
        match self {
            QuotaAction::Post => DAILY_POST_LIMIT,
            QuotaAction::Judge => DAILY_JUDGE_LIMIT,
        }
    }
}

impl fmt::Display for QuotaAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuotaAction::Post => write!(f, "posting"),
            QuotaAction::Judge => write!(f, "judging"),
        }
    }
}

/// Per-identity statistics, keyed by the identity provider's stable id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: String,
    pub display_name: String,
    pub cases_posted: u32,
    pub cases_judged: u32,
    pub daily_cases_posted: u32,
    pub daily_cases_judged: u32,
    pub last_case_day: Option<DayKey>,
    pub last_judged_day: Option<DayKey>,
    /// First time the identity was seen. Unknown for records that predate tracking it.
    pub created_at: Option<DateTime<Utc>>,
}

impl Identity {
    /// Fresh record with zeroed counters
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            cases_posted: 0,
            cases_judged: 0,
            daily_cases_posted: 0,
            daily_cases_judged: 0,
            last_case_day: None,
            last_judged_day: None,
            created_at: None,
        }
    }

    pub fn joined_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Stored daily counter for an action (not adjusted for rollover)
    pub fn daily_count(&self, action: QuotaAction) -> u32 {
        match action {
            QuotaAction::Post => self.daily_cases_posted,
            QuotaAction::Judge => self.daily_cases_judged,
        }
    }

    /// Day the stored daily counter belongs to
    pub fn last_day(&self, action: QuotaAction) -> Option<DayKey> {
        match action {
            QuotaAction::Post => self.last_case_day,
            QuotaAction::Judge => self.last_judged_day,
        }
    }
}
