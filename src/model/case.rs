//! Case record, tallies and verdict classification

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use super::{Recency, Verdict};
use crate::types::{Result, TribunalError};

/// Maximum title length in characters
pub const TITLE_MAX_CHARS: usize = 100;

/// Maximum description length in characters
pub const DESCRIPTION_MAX_CHARS: usize = 500;

/// Author display name shown for anonymous cases
pub const ANONYMOUS_AUTHOR: &str = "Anonymous";

/// Running vote counts of a case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Tally {
    pub guilty: u32,
    pub innocent: u32,
}

impl Tally {
    pub fn new(guilty: u32, innocent: u32) -> Self {
        Self { guilty, innocent }
    }

    pub fn total(&self) -> u32 {
        self.guilty + self.innocent
    }

    /// Add one verdict
    pub fn record(&mut self, verdict: Verdict) {
        match verdict {
            Verdict::Guilty => self.guilty += 1,
            Verdict::Innocent => self.innocent += 1,
        }
    }

    /// Classify by guilty share: >60% guilty, <40% innocent, otherwise undecided.
    ///
    /// Integer comparison keeps the 60/40 boundaries exact.
    pub fn classify(&self) -> Classification {
        let total = u64::from(self.total());
        if total == 0 {
            return Classification::NoVerdict;
        }
        let guilty_scaled = u64::from(self.guilty) * 100;
        if guilty_scaled > 60 * total {
            Classification::Guilty
        } else if guilty_scaled < 40 * total {
            Classification::Innocent
        } else {
            Classification::Undecided
        }
    }

    /// Full verdict view: classification, majority percentage and tier
    pub fn verdict(&self) -> CaseVerdict {
        let classification = self.classify();
        let percent = match classification {
            Classification::Guilty => Some(rounded_percent(self.guilty, self.total())),
            Classification::Innocent => Some(rounded_percent(self.innocent, self.total())),
            Classification::Undecided | Classification::NoVerdict => None,
        };
        CaseVerdict {
            classification,
            percent,
            tier: classification.tier(),
        }
    }
}

/// `part / total` as a whole percentage, halves rounded up. Zero when `total` is zero.
pub(crate) fn rounded_percent(part: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let part = u64::from(part);
    let total = u64::from(total);
    ((part * 200 + total) / (2 * total)) as u32
}

/// Community verdict derived from tallies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
    Guilty,
    Innocent,
    Undecided,
    NoVerdict,
}

impl Classification {
    pub fn tier(&self) -> BackgroundTier {
        match self {
            Classification::Guilty => BackgroundTier::Dark,
            Classification::Innocent => BackgroundTier::Light,
            Classification::Undecided | Classification::NoVerdict => BackgroundTier::Neutral,
        }
    }
}

/// Background tier a case card is rendered with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundTier {
    Dark,
    Light,
    Neutral,
}

/// Classification plus display details
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseVerdict {
    pub classification: Classification,
    /// Majority share for GUILTY/INNOCENT
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent: Option<u32>,
    pub tier: BackgroundTier,
}

impl fmt::Display for CaseVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.classification, self.percent) {
            (Classification::Guilty, Some(p)) => write!(f, "GUILTY ({}%)", p),
            (Classification::Innocent, Some(p)) => write!(f, "INNOCENT ({}%)", p),
            (Classification::NoVerdict, _) => write!(f, "No verdicts yet"),
            _ => write!(f, "UNDECIDED"),
        }
    }
}

/// Validated input for a new case
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseDraft {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub anonymous: bool,
}

impl CaseDraft {
    /// Trim fields and enforce presence and length limits
    pub fn validate(self) -> Result<Self> {
        let title = self.title.trim();
        let description = self.description.trim();

        if title.is_empty() || description.is_empty() {
            return Err(TribunalError::Validation(
                "Title and description are required".into(),
            ));
        }
        if title.chars().count() > TITLE_MAX_CHARS {
            return Err(TribunalError::Validation(format!(
                "Title must be {} characters or less",
                TITLE_MAX_CHARS
            )));
        }
        if description.chars().count() > DESCRIPTION_MAX_CHARS {
            return Err(TribunalError::Validation(format!(
                "Description must be {} characters or less",
                DESCRIPTION_MAX_CHARS
            )));
        }

        Ok(Self {
            title: title.to_string(),
            description: description.to_string(),
            anonymous: self.anonymous,
        })
    }
}

/// A submitted case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Case {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Empty in public views of anonymous cases
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub author_id: String,
    pub author_display_name: String,
    pub is_anonymous: bool,
    pub created_at: DateTime<Utc>,
    pub is_verified: bool,
    pub guilty_count: u32,
    pub innocent_count: u32,
    pub total_votes: u32,
    pub popularity: u32,
}

impl Case {
    /// New unverified case with zero tallies
    pub fn new(
        id: String,
        author_id: &str,
        author_display_name: &str,
        draft: CaseDraft,
        created_at: DateTime<Utc>,
    ) -> Self {
        let author_display_name = if draft.anonymous {
            ANONYMOUS_AUTHOR.to_string()
        } else {
            author_display_name.to_string()
        };
        Self {
            id,
            title: draft.title,
            description: draft.description,
            author_id: author_id.to_string(),
            author_display_name,
            is_anonymous: draft.anonymous,
            created_at,
            is_verified: false,
            guilty_count: 0,
            innocent_count: 0,
            total_votes: 0,
            popularity: 0,
        }
    }

    pub fn tally(&self) -> Tally {
        Tally::new(self.guilty_count, self.innocent_count)
    }

    /// Apply one vote to every tally field
    pub fn record_verdict(&mut self, verdict: Verdict) {
        match verdict {
            Verdict::Guilty => self.guilty_count += 1,
            Verdict::Innocent => self.innocent_count += 1,
        }
        self.total_votes += 1;
        self.popularity += 1;
    }

    /// Replace every tally field with a recount
    pub fn set_tally(&mut self, tally: Tally) {
        self.guilty_count = tally.guilty;
        self.innocent_count = tally.innocent;
        self.total_votes = tally.total();
        self.popularity = tally.total();
    }

    /// `totalVotes = guilty + innocent` and `popularity = totalVotes`
    pub fn tally_consistent(&self) -> bool {
        self.total_votes == self.guilty_count + self.innocent_count
            && self.popularity == self.total_votes
    }

    pub fn verdict(&self) -> CaseVerdict {
        self.tally().verdict()
    }
}

/// Listing order for cases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaseOrder {
    /// Popularity descending, ties by most recent
    #[default]
    Popularity,
    Created(Recency),
}

impl CaseOrder {
    pub fn compare(&self, a: &Case, b: &Case) -> Ordering {
        let by_created = b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id));
        match self {
            CaseOrder::Popularity => b.popularity.cmp(&a.popularity).then(by_created),
            CaseOrder::Created(Recency::NewestFirst) => by_created,
            CaseOrder::Created(Recency::OldestFirst) => a
                .created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id)),
        }
    }

    pub fn sort(&self, cases: &mut [Case]) {
        cases.sort_by(|a, b| self.compare(a, b));
    }
}

/// Filter for case queries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaseQuery {
    pub verified: Option<bool>,
    pub author_id: Option<String>,
    pub order: CaseOrder,
}

impl CaseQuery {
    pub fn matches(&self, case: &Case) -> bool {
        self.verified.map_or(true, |v| case.is_verified == v)
            && self
                .author_id
                .as_deref()
                .map_or(true, |author| case.author_id == author)
    }
}
