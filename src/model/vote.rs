//! Vote record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::TribunalError;

/// A binary verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Guilty,
    Innocent,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Guilty => "guilty",
            Verdict::Innocent => "innocent",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verdict {
    type Err = TribunalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "guilty" => Ok(Verdict::Guilty),
            "innocent" => Ok(Verdict::Innocent),
            other => Err(TribunalError::Validation(format!(
                "Unknown verdict '{}', expected guilty or innocent",
                other
            ))),
        }
    }
}

/// Deterministic vote key: one vote per (case, identity)
pub fn vote_key(case_id: &str, identity_id: &str) -> String {
    format!("{}_{}", case_id, identity_id)
}

/// An immutable vote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    /// `{caseId}_{identityId}`
    pub id: String,
    pub case_id: String,
    pub identity_id: String,
    pub verdict: Verdict,
    pub created_at: DateTime<Utc>,
}

impl Vote {
    pub fn new(case_id: &str, identity_id: &str, verdict: Verdict, created_at: DateTime<Utc>) -> Self {
        Self {
            id: vote_key(case_id, identity_id),
            case_id: case_id.to_string(),
            identity_id: identity_id.to_string(),
            verdict,
            created_at,
        }
    }
}

/// Filter for vote queries; results are newest first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoteQuery {
    pub case_id: Option<String>,
    pub identity_id: Option<String>,
}

impl VoteQuery {
    pub fn by_case(case_id: &str) -> Self {
        Self {
            case_id: Some(case_id.to_string()),
            identity_id: None,
        }
    }

    pub fn by_identity(identity_id: &str) -> Self {
        Self {
            case_id: None,
            identity_id: Some(identity_id.to_string()),
        }
    }

    pub fn matches(&self, vote: &Vote) -> bool {
        self.case_id.as_deref().map_or(true, |c| vote.case_id == c)
            && self
                .identity_id
                .as_deref()
                .map_or(true, |i| vote.identity_id == i)
    }
}
