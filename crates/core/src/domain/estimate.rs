use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entry::{Entry, EntryId, TransactionType};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EstimateId(pub String);

/// Estimate record awaiting persistence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEstimate {
    pub estimate_type: TransactionType,
    pub low_estimate_id: EntryId,
    pub medium_estimate_id: EntryId,
    pub high_estimate_id: EntryId,
    pub average: f64,
}

/// Persisted estimate. Immutable once written; the referenced entries are
/// only borrowed by id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Estimate {
    pub id: EstimateId,
    pub estimate_type: TransactionType,
    pub low_estimate_id: EntryId,
    pub medium_estimate_id: EntryId,
    pub high_estimate_id: EntryId,
    pub average: f64,
    pub created_at: DateTime<Utc>,
}

impl Estimate {
    pub fn from_new(id: EstimateId, record: NewEstimate, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            estimate_type: record.estimate_type,
            low_estimate_id: record.low_estimate_id,
            medium_estimate_id: record.medium_estimate_id,
            high_estimate_id: record.high_estimate_id,
            average: record.average,
            created_at,
        }
    }
}

/// Estimate joined with the three entries it references.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateWithEntries {
    pub estimate: Estimate,
    pub low_estimate: Entry,
    pub medium_estimate: Entry,
    pub high_estimate: Entry,
}

impl EstimateWithEntries {
    /// Sum of the referenced entries' prices. TIME estimates contribute
    /// whatever price their entries carry.
    pub fn amount_cents(&self) -> i64 {
        [&self.low_estimate, &self.medium_estimate, &self.high_estimate]
            .iter()
            .map(|entry| entry.price.unwrap_or(0))
            .sum()
    }
}

/// Low/medium/high selection handed back to callers.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreePointEstimate {
    pub low_estimate: Option<Entry>,
    pub medium_estimate: Option<Entry>,
    pub high_estimate: Option<Entry>,
    pub average: Option<f64>,
}

impl ThreePointEstimate {
    pub fn is_empty(&self) -> bool {
        self.low_estimate.is_none()
            && self.medium_estimate.is_none()
            && self.high_estimate.is_none()
    }
}
