//! Builds the statistics payload from records fetched for one account.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::calendar::{Dated, MonthBuckets, OutOfWindowPolicy};
use crate::domain::entry::Entry;
use crate::domain::estimate::EstimateWithEntries;
use crate::domain::external::ExternalMatter;
use crate::domain::statistics::{DataSource, StatisticsOptions, StatisticsResult};
use crate::errors::DomainError;

/// An own-data matter, dated by its earliest entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatterFirstSeen {
    pub matter_name: String,
    pub created_at: DateTime<Utc>,
}

impl Dated for MatterFirstSeen {
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[derive(Clone, Debug, PartialEq)]
enum MatterActivity {
    External(ExternalMatter),
    Own(MatterFirstSeen),
}

impl Dated for MatterActivity {
    fn created_at(&self) -> DateTime<Utc> {
        match self {
            Self::External(matter) => matter.created_at,
            Self::Own(matter) => matter.created_at,
        }
    }
}

/// Everything one statistics request reads from the data store.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatisticsSnapshot {
    /// Estimates created inside the day window.
    pub recent_estimates: Vec<EstimateWithEntries>,
    /// Estimates created inside the month window.
    pub window_estimates: Vec<EstimateWithEntries>,
    /// All of the account's own entries.
    pub own_entries: Vec<Entry>,
    /// External matters created inside the month window.
    pub external_matters: Vec<ExternalMatter>,
    pub external_matters_count: u64,
    pub external_entries_count: u64,
}

pub fn total_amount_cents(estimates: &[EstimateWithEntries]) -> i64 {
    estimates.iter().map(EstimateWithEntries::amount_cents).sum()
}

/// Non-empty matter names in first-seen order.
pub fn distinct_matter_names(entries: &[Entry]) -> Vec<String> {
    matters_first_seen(entries).into_iter().map(|matter| matter.matter_name).collect()
}

pub fn matters_first_seen(entries: &[Entry]) -> Vec<MatterFirstSeen> {
    let mut order: Vec<MatterFirstSeen> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for entry in entries.iter().filter(|entry| !entry.matter_name.is_empty()) {
        match positions.get(entry.matter_name.as_str()) {
            Some(&index) => {
                if entry.created_at < order[index].created_at {
                    order[index].created_at = entry.created_at;
                }
            }
            None => {
                positions.insert(entry.matter_name.as_str(), order.len());
                order.push(MatterFirstSeen {
                    matter_name: entry.matter_name.clone(),
                    created_at: entry.created_at,
                });
            }
        }
    }

    order
}

#[derive(Clone, Copy, Debug, Default)]
pub struct StatisticsAggregator {
    policy: OutOfWindowPolicy,
}

impl StatisticsAggregator {
    pub fn new(policy: OutOfWindowPolicy) -> Self {
        Self { policy }
    }

    pub fn aggregate(
        &self,
        snapshot: StatisticsSnapshot,
        options: &StatisticsOptions,
        now: DateTime<Utc>,
    ) -> Result<StatisticsResult, DomainError> {
        let StatisticsSnapshot {
            recent_estimates,
            window_estimates,
            own_entries,
            external_matters,
            external_matters_count,
            external_entries_count,
        } = snapshot;

        let own_matters = matters_first_seen(&own_entries);
        let own_matters_count = own_matters.len() as u64;
        let own_entries_count = own_entries.len() as u64;

        let estimate_buckets =
            MonthBuckets::collect(window_estimates, options.months_count, now, self.policy)?;

        let activity: Vec<MatterActivity> = match &options.data_source {
            DataSource::External => {
                external_matters.into_iter().map(MatterActivity::External).collect()
            }
            DataSource::Own => own_matters.into_iter().map(MatterActivity::Own).collect(),
            DataSource::Both => external_matters
                .into_iter()
                .map(MatterActivity::External)
                .chain(own_matters.into_iter().map(MatterActivity::Own))
                .collect(),
            DataSource::Unrecognized(_) => Vec::new(),
        };
        let matter_buckets =
            MonthBuckets::collect(activity, options.months_count, now, self.policy)?;

        Ok(StatisticsResult {
            estimates_count: recent_estimates.len(),
            total_amount_cents: total_amount_cents(&recent_estimates),
            matters_count: options.data_source.select(external_matters_count, own_matters_count),
            entries_count: options.data_source.select(external_entries_count, own_entries_count),
            estimates_count_by_month: estimate_buckets.counts(),
            amount_cents_by_month: estimate_buckets.sums(EstimateWithEntries::amount_cents),
            matters_count_by_month: matter_buckets.counts(),
        })
    }
}
