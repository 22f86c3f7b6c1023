use serde::{Deserialize, Serialize};

use crate::calendar::MonthSeries;

pub const DEFAULT_DAYS_COUNT: u32 = 30;
pub const DEFAULT_MONTHS_COUNT: u32 = 6;
pub const MAX_MONTHS_COUNT: u32 = 12;

/// Which records feed matter and entry counts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DataSource {
    /// Records synced from the external billing system (`e_data`).
    External,
    /// The account's own entries (`own_data`).
    Own,
    /// Sum of both sources (`use_both`).
    #[default]
    Both,
    /// Any other wire value. Counts stay unset.
    Unrecognized(String),
}

impl DataSource {
    pub fn as_str(&self) -> &str {
        match self {
            Self::External => "e_data",
            Self::Own => "own_data",
            Self::Both => "use_both",
            Self::Unrecognized(value) => value.as_str(),
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }

    /// Picks the count for this source. `None` for unrecognized values.
    pub fn select(&self, external: u64, own: u64) -> Option<u64> {
        match self {
            Self::External => Some(external),
            Self::Own => Some(own),
            Self::Both => Some(external + own),
            Self::Unrecognized(_) => None,
        }
    }
}

impl From<&str> for DataSource {
    fn from(value: &str) -> Self {
        match value {
            "e_data" => Self::External,
            "own_data" => Self::Own,
            "use_both" => Self::Both,
            other => Self::Unrecognized(other.to_string()),
        }
    }
}

impl From<String> for DataSource {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<DataSource> for String {
    fn from(value: DataSource) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatisticsOptions {
    pub months_count: u32,
    pub days_count: u32,
    pub data_source: DataSource,
}

impl Default for StatisticsOptions {
    fn default() -> Self {
        Self {
            months_count: DEFAULT_MONTHS_COUNT,
            days_count: DEFAULT_DAYS_COUNT,
            data_source: DataSource::default(),
        }
    }
}

impl StatisticsOptions {
    /// Month labels repeat after a year, so the month window is capped at
    /// twelve buckets. Both windows cover at least the current period.
    pub fn normalized(self) -> Self {
        Self {
            months_count: self.months_count.clamp(1, MAX_MONTHS_COUNT),
            days_count: self.days_count.max(1),
            data_source: self.data_source,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsResult {
    pub estimates_count: usize,
    pub total_amount_cents: i64,
    pub matters_count: Option<u64>,
    pub entries_count: Option<u64>,
    pub estimates_count_by_month: MonthSeries<usize>,
    pub amount_cents_by_month: MonthSeries<i64>,
    pub matters_count_by_month: MonthSeries<usize>,
}
