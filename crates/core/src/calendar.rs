//! Calendar windows and month bucketing for time-series statistics.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::domain::estimate::EstimateWithEntries;
use crate::domain::external::ExternalMatter;
use crate::errors::DomainError;

/// Three-letter month abbreviation, e.g. `Jan`.
pub const MONTH_LABEL_FORMAT: &str = "%b";

pub trait Dated {
    fn created_at(&self) -> DateTime<Utc>;
}

impl Dated for EstimateWithEntries {
    fn created_at(&self) -> DateTime<Utc> {
        self.estimate.created_at
    }
}

impl Dated for ExternalMatter {
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// What happens to an item dated outside the generated month window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutOfWindowPolicy {
    #[default]
    Drop,
    Reject,
}

impl FromStr for OutOfWindowPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "drop" => Ok(Self::Drop),
            "reject" => Ok(Self::Reject),
            other => {
                Err(format!("unsupported out-of-window policy `{other}` (expected drop|reject)"))
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn of(timestamp: DateTime<Utc>) -> Self {
        Self { year: timestamp.year(), month: timestamp.month() }
    }

    pub fn months_back(self, count: u32) -> Self {
        let index = self.index() - i64::from(count);
        Self::from_index(index)
    }

    pub fn next(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    pub fn first_day(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    pub fn start(self) -> DateTime<Utc> {
        self.first_day()
            .map(|day| day.and_time(NaiveTime::MIN).and_utc())
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    pub fn label(self) -> String {
        self.first_day().map(|day| day.format(MONTH_LABEL_FORMAT).to_string()).unwrap_or_default()
    }

    fn index(self) -> i64 {
        i64::from(self.year) * 12 + i64::from(self.month) - 1
    }

    fn from_index(index: i64) -> Self {
        let year = index.div_euclid(12) as i32;
        let month = index.rem_euclid(12) as u32 + 1;
        Self { year, month }
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Months from `months_count - 1` months before `now` through `now`'s month.
/// A zero count still covers the current month.
pub fn month_keys(now: DateTime<Utc>, months_count: u32) -> Vec<MonthKey> {
    let current = MonthKey::of(now);
    let mut key = current.months_back(months_count.saturating_sub(1));
    let mut keys = Vec::new();
    while key <= current {
        keys.push(key);
        key = key.next();
    }
    keys
}

pub fn month_window_start(now: DateTime<Utc>, months_count: u32) -> DateTime<Utc> {
    MonthKey::of(now).months_back(months_count.saturating_sub(1)).start()
}

/// Start of the day `days_count - 1` days before `now`.
pub fn day_window_start(now: DateTime<Utc>, days_count: u32) -> DateTime<Utc> {
    let back = Duration::days(i64::from(days_count.saturating_sub(1)));
    (now - back).date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// Ordered label -> value pairs. Serializes as a JSON object in month order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MonthSeries<V>(Vec<(String, V)>);

impl<V> MonthSeries<V> {
    pub fn labels(&self) -> Vec<&str> {
        self.0.iter().map(|(label, _)| label.as_str()).collect()
    }

    pub fn get(&self, label: &str) -> Option<&V> {
        self.0.iter().find(|(candidate, _)| candidate == label).map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.0.iter().map(|(label, value)| (label.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<V: Serialize> Serialize for MonthSeries<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (label, value) in &self.0 {
            map.serialize_entry(label, value)?;
        }
        map.end()
    }
}

/// Items grouped by calendar month. Every month of the window is present,
/// empty months included.
#[derive(Clone, Debug, PartialEq)]
pub struct MonthBuckets<T> {
    buckets: Vec<(MonthKey, Vec<T>)>,
}

impl<T: Dated> MonthBuckets<T> {
    pub fn collect(
        items: impl IntoIterator<Item = T>,
        months_count: u32,
        now: DateTime<Utc>,
        policy: OutOfWindowPolicy,
    ) -> Result<Self, DomainError> {
        let mut buckets: Vec<(MonthKey, Vec<T>)> =
            month_keys(now, months_count).into_iter().map(|key| (key, Vec::new())).collect();

        for item in items {
            let created_at = item.created_at();
            let key = MonthKey::of(created_at);
            match buckets.iter().position(|(candidate, _)| *candidate == key) {
                Some(index) => buckets[index].1.push(item),
                None if policy == OutOfWindowPolicy::Reject => {
                    let label = |bucket: Option<&(MonthKey, Vec<T>)>| {
                        bucket.map(|(key, _)| key.label()).unwrap_or_default()
                    };
                    return Err(DomainError::OutOfWindow {
                        created_at,
                        first_label: label(buckets.first()),
                        last_label: label(buckets.last()),
                    });
                }
                None => {}
            }
        }

        Ok(Self { buckets })
    }
}

impl<T> MonthBuckets<T> {
    pub fn labels(&self) -> Vec<String> {
        self.buckets.iter().map(|(key, _)| key.label()).collect()
    }

    pub fn get(&self, key: MonthKey) -> Option<&[T]> {
        self.buckets
            .iter()
            .find(|(candidate, _)| *candidate == key)
            .map(|(_, items)| items.as_slice())
    }

    pub fn counts(&self) -> MonthSeries<usize> {
        MonthSeries(self.buckets.iter().map(|(key, items)| (key.label(), items.len())).collect())
    }

    pub fn sums(&self, value: impl Fn(&T) -> i64) -> MonthSeries<i64> {
        MonthSeries(
            self.buckets
                .iter()
                .map(|(key, items)| (key.label(), items.iter().map(&value).sum()))
                .collect(),
        )
    }

    pub fn into_items(self) -> Vec<T> {
        self.buckets.into_iter().flat_map(|(_, items)| items).collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};

    use super::{
        day_window_start, month_keys, month_window_start, Dated, MonthBuckets, MonthKey,
        OutOfWindowPolicy,
    };
    use crate::errors::DomainError;

    #[derive(Clone, Debug, PartialEq)]
    struct Item {
        name: &'static str,
        at: DateTime<Utc>,
        cents: i64,
    }

    impl Dated for Item {
        fn created_at(&self) -> DateTime<Utc> {
            self.at
        }
    }

    fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).single().expect("valid timestamp")
    }

    fn item(name: &'static str, at: DateTime<Utc>, cents: i64) -> Item {
        Item { name, at, cents }
    }

    #[test]
    fn three_month_window_has_ordered_labels_including_empty_months() {
        let now = at(2024, 3, 15);
        let buckets = MonthBuckets::collect(
            vec![item("a", at(2024, 3, 1), 100)],
            3,
            now,
            OutOfWindowPolicy::Drop,
        )
        .expect("bucketing");

        assert_eq!(buckets.labels(), vec!["Jan", "Feb", "Mar"]);
        let counts = buckets.counts();
        assert_eq!(counts.get("Jan"), Some(&0));
        assert_eq!(counts.get("Feb"), Some(&0));
        assert_eq!(counts.get("Mar"), Some(&1));
    }

    #[test]
    fn window_crosses_year_boundary() {
        let keys = month_keys(at(2024, 2, 10), 4);
        let labels: Vec<String> = keys.iter().map(|key| key.label()).collect();

        assert_eq!(labels, vec!["Nov", "Dec", "Jan", "Feb"]);
        assert_eq!(keys[0], MonthKey { year: 2023, month: 11 });
        assert_eq!(
            month_window_start(at(2024, 2, 10), 4),
            Utc.with_ymd_and_hms(2023, 11, 1, 0, 0, 0).single().expect("valid timestamp")
        );
    }

    #[test]
    fn zero_months_still_covers_current_month() {
        assert_eq!(month_keys(at(2024, 6, 30), 0), vec![MonthKey { year: 2024, month: 6 }]);
    }

    #[test]
    fn flattening_buckets_recovers_in_window_items() {
        let now = at(2024, 6, 20);
        let items = vec![
            item("a", at(2024, 4, 2), 10),
            item("b", at(2024, 6, 1), 20),
            item("c", at(2024, 4, 28), 30),
            item("d", at(2024, 5, 5), 40),
        ];

        let buckets = MonthBuckets::collect(items, 3, now, OutOfWindowPolicy::Drop)
            .expect("bucketing");
        let mut names: Vec<&str> = buckets.into_items().iter().map(|item| item.name).collect();
        names.sort_unstable();

        assert_eq!(names, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn sums_aggregate_per_month() {
        let now = at(2024, 6, 20);
        let buckets = MonthBuckets::collect(
            vec![item("a", at(2024, 5, 2), 10), item("b", at(2024, 5, 9), 25)],
            2,
            now,
            OutOfWindowPolicy::Drop,
        )
        .expect("bucketing");

        let sums = buckets.sums(|item| item.cents);
        assert_eq!(sums.get("May"), Some(&35));
        assert_eq!(sums.get("Jun"), Some(&0));
    }

    #[test]
    fn out_of_window_items_are_dropped_by_default() {
        let now = at(2024, 6, 20);
        let buckets = MonthBuckets::collect(
            vec![item("old", at(2023, 6, 20), 10), item("new", at(2024, 6, 1), 10)],
            2,
            now,
            OutOfWindowPolicy::default(),
        )
        .expect("bucketing");

        assert_eq!(buckets.counts().get("Jun"), Some(&1));
        assert_eq!(buckets.into_items().len(), 1);
    }

    #[test]
    fn out_of_window_items_can_be_rejected() {
        let now = at(2024, 6, 20);
        let error = MonthBuckets::collect(
            vec![item("old", at(2023, 6, 20), 10)],
            2,
            now,
            OutOfWindowPolicy::Reject,
        )
        .expect_err("old item should be rejected");

        assert!(matches!(
            error,
            DomainError::OutOfWindow { ref first_label, ref last_label, .. }
                if first_label == "May" && last_label == "Jun"
        ));
    }

    #[test]
    fn day_window_starts_at_midnight() {
        let now = at(2024, 3, 2);
        assert_eq!(
            day_window_start(now, 3),
            Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).single().expect("valid timestamp")
        );
        assert_eq!(
            day_window_start(now, 1),
            Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).single().expect("valid timestamp")
        );
    }

    #[test]
    fn month_series_serializes_in_month_order() {
        let buckets: MonthBuckets<Item> =
            MonthBuckets::collect(Vec::new(), 3, at(2024, 1, 5), OutOfWindowPolicy::Drop)
                .expect("bucketing");

        let json = serde_json::to_string(&buckets.counts()).expect("serialize");
        assert_eq!(json, r#"{"Nov":0,"Dec":0,"Jan":0}"#);
    }
}
