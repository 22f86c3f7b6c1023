//! Three-point estimate derivation from historical entries.
//!
//! Entries of the requested type are reduced to a mean and a sample standard
//! deviation. The targets `mean - sd/2`, `mean` and `mean + sd/2` are then
//! matched to the closest literal entries in a single pass, keeping the
//! earliest entry on ties.

use crate::domain::entry::{Entry, TransactionType};
use crate::domain::estimate::{NewEstimate, ThreePointEstimate};
use crate::duration::parse_minutes;

/// Maps an entry to the number the statistics run over.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueExtractor {
    /// Parsed `time_spent`, in minutes.
    Minutes,
    /// `price`, in cents.
    PriceCents,
}

impl ValueExtractor {
    pub fn for_type(transaction_type: TransactionType) -> Self {
        match transaction_type {
            TransactionType::Time => Self::Minutes,
            TransactionType::Expense => Self::PriceCents,
        }
    }

    pub fn value(&self, entry: &Entry) -> f64 {
        match self {
            Self::Minutes => entry.time_spent.as_deref().map(parse_minutes).unwrap_or(0.0),
            Self::PriceCents => entry.price.unwrap_or(0) as f64,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Dispersion {
    pub mean: f64,
    /// Sample standard deviation; absent for a single entry.
    pub deviation: Option<f64>,
}

impl Dispersion {
    pub fn of(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let count = values.len() as f64;
        let mean = values.iter().sum::<f64>() / count;
        let deviation = (values.len() > 1).then(|| {
            let squared: f64 = values.iter().map(|value| (value - mean).powi(2)).sum();
            (squared / (count - 1.0)).sqrt()
        });
        Some(Self { mean, deviation })
    }

    pub fn targets(&self) -> Targets {
        let half = self.deviation.unwrap_or(0.0) / 2.0;
        Targets { low: self.mean - half, medium: self.mean, high: self.mean + half }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Targets {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EstimateCalculation {
    pub estimate: ThreePointEstimate,
    pub dispersion: Option<Dispersion>,
    /// Record to persist. Only produced when the deviation is defined.
    pub record: Option<NewEstimate>,
}

impl EstimateCalculation {
    fn empty() -> Self {
        Self { estimate: ThreePointEstimate::default(), dispersion: None, record: None }
    }
}

#[derive(Clone, Copy, Debug)]
struct Closest<'a> {
    entry: &'a Entry,
    value: f64,
    distance: f64,
}

impl<'a> Closest<'a> {
    fn offer(&mut self, entry: &'a Entry, value: f64, target: f64) {
        let distance = (value - target).abs();
        if distance < self.distance {
            *self = Self { entry, value, distance };
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct EstimateCalculator;

impl EstimateCalculator {
    pub fn new() -> Self {
        Self
    }

    /// `entries` may mix transaction types; only those of
    /// `transaction_type` are considered.
    pub fn calculate(
        &self,
        transaction_type: TransactionType,
        entries: &[Entry],
    ) -> EstimateCalculation {
        let extractor = ValueExtractor::for_type(transaction_type);
        let candidates: Vec<(&Entry, f64)> = entries
            .iter()
            .filter(|entry| entry.transaction_type == transaction_type)
            .map(|entry| (entry, extractor.value(entry)))
            .collect();

        let Some(&(first, first_value)) = candidates.first() else {
            return EstimateCalculation::empty();
        };
        let values: Vec<f64> = candidates.iter().map(|(_, value)| *value).collect();
        let Some(dispersion) = Dispersion::of(&values) else {
            return EstimateCalculation::empty();
        };

        let targets = dispersion.targets();
        let seed = |target: f64| Closest {
            entry: first,
            value: first_value,
            distance: (first_value - target).abs(),
        };
        let mut low = seed(targets.low);
        let mut medium = seed(targets.medium);
        let mut high = seed(targets.high);

        for &(entry, value) in &candidates {
            low.offer(entry, value, targets.low);
            medium.offer(entry, value, targets.medium);
            high.offer(entry, value, targets.high);
        }

        let average = (low.value + medium.value + high.value) / 3.0;
        let record = dispersion.deviation.map(|_| NewEstimate {
            estimate_type: transaction_type,
            low_estimate_id: low.entry.id.clone(),
            medium_estimate_id: medium.entry.id.clone(),
            high_estimate_id: high.entry.id.clone(),
            average,
        });

        EstimateCalculation {
            estimate: ThreePointEstimate {
                low_estimate: Some(low.entry.clone()),
                medium_estimate: Some(medium.entry.clone()),
                high_estimate: Some(high.entry.clone()),
                average: Some(average),
            },
            dispersion: Some(dispersion),
            record,
        }
    }
}
