pub mod auth;
pub mod calendar;
pub mod config;
pub mod domain;
pub mod duration;
pub mod errors;
pub mod estimate;
pub mod similarity;
pub mod statistics;

pub use auth::{TokenAuthority, TokenError};
pub use calendar::{Dated, MonthBuckets, MonthKey, MonthSeries, OutOfWindowPolicy};
pub use domain::document::{Document, DocumentId};
pub use domain::entry::{AccountId, Entry, EntryFilter, EntryId, TransactionType};
pub use domain::estimate::{
    Estimate, EstimateId, EstimateWithEntries, NewEstimate, ThreePointEstimate,
};
pub use domain::external::{ExternalClient, ExternalEntry, ExternalMatter};
pub use domain::statistics::{DataSource, StatisticsOptions, StatisticsResult};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use estimate::{EstimateCalculation, EstimateCalculator};
pub use similarity::{SimilarityRanker, SimilarityResult, Tokenizer};
pub use statistics::{StatisticsAggregator, StatisticsSnapshot};
