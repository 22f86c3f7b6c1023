use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;

use docket_core::domain::document::Document;
use docket_core::domain::entry::{AccountId, Entry, EntryFilter};
use docket_core::domain::estimate::{Estimate, EstimateWithEntries, NewEstimate};
use docket_core::domain::external::{ExternalClient, ExternalEntry, ExternalMatter};

pub mod document;
pub mod entry;
pub mod estimate;
pub mod external;
pub mod memory;

pub use document::SqlDocumentRepository;
pub use entry::SqlEntryRepository;
pub use estimate::SqlEstimateRepository;
pub use external::SqlExternalRecordRepository;
pub use memory::{
    InMemoryDocumentRepository, InMemoryEntryRepository, InMemoryEstimateRepository,
    InMemoryExternalRecordRepository,
};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// All documents in insertion order.
    async fn find_all(&self) -> Result<Vec<Document>, RepositoryError>;
    async fn save(&self, document: Document) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait EntryRepository: Send + Sync {
    /// Entries matching `filter`, in insertion order. An empty matter-name
    /// list matches nothing.
    async fn find(&self, filter: &EntryFilter) -> Result<Vec<Entry>, RepositoryError>;
    async fn save(&self, entry: Entry) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait EstimateRepository: Send + Sync {
    async fn create(&self, record: NewEstimate) -> Result<Estimate, RepositoryError>;

    /// Estimates created at or after `since` whose three entries all belong
    /// to `account_id`, oldest first.
    async fn list_since(
        &self,
        since: DateTime<Utc>,
        account_id: &AccountId,
    ) -> Result<Vec<EstimateWithEntries>, RepositoryError>;
}

/// Records synced from the external billing source. Ownership is resolved
/// through the client's account.
#[async_trait]
pub trait ExternalRecordRepository: Send + Sync {
    async fn count_matters(&self, account_id: &AccountId) -> Result<u64, RepositoryError>;
    async fn count_entries(&self, account_id: &AccountId) -> Result<u64, RepositoryError>;

    async fn list_matters_since(
        &self,
        account_id: &AccountId,
        since: DateTime<Utc>,
    ) -> Result<Vec<ExternalMatter>, RepositoryError>;

    async fn save_client(&self, client: ExternalClient) -> Result<(), RepositoryError>;
    async fn save_matter(&self, matter: ExternalMatter) -> Result<(), RepositoryError>;
    async fn save_entry(&self, entry: ExternalEntry) -> Result<(), RepositoryError>;
}

/// Fixed-width UTC form, so text ordering in SQL matches time ordering.
pub(crate) fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(
    column: &str,
    value: String,
) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(&value).map(|timestamp| timestamp.with_timezone(&Utc)).map_err(
        |error| {
            RepositoryError::Decode(format!("invalid timestamp in `{column}`: `{value}` ({error})"))
        },
    )
}

pub(crate) fn parse_count(column: &str, value: i64) -> Result<u64, RepositoryError> {
    u64::try_from(value).map_err(|_| {
        RepositoryError::Decode(format!("invalid value for `{column}` (expected count): {value}"))
    })
}
