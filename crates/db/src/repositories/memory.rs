use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use docket_core::domain::document::Document;
use docket_core::domain::entry::{AccountId, Entry, EntryFilter, EntryId};
use docket_core::domain::estimate::{Estimate, EstimateId, EstimateWithEntries, NewEstimate};
use docket_core::domain::external::{ExternalClient, ExternalEntry, ExternalMatter};

use super::{
    DocumentRepository, EntryRepository, EstimateRepository, ExternalRecordRepository,
    RepositoryError,
};

fn upsert<T>(items: &mut Vec<T>, item: T, same: impl Fn(&T, &T) -> bool) {
    match items.iter().position(|existing| same(existing, &item)) {
        Some(index) => items[index] = item,
        None => items.push(item),
    }
}

#[derive(Default)]
pub struct InMemoryDocumentRepository {
    documents: RwLock<Vec<Document>>,
}

#[async_trait::async_trait]
impl DocumentRepository for InMemoryDocumentRepository {
    async fn find_all(&self) -> Result<Vec<Document>, RepositoryError> {
        Ok(self.documents.read().await.clone())
    }

    async fn save(&self, document: Document) -> Result<(), RepositoryError> {
        let mut documents = self.documents.write().await;
        upsert(&mut documents, document, |left, right| left.id == right.id);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryEntryRepository {
    entries: RwLock<Vec<Entry>>,
}

impl InMemoryEntryRepository {
    async fn find_by_id(&self, id: &EntryId) -> Option<Entry> {
        self.entries.read().await.iter().find(|entry| &entry.id == id).cloned()
    }
}

#[async_trait::async_trait]
impl EntryRepository for InMemoryEntryRepository {
    async fn find(&self, filter: &EntryFilter) -> Result<Vec<Entry>, RepositoryError> {
        let entries = self.entries.read().await;
        Ok(entries.iter().filter(|entry| filter.matches(entry)).cloned().collect())
    }

    async fn save(&self, entry: Entry) -> Result<(), RepositoryError> {
        let mut entries = self.entries.write().await;
        upsert(&mut entries, entry, |left, right| left.id == right.id);
        Ok(())
    }
}

/// Resolves estimate entries through the shared entry repository, the way
/// the SQL repository joins them.
#[derive(Default)]
pub struct InMemoryEstimateRepository {
    entries: Arc<InMemoryEntryRepository>,
    estimates: RwLock<Vec<Estimate>>,
}

impl InMemoryEstimateRepository {
    pub fn new(entries: Arc<InMemoryEntryRepository>) -> Self {
        Self { entries, estimates: RwLock::new(Vec::new()) }
    }

    pub async fn all(&self) -> Vec<Estimate> {
        self.estimates.read().await.clone()
    }

    /// Stores an estimate with a caller-chosen timestamp.
    pub async fn insert(&self, estimate: Estimate) {
        let mut estimates = self.estimates.write().await;
        upsert(&mut estimates, estimate, |left, right| left.id == right.id);
    }

    async fn resolve(&self, id: &EntryId) -> Result<Entry, RepositoryError> {
        self.entries.find_by_id(id).await.ok_or_else(|| {
            RepositoryError::Decode(format!("estimate references unknown entry `{}`", id.0))
        })
    }
}

#[async_trait::async_trait]
impl EstimateRepository for InMemoryEstimateRepository {
    async fn create(&self, record: NewEstimate) -> Result<Estimate, RepositoryError> {
        for id in [&record.low_estimate_id, &record.medium_estimate_id, &record.high_estimate_id] {
            self.resolve(id).await?;
        }

        let estimate = Estimate::from_new(
            EstimateId(format!("EST-{}", Uuid::new_v4().simple())),
            record,
            Utc::now().trunc_subsecs(6),
        );
        self.estimates.write().await.push(estimate.clone());
        Ok(estimate)
    }

    async fn list_since(
        &self,
        since: DateTime<Utc>,
        account_id: &AccountId,
    ) -> Result<Vec<EstimateWithEntries>, RepositoryError> {
        let mut estimates: Vec<Estimate> = self
            .estimates
            .read()
            .await
            .iter()
            .filter(|estimate| estimate.created_at >= since)
            .cloned()
            .collect();
        estimates.sort_by(|left, right| {
            left.created_at.cmp(&right.created_at).then_with(|| left.id.0.cmp(&right.id.0))
        });

        let mut listed = Vec::with_capacity(estimates.len());
        for estimate in estimates {
            let low_estimate = self.resolve(&estimate.low_estimate_id).await?;
            let medium_estimate = self.resolve(&estimate.medium_estimate_id).await?;
            let high_estimate = self.resolve(&estimate.high_estimate_id).await?;
            let owned = [&low_estimate, &medium_estimate, &high_estimate]
                .iter()
                .all(|entry| &entry.account_id == account_id);
            if owned {
                listed.push(EstimateWithEntries {
                    estimate,
                    low_estimate,
                    medium_estimate,
                    high_estimate,
                });
            }
        }
        Ok(listed)
    }
}

#[derive(Default)]
pub struct InMemoryExternalRecordRepository {
    clients: RwLock<Vec<ExternalClient>>,
    matters: RwLock<Vec<ExternalMatter>>,
    entries: RwLock<Vec<ExternalEntry>>,
}

impl InMemoryExternalRecordRepository {
    async fn matter_ids(&self, account_id: &AccountId) -> Vec<String> {
        let clients = self.clients.read().await;
        let owned_clients: Vec<&str> = clients
            .iter()
            .filter(|client| &client.account_id == account_id)
            .map(|client| client.id.as_str())
            .collect();
        self.matters
            .read()
            .await
            .iter()
            .filter(|matter| owned_clients.contains(&matter.client_id.as_str()))
            .map(|matter| matter.id.clone())
            .collect()
    }
}

#[async_trait::async_trait]
impl ExternalRecordRepository for InMemoryExternalRecordRepository {
    async fn count_matters(&self, account_id: &AccountId) -> Result<u64, RepositoryError> {
        Ok(self.matter_ids(account_id).await.len() as u64)
    }

    async fn count_entries(&self, account_id: &AccountId) -> Result<u64, RepositoryError> {
        let matter_ids = self.matter_ids(account_id).await;
        let entries = self.entries.read().await;
        Ok(entries.iter().filter(|entry| matter_ids.contains(&entry.matter_id)).count() as u64)
    }

    async fn list_matters_since(
        &self,
        account_id: &AccountId,
        since: DateTime<Utc>,
    ) -> Result<Vec<ExternalMatter>, RepositoryError> {
        let matter_ids = self.matter_ids(account_id).await;
        let mut matters: Vec<ExternalMatter> = self
            .matters
            .read()
            .await
            .iter()
            .filter(|matter| matter_ids.contains(&matter.id) && matter.created_at >= since)
            .cloned()
            .collect();
        matters.sort_by(|left, right| {
            left.created_at.cmp(&right.created_at).then_with(|| left.id.cmp(&right.id))
        });
        Ok(matters)
    }

    async fn save_client(&self, client: ExternalClient) -> Result<(), RepositoryError> {
        let mut clients = self.clients.write().await;
        upsert(&mut clients, client, |left, right| left.id == right.id);
        Ok(())
    }

    async fn save_matter(&self, matter: ExternalMatter) -> Result<(), RepositoryError> {
        let mut matters = self.matters.write().await;
        upsert(&mut matters, matter, |left, right| left.id == right.id);
        Ok(())
    }

    async fn save_entry(&self, entry: ExternalEntry) -> Result<(), RepositoryError> {
        let mut entries = self.entries.write().await;
        upsert(&mut entries, entry, |left, right| left.id == right.id);
        Ok(())
    }
}
