use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use docket_core::calendar::{day_window_start, month_window_start};
use docket_core::domain::estimate::{NewEstimate, ThreePointEstimate};
use docket_core::similarity::matter_names;
use docket_core::statistics::StatisticsSnapshot;
use docket_core::{
    AccountId, ApplicationError, Entry, EntryFilter, EstimateCalculator, SimilarityRanker,
    SimilarityResult, StatisticsAggregator, StatisticsOptions, StatisticsResult, TransactionType,
};
use docket_db::repositories::{
    DocumentRepository, EntryRepository, EstimateRepository, ExternalRecordRepository,
    RepositoryError, SqlDocumentRepository, SqlEntryRepository, SqlEstimateRepository,
    SqlExternalRecordRepository,
};
use docket_db::DbPool;

/// Data store seams used by [`EstimateService`].
#[derive(Clone)]
pub struct Repositories {
    pub documents: Arc<dyn DocumentRepository>,
    pub entries: Arc<dyn EntryRepository>,
    pub estimates: Arc<dyn EstimateRepository>,
    pub external: Arc<dyn ExternalRecordRepository>,
}

impl Repositories {
    pub fn sql(pool: DbPool) -> Self {
        Self {
            documents: Arc::new(SqlDocumentRepository::new(pool.clone())),
            entries: Arc::new(SqlEntryRepository::new(pool.clone())),
            estimates: Arc::new(SqlEstimateRepository::new(pool.clone())),
            external: Arc::new(SqlExternalRecordRepository::new(pool)),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Estimates {
    pub expense: ThreePointEstimate,
    pub time: ThreePointEstimate,
}

pub struct EstimateService {
    repositories: Repositories,
    ranker: SimilarityRanker,
    calculator: EstimateCalculator,
    aggregator: StatisticsAggregator,
}

impl EstimateService {
    pub fn new(
        repositories: Repositories,
        ranker: SimilarityRanker,
        aggregator: StatisticsAggregator,
    ) -> Self {
        Self { repositories, ranker, calculator: EstimateCalculator::new(), aggregator }
    }

    pub async fn rank_similar_documents(
        &self,
        text: &str,
        correlation_id: &str,
    ) -> Result<Vec<SimilarityResult>, ApplicationError> {
        let documents = self.repositories.documents.find_all().await.map_err(persistence)?;
        let corpus_size = documents.len();
        let ranked = self.ranker.rank(text, documents);

        info!(
            event_name = "estimate.ranking.completed",
            correlation_id = %correlation_id,
            corpus_size,
            kept = ranked.len(),
            "similar documents ranked"
        );
        Ok(ranked)
    }

    /// Account entries belonging to the matters of the top-ranked documents.
    pub async fn top_entries(
        &self,
        text: &str,
        account_id: &AccountId,
        correlation_id: &str,
    ) -> Result<Vec<Entry>, ApplicationError> {
        let ranked = self.rank_similar_documents(text, correlation_id).await?;
        let filter =
            EntryFilter::for_account(account_id.clone()).with_matter_names(matter_names(&ranked));
        self.repositories.entries.find(&filter).await.map_err(persistence)
    }

    /// Runs both calculations over the same entries. Records are written in
    /// the background and never delay or fail the response.
    pub async fn compute_estimates(
        &self,
        text: &str,
        account_id: &AccountId,
        correlation_id: &str,
    ) -> Result<Estimates, ApplicationError> {
        let entries = self.top_entries(text, account_id, correlation_id).await?;

        let expense = self.calculator.calculate(TransactionType::Expense, &entries);
        let time = self.calculator.calculate(TransactionType::Time, &entries);

        for record in [expense.record.clone(), time.record.clone()].into_iter().flatten() {
            self.persist(record, correlation_id);
        }

        Ok(Estimates { expense: expense.estimate, time: time.estimate })
    }

    fn persist(&self, record: NewEstimate, correlation_id: &str) {
        let estimates = Arc::clone(&self.repositories.estimates);
        let correlation_id = correlation_id.to_string();
        let estimate_type = record.estimate_type.as_str();

        tokio::spawn(async move {
            match estimates.create(record).await {
                Ok(estimate) => info!(
                    event_name = "estimate.calculation.persisted",
                    correlation_id = %correlation_id,
                    estimate_id = %estimate.id.0,
                    estimate_type,
                    "estimate persisted"
                ),
                Err(error) => warn!(
                    event_name = "estimate.calculation.persist_failed",
                    correlation_id = %correlation_id,
                    estimate_type,
                    error = %error,
                    "estimate could not be persisted"
                ),
            }
        });
    }

    pub async fn compute_statistics(
        &self,
        account_id: &AccountId,
        options: StatisticsOptions,
        now: DateTime<Utc>,
        correlation_id: &str,
    ) -> Result<StatisticsResult, ApplicationError> {
        let options = options.normalized();
        let day_start = day_window_start(now, options.days_count);
        let month_start = month_window_start(now, options.months_count);
        let own_filter = EntryFilter::for_account(account_id.clone());
        let Repositories { entries, estimates, external, .. } = &self.repositories;

        let fetched = tokio::try_join!(
            estimates.list_since(day_start, account_id),
            estimates.list_since(month_start, account_id),
            entries.find(&own_filter),
            external.list_matters_since(account_id, month_start),
            external.count_matters(account_id),
            external.count_entries(account_id),
        );
        let (
            recent_estimates,
            window_estimates,
            own_entries,
            external_matters,
            external_matters_count,
            external_entries_count,
        ) = fetched.map_err(|error| {
            error!(
                event_name = "estimate.statistics.failed",
                correlation_id = %correlation_id,
                error = %error,
                "statistics fetch failed"
            );
            ApplicationError::Upstream(error.to_string())
        })?;

        let snapshot = StatisticsSnapshot {
            recent_estimates,
            window_estimates,
            own_entries,
            external_matters,
            external_matters_count,
            external_entries_count,
        };
        Ok(self.aggregator.aggregate(snapshot, &options, now)?)
    }
}

fn persistence(error: RepositoryError) -> ApplicationError {
    ApplicationError::Persistence(error.to_string())
}
