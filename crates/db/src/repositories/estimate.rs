use chrono::{DateTime, SubsecRound, Utc};
use sqlx::{sqlite::SqliteRow, Row};
use uuid::Uuid;

use docket_core::domain::entry::{AccountId, EntryId, TransactionType};
use docket_core::domain::estimate::{Estimate, EstimateId, EstimateWithEntries, NewEstimate};

use super::entry::{entry_from_row, ENTRY_COLUMNS};
use super::{format_timestamp, parse_timestamp, EstimateRepository, RepositoryError};
use crate::DbPool;

const SLOTS: [(&str, &str); 3] = [("lo", "low_"), ("md", "medium_"), ("hi", "high_")];

pub struct SqlEstimateRepository {
    pool: DbPool,
}

impl SqlEstimateRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl EstimateRepository for SqlEstimateRepository {
    async fn create(&self, record: NewEstimate) -> Result<Estimate, RepositoryError> {
        let estimate = Estimate::from_new(
            EstimateId(format!("EST-{}", Uuid::new_v4().simple())),
            record,
            Utc::now().trunc_subsecs(6),
        );

        sqlx::query(
            "INSERT INTO estimates (
                id,
                estimate_type,
                low_estimate_id,
                medium_estimate_id,
                high_estimate_id,
                average,
                created_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&estimate.id.0)
        .bind(estimate.estimate_type.as_str())
        .bind(&estimate.low_estimate_id.0)
        .bind(&estimate.medium_estimate_id.0)
        .bind(&estimate.high_estimate_id.0)
        .bind(estimate.average)
        .bind(format_timestamp(estimate.created_at))
        .execute(&self.pool)
        .await?;

        Ok(estimate)
    }

    async fn list_since(
        &self,
        since: DateTime<Utc>,
        account_id: &AccountId,
    ) -> Result<Vec<EstimateWithEntries>, RepositoryError> {
        let sql = list_since_sql();
        let rows = sqlx::query(&sql)
            .bind(format_timestamp(since))
            .bind(&account_id.0)
            .bind(&account_id.0)
            .bind(&account_id.0)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(estimate_from_row).collect()
    }
}

fn list_since_sql() -> String {
    let entry_columns: Vec<String> = SLOTS
        .iter()
        .flat_map(|(alias, prefix)| {
            ENTRY_COLUMNS.iter().map(move |column| format!("{alias}.{column} AS {prefix}{column}"))
        })
        .collect();

    format!(
        "SELECT
            e.id,
            e.estimate_type,
            e.low_estimate_id,
            e.medium_estimate_id,
            e.high_estimate_id,
            e.average,
            e.created_at,
            {}
         FROM estimates e
         JOIN entries lo ON lo.id = e.low_estimate_id
         JOIN entries md ON md.id = e.medium_estimate_id
         JOIN entries hi ON hi.id = e.high_estimate_id
         WHERE e.created_at >= ?
           AND lo.account_id = ?
           AND md.account_id = ?
           AND hi.account_id = ?
         ORDER BY e.created_at ASC, e.id ASC",
        entry_columns.join(",\n            ")
    )
}

fn estimate_from_row(row: &SqliteRow) -> Result<EstimateWithEntries, RepositoryError> {
    let type_raw = row.try_get::<String, _>("estimate_type")?;
    let estimate_type = TransactionType::parse(&type_raw)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown estimate type `{type_raw}`")))?;

    Ok(EstimateWithEntries {
        estimate: Estimate {
            id: EstimateId(row.try_get("id")?),
            estimate_type,
            low_estimate_id: EntryId(row.try_get("low_estimate_id")?),
            medium_estimate_id: EntryId(row.try_get("medium_estimate_id")?),
            high_estimate_id: EntryId(row.try_get("high_estimate_id")?),
            average: row.try_get("average")?,
            created_at: parse_timestamp("created_at", row.try_get("created_at")?)?,
        },
        low_estimate: entry_from_row(row, "low_")?,
        medium_estimate: entry_from_row(row, "medium_")?,
        high_estimate: entry_from_row(row, "high_")?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, Utc};

    use docket_core::domain::entry::{AccountId, Entry, EntryId, TransactionType};
    use docket_core::domain::estimate::NewEstimate;

    use super::SqlEstimateRepository;
    use crate::repositories::{EntryRepository, EstimateRepository, SqlEntryRepository};
    use crate::{connect_with_settings, migrations, DbPool};

    async fn setup_pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    fn parse_ts(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value).expect("valid rfc3339").with_timezone(&Utc)
    }

    fn expense(id: &str, account: &str, cents: i64) -> Entry {
        Entry {
            id: EntryId(id.to_string()),
            matter_name: "Smith".to_string(),
            transaction_type: TransactionType::Expense,
            time_spent: None,
            price: Some(cents),
            account_id: AccountId(account.to_string()),
            created_at: parse_ts("2026-01-05T08:00:00Z"),
        }
    }

    fn record(low: &str, medium: &str, high: &str) -> NewEstimate {
        NewEstimate {
            estimate_type: TransactionType::Expense,
            low_estimate_id: EntryId(low.to_string()),
            medium_estimate_id: EntryId(medium.to_string()),
            high_estimate_id: EntryId(high.to_string()),
            average: 200.0,
        }
    }

    async fn seed_entries(pool: &DbPool) {
        let entries = SqlEntryRepository::new(pool.clone());
        for value in [
            expense("a1", "acct-1", 100),
            expense("a2", "acct-1", 200),
            expense("a3", "acct-1", 300),
            expense("b1", "acct-2", 999),
        ] {
            entries.save(value).await.expect("save entry");
        }
    }

    #[tokio::test]
    async fn created_estimates_are_listed_with_their_entries() {
        let pool = setup_pool().await;
        seed_entries(&pool).await;
        let repo = SqlEstimateRepository::new(pool.clone());

        let created = repo.create(record("a1", "a2", "a3")).await.expect("create");
        let listed = repo
            .list_since(created.created_at - Duration::minutes(1), &AccountId("acct-1".into()))
            .await
            .expect("list");

        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].estimate, created);
        assert_eq!(listed[0].low_estimate.id.0, "a1");
        assert_eq!(listed[0].medium_estimate.price, Some(200));
        assert_eq!(listed[0].high_estimate.id.0, "a3");
        assert_eq!(listed[0].amount_cents(), 600);

        pool.close().await;
    }

    #[tokio::test]
    async fn estimates_touching_another_account_are_excluded() {
        let pool = setup_pool().await;
        seed_entries(&pool).await;
        let repo = SqlEstimateRepository::new(pool.clone());

        let created = repo.create(record("a1", "a2", "b1")).await.expect("create");
        let since = created.created_at - Duration::minutes(1);

        let for_first = repo.list_since(since, &AccountId("acct-1".into())).await.expect("list");
        let for_second = repo.list_since(since, &AccountId("acct-2".into())).await.expect("list");

        assert!(for_first.is_empty());
        assert!(for_second.is_empty());

        pool.close().await;
    }

    #[tokio::test]
    async fn window_lower_bound_is_inclusive_of_later_records_only() {
        let pool = setup_pool().await;
        seed_entries(&pool).await;
        let repo = SqlEstimateRepository::new(pool.clone());

        let created = repo.create(record("a1", "a2", "a3")).await.expect("create");
        let account = AccountId("acct-1".into());

        let at_creation = repo.list_since(created.created_at, &account).await.expect("list");
        let after = repo
            .list_since(created.created_at + Duration::seconds(1), &account)
            .await
            .expect("list");

        assert_eq!(at_creation.len(), 1);
        assert!(after.is_empty());

        pool.close().await;
    }

    #[tokio::test]
    async fn unknown_entry_references_are_rejected_by_foreign_keys() {
        let pool = setup_pool().await;
        let repo = SqlEstimateRepository::new(pool.clone());

        let result = repo.create(record("missing", "missing", "missing")).await;
        assert!(result.is_err());

        pool.close().await;
    }
}
