use sqlx::Executor;

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

/// Seeded row ids per table.
const SEED_TABLES: &[SeedTableContract] = &[
    SeedTableContract {
        table: "documents",
        ids: &[
            "doc-demo-001",
            "doc-demo-002",
            "doc-demo-003",
            "doc-demo-004",
            "doc-demo-005",
            "doc-demo-006",
        ],
    },
    SeedTableContract {
        table: "entries",
        ids: &[
            "ent-demo-001",
            "ent-demo-002",
            "ent-demo-003",
            "ent-demo-004",
            "ent-demo-005",
            "ent-demo-006",
            "ent-demo-007",
            "ent-demo-008",
            "ent-demo-009",
            "ent-demo-010",
            "ent-demo-011",
            "ent-demo-012",
        ],
    },
    SeedTableContract {
        table: "external_clients",
        ids: &["ext-client-001", "ext-client-002", "ext-client-003"],
    },
    SeedTableContract {
        table: "external_matters",
        ids: &["ext-matter-001", "ext-matter-002", "ext-matter-003", "ext-matter-004"],
    },
    SeedTableContract {
        table: "external_entries",
        ids: &["ext-entry-001", "ext-entry-002", "ext-entry-003", "ext-entry-004", "ext-entry-005"],
    },
];

/// Deletion order respects foreign keys.
const CLEAN_ORDER: &[&str] =
    &["external_entries", "external_matters", "external_clients", "entries", "documents"];

/// Demo dataset covering:
/// 1. two accounts with entries across three matters and both transaction types
/// 2. similarity documents for every seeded matter
/// 3. external clients, matters and entries owned through those accounts
pub struct DemoSeedDataset;

impl DemoSeedDataset {
    pub const SQL: &str = include_str!("../../../config/fixtures/demo_seed_data.sql");

    /// Account that owns most of the seeded records.
    pub const PRIMARY_ACCOUNT_ID: &str = "acct-demo-001";

    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;

        tx.execute(sqlx::query(Self::SQL)).await?;
        tx.commit().await?;

        let tables_seeded = SEED_TABLES
            .iter()
            .map(|contract| TableSeedInfo { table: contract.table, rows: contract.ids.len() })
            .collect();

        Ok(SeedResult { tables_seeded })
    }

    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::with_capacity(SEED_TABLES.len());

        for contract in SEED_TABLES {
            let quoted_ids = sql_array_from_ids(contract.ids);
            let existing: i64 = sqlx::query_scalar(&format!(
                "SELECT COUNT(1) FROM {} WHERE id IN {quoted_ids}",
                contract.table
            ))
            .fetch_one(pool)
            .await?;
            checks.push((contract.table, existing == contract.ids.len() as i64));
        }

        let all_present = checks.iter().all(|(_, present)| *present);
        Ok(VerificationResult { all_present, checks })
    }

    /// Removes seeded rows. Estimates referencing seeded entries go first.
    pub async fn clean(pool: &DbPool) -> Result<(), RepositoryError> {
        let mut tx = pool.begin().await?;

        let entry_ids = SEED_TABLES
            .iter()
            .find(|contract| contract.table == "entries")
            .map(|contract| sql_array_from_ids(contract.ids))
            .unwrap_or_else(|| "('')".to_string());
        sqlx::query(&format!(
            "DELETE FROM estimates
             WHERE low_estimate_id IN {entry_ids}
                OR medium_estimate_id IN {entry_ids}
                OR high_estimate_id IN {entry_ids}"
        ))
        .execute(&mut *tx)
        .await?;

        for table in CLEAN_ORDER {
            let Some(contract) = SEED_TABLES.iter().find(|contract| contract.table == *table)
            else {
                continue;
            };
            let quoted_ids = sql_array_from_ids(contract.ids);
            sqlx::query(&format!("DELETE FROM {table} WHERE id IN {quoted_ids}"))
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct SeedTableContract {
    table: &'static str,
    ids: &'static [&'static str],
}

fn sql_array_from_ids(ids: &[&str]) -> String {
    let quoted = ids.iter().map(|id| format!("'{id}'")).collect::<Vec<_>>().join(",");
    format!("({quoted})")
}

#[derive(Debug)]
pub struct SeedResult {
    pub tables_seeded: Vec<TableSeedInfo>,
}

#[derive(Debug)]
pub struct TableSeedInfo {
    pub table: &'static str,
    pub rows: usize,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}

#[cfg(test)]
mod tests {
    use docket_core::domain::entry::{AccountId, EntryFilter};

    use super::*;
    use crate::repositories::{
        DocumentRepository, EntryRepository, ExternalRecordRepository, SqlDocumentRepository,
        SqlEntryRepository, SqlExternalRecordRepository,
    };
    use crate::{connect_with_settings, migrations};

    async fn seeded_pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30)
            .await
            .expect("connect to test database");
        migrations::run_pending(&pool).await.expect("run migrations");
        pool
    }

    #[test]
    fn sql_fixture_is_valid() {
        assert!(!DemoSeedDataset::SQL.is_empty());
        for contract in SEED_TABLES {
            for id in contract.ids {
                assert!(DemoSeedDataset::SQL.contains(id), "fixture should seed `{id}`");
            }
        }
    }

    #[tokio::test]
    async fn verify_seed_contract_and_idempotency() {
        let pool = seeded_pool().await;

        let first = DemoSeedDataset::load(&pool).await.expect("load seed fixtures");
        let first_verification =
            DemoSeedDataset::verify(&pool).await.expect("verify seed fixtures");
        assert!(first_verification.all_present);
        assert_eq!(first.tables_seeded.len(), SEED_TABLES.len());

        let second = DemoSeedDataset::load(&pool).await.expect("reload seed fixtures");
        let second_verification =
            DemoSeedDataset::verify(&pool).await.expect("re-verify seed fixtures");
        assert!(second_verification.all_present);
        assert_eq!(second.tables_seeded.len(), SEED_TABLES.len());
        assert_eq!(first_verification.checks, second_verification.checks);
    }

    #[tokio::test]
    async fn seeded_records_are_readable_through_repositories() {
        let pool = seeded_pool().await;
        DemoSeedDataset::load(&pool).await.expect("load seed fixtures");
        let account = AccountId(DemoSeedDataset::PRIMARY_ACCOUNT_ID.to_string());

        let documents = SqlDocumentRepository::new(pool.clone()).find_all().await.expect("docs");
        assert_eq!(documents.len(), 6);

        let entries = SqlEntryRepository::new(pool.clone())
            .find(&EntryFilter::for_account(account.clone()))
            .await
            .expect("entries");
        assert_eq!(entries.len(), 10);
        assert!(entries.iter().any(|entry| entry.price.is_none()));

        let external = SqlExternalRecordRepository::new(pool.clone());
        assert_eq!(external.count_matters(&account).await.expect("matters"), 3);
        assert_eq!(external.count_entries(&account).await.expect("entries"), 4);
    }

    #[tokio::test]
    async fn clean_removes_seeded_rows() {
        let pool = seeded_pool().await;
        DemoSeedDataset::load(&pool).await.expect("load seed fixtures");

        DemoSeedDataset::clean(&pool).await.expect("clean seed fixtures");

        let verification = DemoSeedDataset::verify(&pool).await.expect("verify after clean");
        assert!(!verification.all_present);
        assert!(verification.checks.iter().all(|(_, present)| !present));
    }
}
