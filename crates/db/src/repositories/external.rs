use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row};

use docket_core::domain::entry::AccountId;
use docket_core::domain::external::{ExternalClient, ExternalEntry, ExternalMatter};

use super::{
    format_timestamp, parse_count, parse_timestamp, ExternalRecordRepository, RepositoryError,
};
use crate::DbPool;

pub struct SqlExternalRecordRepository {
    pool: DbPool,
}

impl SqlExternalRecordRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ExternalRecordRepository for SqlExternalRecordRepository {
    async fn count_matters(&self, account_id: &AccountId) -> Result<u64, RepositoryError> {
        let count = sqlx::query(
            "SELECT COUNT(*) AS count
             FROM external_matters m
             JOIN external_clients c ON c.id = m.client_id
             WHERE c.account_id = ?",
        )
        .bind(&account_id.0)
        .fetch_one(&self.pool)
        .await?
        .try_get::<i64, _>("count")?;

        parse_count("count", count)
    }

    async fn count_entries(&self, account_id: &AccountId) -> Result<u64, RepositoryError> {
        let count = sqlx::query(
            "SELECT COUNT(*) AS count
             FROM external_entries en
             JOIN external_matters m ON m.id = en.matter_id
             JOIN external_clients c ON c.id = m.client_id
             WHERE c.account_id = ?",
        )
        .bind(&account_id.0)
        .fetch_one(&self.pool)
        .await?
        .try_get::<i64, _>("count")?;

        parse_count("count", count)
    }

    async fn list_matters_since(
        &self,
        account_id: &AccountId,
        since: DateTime<Utc>,
    ) -> Result<Vec<ExternalMatter>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT m.id, m.client_id, m.created_at
             FROM external_matters m
             JOIN external_clients c ON c.id = m.client_id
             WHERE c.account_id = ? AND m.created_at >= ?
             ORDER BY m.created_at ASC, m.id ASC",
        )
        .bind(&account_id.0)
        .bind(format_timestamp(since))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(matter_from_row).collect()
    }

    async fn save_client(&self, client: ExternalClient) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO external_clients (id, account_id, name)
             VALUES (?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                account_id = excluded.account_id,
                name = excluded.name",
        )
        .bind(&client.id)
        .bind(&client.account_id.0)
        .bind(&client.name)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn save_matter(&self, matter: ExternalMatter) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO external_matters (id, client_id, created_at)
             VALUES (?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                client_id = excluded.client_id,
                created_at = excluded.created_at",
        )
        .bind(&matter.id)
        .bind(&matter.client_id)
        .bind(format_timestamp(matter.created_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn save_entry(&self, entry: ExternalEntry) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO external_entries (id, matter_id, created_at)
             VALUES (?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                matter_id = excluded.matter_id,
                created_at = excluded.created_at",
        )
        .bind(&entry.id)
        .bind(&entry.matter_id)
        .bind(format_timestamp(entry.created_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn matter_from_row(row: SqliteRow) -> Result<ExternalMatter, RepositoryError> {
    Ok(ExternalMatter {
        id: row.try_get("id")?,
        client_id: row.try_get("client_id")?,
        created_at: parse_timestamp("created_at", row.try_get("created_at")?)?,
    })
}
