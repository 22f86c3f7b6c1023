use sqlx::{sqlite::SqliteRow, QueryBuilder, Row, Sqlite};

use docket_core::domain::entry::{AccountId, Entry, EntryFilter, EntryId, TransactionType};

use super::{format_timestamp, parse_timestamp, EntryRepository, RepositoryError};
use crate::DbPool;

pub(crate) const ENTRY_COLUMNS: &[&str] =
    &["id", "matter_name", "transaction_type", "time_spent", "price", "account_id", "created_at"];

pub struct SqlEntryRepository {
    pool: DbPool,
}

impl SqlEntryRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl EntryRepository for SqlEntryRepository {
    async fn find(&self, filter: &EntryFilter) -> Result<Vec<Entry>, RepositoryError> {
        if filter.matter_name_in.as_ref().is_some_and(|names| names.is_empty()) {
            return Ok(Vec::new());
        }

        let mut query_builder: QueryBuilder<'_, Sqlite> = QueryBuilder::new(format!(
            "SELECT {} FROM entries WHERE 1=1",
            ENTRY_COLUMNS.join(", ")
        ));

        if let Some(account_id) = &filter.account_id {
            query_builder.push(" AND account_id = ").push_bind(account_id.0.clone());
        }

        if let Some(names) = &filter.matter_name_in {
            query_builder.push(" AND matter_name IN (");
            let mut separated = query_builder.separated(", ");
            for name in names {
                separated.push_bind(name.clone());
            }
            separated.push_unseparated(")");
        }

        query_builder.push(" ORDER BY rowid ASC");

        let rows = query_builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(|row| entry_from_row(row, "")).collect()
    }

    async fn save(&self, entry: Entry) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO entries (
                id,
                matter_name,
                transaction_type,
                time_spent,
                price,
                account_id,
                created_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                matter_name = excluded.matter_name,
                transaction_type = excluded.transaction_type,
                time_spent = excluded.time_spent,
                price = excluded.price,
                account_id = excluded.account_id,
                created_at = excluded.created_at",
        )
        .bind(&entry.id.0)
        .bind(&entry.matter_name)
        .bind(entry.transaction_type.as_str())
        .bind(entry.time_spent.as_deref())
        .bind(entry.price)
        .bind(&entry.account_id.0)
        .bind(format_timestamp(entry.created_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// Decodes an entry whose columns carry `prefix`, e.g. `low_id` for `low_`.
pub(crate) fn entry_from_row(row: &SqliteRow, prefix: &str) -> Result<Entry, RepositoryError> {
    let column = |name: &str| format!("{prefix}{name}");

    let type_raw = row.try_get::<String, _>(column("transaction_type").as_str())?;
    let transaction_type = TransactionType::parse(&type_raw).ok_or_else(|| {
        RepositoryError::Decode(format!("unknown transaction type `{type_raw}`"))
    })?;
    let created_at_column = column("created_at");

    Ok(Entry {
        id: EntryId(row.try_get(column("id").as_str())?),
        matter_name: row.try_get(column("matter_name").as_str())?,
        transaction_type,
        time_spent: row.try_get(column("time_spent").as_str())?,
        price: row.try_get(column("price").as_str())?,
        account_id: AccountId(row.try_get(column("account_id").as_str())?),
        created_at: parse_timestamp(
            &created_at_column,
            row.try_get(created_at_column.as_str())?,
        )?,
    })
}
