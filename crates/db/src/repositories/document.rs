use sqlx::{sqlite::SqliteRow, Row};

use docket_core::domain::document::{Document, DocumentId};

use super::{DocumentRepository, RepositoryError};
use crate::DbPool;

pub struct SqlDocumentRepository {
    pool: DbPool,
}

impl SqlDocumentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl DocumentRepository for SqlDocumentRepository {
    async fn find_all(&self) -> Result<Vec<Document>, RepositoryError> {
        let rows = sqlx::query("SELECT id, matter_name, text FROM documents ORDER BY rowid ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(document_from_row).collect()
    }

    async fn save(&self, document: Document) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO documents (id, matter_name, text)
             VALUES (?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                matter_name = excluded.matter_name,
                text = excluded.text",
        )
        .bind(&document.id.0)
        .bind(&document.matter_name)
        .bind(&document.text)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn document_from_row(row: SqliteRow) -> Result<Document, RepositoryError> {
    Ok(Document {
        id: DocumentId(row.try_get("id")?),
        matter_name: row.try_get("matter_name")?,
        text: row.try_get("text")?,
    })
}
