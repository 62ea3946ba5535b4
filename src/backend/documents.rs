use async_trait::async_trait;
use sqlx::FromRow;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};
use uuid::Uuid;

use super::types::{Document, DocumentStore, Filter, Subscription};
use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::utils::time::current_timestamp_millis;

#[derive(Debug, FromRow)]
struct DocumentRow {
    id: String,
    data: String,
}

impl TryFrom<DocumentRow> for Document {
    type Error = AppError;

    fn try_from(row: DocumentRow) -> Result<Self, Self::Error> {
        Ok(Document {
            id: row.id,
            data: serde_json::from_str(&row.data)?,
        })
    }
}

/// Document store on top of the local SQLite database.
///
/// Every successful write bumps a revision counter; live queries wait on
/// that counter and re-run their query when it moves.
#[derive(Clone)]
pub struct SqlDocumentStore {
    db: Database,
    revision: Arc<watch::Sender<u64>>,
}

impl SqlDocumentStore {
    pub fn new(db: Database) -> Self {
        let (revision, _) = watch::channel(0);
        SqlDocumentStore {
            db,
            revision: Arc::new(revision),
        }
    }

    fn bump_revision(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }

    async fn fetch_collection(
        db: &Database,
        collection: &str,
        filter: &Filter,
    ) -> AppResult<Vec<Document>> {
        let rows = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT id, data
            FROM documents
            WHERE collection = ?
            ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .bind(collection)
        .fetch_all(db.pool())
        .await?;

        let mut documents = Vec::with_capacity(rows.len());
        for row in rows {
            let document = Document::try_from(row)?;
            if filter.matches(&document.data) {
                documents.push(document);
            }
        }
        Ok(documents)
    }
}

#[async_trait]
impl DocumentStore for SqlDocumentStore {
    async fn create(&self, collection: &str, data: serde_json::Value) -> AppResult<String> {
        let id = Uuid::new_v4().simple().to_string();
        let now = current_timestamp_millis();

        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, data, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(collection)
        .bind(&id)
        .bind(serde_json::to_string(&data)?)
        .bind(now)
        .bind(now)
        .execute(self.db.pool())
        .await?;

        debug!("Created document {}/{}", collection, id);
        self.bump_revision();
        Ok(id)
    }

    async fn set(&self, collection: &str, id: &str, data: serde_json::Value) -> AppResult<()> {
        let now = current_timestamp_millis();

        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, data, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (collection, id) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(serde_json::to_string(&data)?)
        .bind(now)
        .bind(now)
        .execute(self.db.pool())
        .await?;

        debug!("Set document {}/{}", collection, id);
        self.bump_revision();
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, data: serde_json::Value) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE documents
            SET data = ?, updated_at = ?
            WHERE collection = ? AND id = ?
            "#,
        )
        .bind(serde_json::to_string(&data)?)
        .bind(current_timestamp_millis())
        .bind(collection)
        .bind(id)
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("{}/{}", collection, id)));
        }

        debug!("Updated document {}/{}", collection, id);
        self.bump_revision();
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(id)
            .execute(self.db.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("{}/{}", collection, id)));
        }

        debug!("Deleted document {}/{}", collection, id);
        self.bump_revision();
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> AppResult<Option<Document>> {
        let row = sqlx::query_as::<_, DocumentRow>(
            "SELECT id, data FROM documents WHERE collection = ? AND id = ?",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        row.map(Document::try_from).transpose()
    }

    async fn query(&self, collection: &str, filter: &Filter) -> AppResult<Vec<Document>> {
        Self::fetch_collection(&self.db, collection, filter).await
    }

    async fn subscribe(&self, collection: &str, filter: Filter) -> AppResult<Subscription> {
        let (tx, rx) = mpsc::unbounded_channel();
        // Subscribe before the first query so no write can slip in between.
        let mut changes = self.revision.subscribe();
        let db = self.db.clone();
        let collection = collection.to_string();

        let listener = tokio::spawn(async move {
            loop {
                match Self::fetch_collection(&db, &collection, &filter).await {
                    Ok(documents) => {
                        if tx.send(documents).is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("Live query on {} failed: {}", collection, e),
                }

                if changes.changed().await.is_err() {
                    break;
                }
            }
            debug!("Listener on {} stopped", collection);
        });

        Ok(Subscription::new(rx, listener))
    }
}
