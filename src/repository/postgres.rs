use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio_postgres::{Client, NoTls};

use std::sync::Arc;

use crate::models::{FileRecord, NoteDocument};

use super::{
    FILES_COLLECTION, NOTE_SLOT, NOTES_COLLECTION, Repository, StoreError, embedded::migrations,
};

/// Document collections kept as JSONB rows in a single `documents` table.
pub struct PostgresRepository {
    database_dsn: String,
    client: RwLock<Arc<Client>>,
}

async fn open(database_dsn: &str) -> Result<Client, tokio_postgres::Error> {
    let (client, con) = tokio_postgres::connect(database_dsn, NoTls).await?;

    tokio::spawn(async move {
        if let Err(e) = con.await {
            tracing::error!("connection error: {}", e);
        }
    });

    Ok(client)
}

impl PostgresRepository {
    pub async fn new(database_dsn: String) -> Result<Self, StoreError> {
        let mut client = open(&database_dsn).await?;
        Self::migrate(&mut client).await?;

        Ok(Self {
            database_dsn,
            client: RwLock::new(Arc::new(client)),
        })
    }

    async fn migrate(client: &mut Client) -> Result<(), refinery::Error> {
        let migrations_report = migrations::runner().run_async(client).await?;

        for migration in migrations_report.applied_migrations() {
            tracing::info!(
                "Migration Applied -  Name: {}, Version: {}",
                migration.name(),
                migration.version()
            );
        }

        tracing::info!("Document table ready");

        Ok(())
    }

    /// Current client, reopened first if the connection task has ended.
    async fn client(&self) -> Result<Arc<Client>, StoreError> {
        let current = self.client.read().await.clone();
        if !current.is_closed() {
            return Ok(current);
        }

        let mut guard = self.client.write().await;
        if guard.is_closed() {
            tracing::warn!("postgres connection closed, reconnecting");
            *guard = Arc::new(open(&self.database_dsn).await?);
        }

        Ok(guard.clone())
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn get_all_files(&self) -> Result<Vec<FileRecord>, StoreError> {
        let rows = self
            .client()
            .await?
            .query(
                "SELECT body FROM documents WHERE collection = $1 ORDER BY id",
                &[&FILES_COLLECTION],
            )
            .await?;

        let mut vec: Vec<FileRecord> = Vec::new();

        for row in rows {
            vec.push(serde_json::from_value(row.get("body"))?);
        }

        Ok(vec)
    }

    async fn create_files(&self, files: &[FileRecord]) -> Result<(), StoreError> {
        let bodies = serde_json::to_value(files)?;

        // A single statement keeps the batch all-or-nothing.
        let inserted = self
            .client()
            .await?
            .execute(
                "INSERT INTO documents (collection, body) \
                 SELECT $1::text, elem \
                 FROM jsonb_array_elements($2::jsonb) WITH ORDINALITY AS batch(elem, ord) \
                 ORDER BY ord",
                &[&FILES_COLLECTION, &bodies],
            )
            .await?;

        tracing::debug!("Inserted {} file records", inserted);

        Ok(())
    }

    async fn get_note(&self) -> Result<Option<NoteDocument>, StoreError> {
        let row = self
            .client()
            .await?
            .query_opt(
                "SELECT body FROM documents WHERE collection = $1 AND slot = $2",
                &[&NOTES_COLLECTION, &NOTE_SLOT],
            )
            .await?;

        Ok(row
            .map(|row| serde_json::from_value(row.get("body")))
            .transpose()?)
    }

    async fn upsert_note(&self, note: &NoteDocument) -> Result<(), StoreError> {
        let body = serde_json::to_value(note)?;

        self.client()
            .await?
            .execute(
                "INSERT INTO documents (collection, slot, body) VALUES ($1, $2, $3) \
                 ON CONFLICT (collection, slot) DO UPDATE SET body = EXCLUDED.body",
                &[&NOTES_COLLECTION, &NOTE_SLOT, &body],
            )
            .await?;

        Ok(())
    }
}
