use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::{Client, Collection, bson::doc};

use crate::models::{FileRecord, NoteDocument};

use super::{
    DATABASE_NAME, FILES_COLLECTION, NOTE_SLOT, NOTES_COLLECTION, Repository, StoreError,
};

/// MongoDB backend. The driver's `Client` pools connections internally, so a
/// single instance serves every request.
pub struct MongoRepository {
    client: Client,
    files: Collection<FileRecord>,
    notes: Collection<NoteDocument>,
}

impl MongoRepository {
    pub async fn new(uri: &str) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(uri).await?;
        let database = client.database(DATABASE_NAME);

        // The driver connects lazily; fail at startup rather than on the first request.
        database.run_command(doc! { "ping": 1 }).await?;
        tracing::info!("Connected to MongoDB database '{}'", DATABASE_NAME);

        Ok(Self {
            files: database.collection(FILES_COLLECTION),
            notes: database.collection(NOTES_COLLECTION),
            client,
        })
    }
}

#[async_trait]
impl Repository for MongoRepository {
    fn backend(&self) -> &'static str {
        "mongodb"
    }

    async fn get_all_files(&self) -> Result<Vec<FileRecord>, StoreError> {
        let cursor = self.files.find(doc! {}).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn create_files(&self, files: &[FileRecord]) -> Result<(), StoreError> {
        let result = self.files.insert_many(files).await?;
        tracing::debug!("Inserted {} file records", result.inserted_ids.len());
        Ok(())
    }

    async fn get_note(&self) -> Result<Option<NoteDocument>, StoreError> {
        Ok(self.notes.find_one(doc! { "_id": NOTE_SLOT }).await?)
    }

    async fn upsert_note(&self, note: &NoteDocument) -> Result<(), StoreError> {
        self.notes
            .replace_one(doc! { "_id": NOTE_SLOT }, note)
            .upsert(true)
            .await?;
        Ok(())
    }

    async fn close(&self) {
        self.client.clone().shutdown().await;
        tracing::info!("MongoDB client shut down");
    }
}
