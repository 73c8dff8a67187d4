mod embedded;
mod memory;
mod mongo;
mod postgres;

pub use memory::MemoryRepository;
pub use mongo::MongoRepository;
pub use postgres::PostgresRepository;

use async_trait::async_trait;

use std::sync::Arc;

use crate::models::{FileRecord, NoteDocument};

pub const DATABASE_NAME: &str = "timeCapsuleDB";
pub const FILES_COLLECTION: &str = "files";
pub const NOTES_COLLECTION: &str = "notes";

/// Well-known key of the singleton note inside the notes collection.
pub const NOTE_SLOT: &str = "current";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unsupported store scheme '{0}'")]
    UnsupportedScheme(String),

    #[error("mongodb error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("failed to migrate document table: {0}")]
    Migration(#[from] refinery::Error),

    #[error("malformed document: {0}")]
    Document(#[from] serde_json::Error),
}

/// Persistence seam shared by both resources. One instance is created at
/// startup and handed to every request.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Short backend name for logs.
    fn backend(&self) -> &'static str;

    /// All file records in insertion order.
    async fn get_all_files(&self) -> Result<Vec<FileRecord>, StoreError>;

    /// Persists the records in one store operation.
    async fn create_files(&self, files: &[FileRecord]) -> Result<(), StoreError>;

    async fn get_note(&self) -> Result<Option<NoteDocument>, StoreError>;

    /// Replaces the note under [`NOTE_SLOT`], inserting it when absent.
    async fn upsert_note(&self, note: &NoteDocument) -> Result<(), StoreError>;

    async fn close(&self) {}
}

/// Opens the store named by `uri`, picking the backend from its scheme.
pub async fn connect(uri: &str) -> Result<Arc<dyn Repository>, StoreError> {
    let scheme = uri.split_once("://").map_or("", |(scheme, _)| scheme);

    match scheme {
        "mongodb" | "mongodb+srv" => Ok(Arc::new(MongoRepository::new(uri).await?)),
        "postgres" | "postgresql" => {
            Ok(Arc::new(PostgresRepository::new(uri.to_string()).await?))
        }
        "memory" => Ok(Arc::new(MemoryRepository::default())),
        other => Err(StoreError::UnsupportedScheme(other.to_string())),
    }
}
