use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::models::{FileRecord, NoteDocument};

use super::{Repository, StoreError};

/// Process-local store. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryRepository {
    files: RwLock<Vec<FileRecord>>,
    note: RwLock<Option<NoteDocument>>,
}

#[async_trait]
impl Repository for MemoryRepository {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn get_all_files(&self) -> Result<Vec<FileRecord>, StoreError> {
        Ok(self.files.read().await.clone())
    }

    async fn create_files(&self, files: &[FileRecord]) -> Result<(), StoreError> {
        self.files.write().await.extend_from_slice(files);
        Ok(())
    }

    async fn get_note(&self) -> Result<Option<NoteDocument>, StoreError> {
        Ok(self.note.read().await.clone())
    }

    async fn upsert_note(&self, note: &NoteDocument) -> Result<(), StoreError> {
        *self.note.write().await = Some(note.clone());
        Ok(())
    }
}
