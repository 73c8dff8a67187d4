use chrono::Utc;

use std::sync::Arc;

use crate::{
    dto::{
        AppendFilesRequest, AppendFilesResponse, CreateFileRequest, FileResponse,
        MessageResponse, NoteResponse, SaveNoteRequest,
    },
    models::{FileRecord, NoteDocument},
    repository::{Repository, StoreError},
};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Clone)]
pub struct CapsuleService {
    repo: Arc<dyn Repository>,
}

impl From<FileRecord> for FileResponse {
    fn from(record: FileRecord) -> Self {
        Self {
            name: record.name,
            timestamp: record.timestamp,
        }
    }
}

impl From<NoteDocument> for NoteResponse {
    fn from(note: NoteDocument) -> Self {
        Self {
            note: note.note,
            timestamp: note.timestamp,
        }
    }
}

fn required(value: Option<String>, message: &str) -> Result<String, ServiceError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ServiceError::Validation(message.to_string()))
}

fn file_name(request: CreateFileRequest) -> Result<String, ServiceError> {
    required(request.name, "File name is required")
}

impl CapsuleService {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self { repo }
    }

    pub async fn get_all_files(&self) -> Result<Vec<FileResponse>, ServiceError> {
        let files = self.repo.get_all_files().await?;
        Ok(files.into_iter().map(FileResponse::from).collect())
    }

    /// Stamps and stores the entries. Every name is checked before anything
    /// is written, so an invalid batch leaves the collection untouched.
    pub async fn create_files(
        &self,
        request: AppendFilesRequest,
    ) -> Result<AppendFilesResponse, ServiceError> {
        match request {
            AppendFilesRequest::Single(entry) => {
                let record = FileRecord::new(file_name(entry)?, Utc::now());
                self.repo.create_files(std::slice::from_ref(&record)).await?;
                Ok(AppendFilesResponse::Single(record.into()))
            }
            AppendFilesRequest::Batch(entries) => {
                if entries.is_empty() {
                    return Err(ServiceError::Validation(
                        "At least one file is required".to_string(),
                    ));
                }

                let names = entries
                    .into_iter()
                    .map(file_name)
                    .collect::<Result<Vec<_>, _>>()?;
                let records: Vec<FileRecord> = names
                    .into_iter()
                    .map(|name| FileRecord::new(name, Utc::now()))
                    .collect();

                self.repo.create_files(&records).await?;
                Ok(AppendFilesResponse::Batch(
                    records.into_iter().map(FileResponse::from).collect(),
                ))
            }
        }
    }

    pub async fn get_note(&self) -> Result<Option<NoteResponse>, ServiceError> {
        Ok(self.repo.get_note().await?.map(NoteResponse::from))
    }

    pub async fn save_note(
        &self,
        request: SaveNoteRequest,
    ) -> Result<MessageResponse, ServiceError> {
        let note = NoteDocument::new(
            required(request.note, "Note content is required")?,
            Utc::now(),
        );
        self.repo.upsert_note(&note).await?;

        Ok(MessageResponse {
            message: "Note saved successfully".to_string(),
        })
    }
}
