use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FileResponse {
    /// Original file name
    pub name: String,
    /// Server-assigned ISO-8601 timestamp
    pub timestamp: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateFileRequest {
    /// Original file name, only the name is stored
    pub name: Option<String>,
}

/// Body of `POST /files`: one entry or a batch of entries.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(untagged, try_from = "Value")]
pub enum AppendFilesRequest {
    Single(CreateFileRequest),
    Batch(Vec<CreateFileRequest>),
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(untagged)]
pub enum AppendFilesResponse {
    Single(FileResponse),
    Batch(Vec<FileResponse>),
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct NoteResponse {
    /// Note content
    pub note: String,
    /// Server-assigned ISO-8601 timestamp
    pub timestamp: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SaveNoteRequest {
    /// Note content
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

impl CreateFileRequest {
    fn from_entry(entry: Value) -> Result<Self, String> {
        if !entry.is_object() {
            return Err("Each file entry must be an object with a name".to_string());
        }
        serde_json::from_value(entry).map_err(|e| format!("Invalid file entry: {e}"))
    }
}

// Dispatch on the JSON shape by hand: a derived untagged enum would also
// accept a struct written as a sequence, e.g. `["x"]`.
impl TryFrom<Value> for AppendFilesRequest {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Array(entries) => entries
                .into_iter()
                .map(CreateFileRequest::from_entry)
                .collect::<Result<Vec<_>, _>>()
                .map(Self::Batch),
            entry @ Value::Object(_) => CreateFileRequest::from_entry(entry).map(Self::Single),
            _ => Err("Expected a file object or an array of file objects".to_string()),
        }
    }
}
