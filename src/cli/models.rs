use serde::Serialize;
use crate::extract::Document;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Failed,
}

/// What a successful run prints: the extracted document plus run metadata.
#[derive(Debug, Serialize)]
pub struct ExtractionResult {
    #[serde(flatten)]
    pub document: Document,
    pub status: Status,
    pub original_url: String,
}

#[derive(Debug, Serialize)]
pub struct ArgumentError {
    pub error: String,
    pub status: Status,
}
