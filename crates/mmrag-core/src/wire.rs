//! JSON bodies exchanged with the RAG backend.
//!
//! `POST /query` takes a [`QueryRequest`] and answers with a [`QueryAnswer`];
//! `POST /index_new_documents` takes an [`IndexRequest`] and answers with an
//! [`IndexSummary`]. Non-2xx responses carry an [`ErrorBody`].

use serde::{Deserialize, Deserializer, Serialize};

/// Body of `POST /query`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

/// Successful body of `POST /query`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryAnswer {
    /// Generated answer (Markdown, may contain math notation).
    pub response: String,
    /// Retrieved image URLs, in backend order. Absent and `null` both mean none.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub images: Vec<String>,
    /// URL of the document the answer was grounded on.
    #[serde(default)]
    pub retrieved_document: Option<String>,
}

/// Body of `POST /index_new_documents`. The backend ignores the content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRequest {
    pub query: String,
}

impl IndexRequest {
    /// Text sent with every indexing request.
    pub const PLACEHOLDER: &'static str = "index new documents";

    #[must_use]
    pub fn placeholder() -> Self {
        Self {
            query: Self::PLACEHOLDER.to_string(),
        }
    }
}

/// Successful body of `POST /index_new_documents`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSummary {
    /// Per-document summary, keyed by document name. Shape is backend-defined.
    pub document_summary_dict: serde_json::Map<String, serde_json::Value>,
}

/// Failure body of both endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}
