//! # mmrag-client
//!
//! HTTP client for the RAG backend.
//!
//! Two authorized endpoints, both JSON over HTTP(S):
//! - `POST {base_url}/query` answers a free-text question
//! - `POST {index_url}` indexes newly uploaded documents
//!
//! [`RagBackend`] is the seam the session layer depends on; [`HttpBackend`]
//! implements it with `reqwest`.

mod error;
mod http;

pub use error::ClientError;

use std::time::Duration;

use async_trait::async_trait;
use mmrag_config::ApiConfig;
use mmrag_core::{Credential, IndexRequest, IndexSummary, QueryAnswer, QueryRequest};

// ── Trait ──────────────────────────────────────────────────────────

/// Authorized calls to the RAG backend.
#[async_trait]
pub trait RagBackend: Send + Sync {
    /// Ask a question.
    async fn query(&self, credential: &Credential, query: &str)
    -> Result<QueryAnswer, ClientError>;

    /// Ask the backend to index newly uploaded documents.
    async fn index_new_documents(&self, credential: &Credential)
    -> Result<IndexSummary, ClientError>;
}

// ── Client ─────────────────────────────────────────────────────────

/// [`RagBackend`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    http: reqwest::Client,
    query_url: String,
    index_url: String,
}

impl HttpBackend {
    /// Build a client for the endpoints in `config`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Transport` if the underlying `reqwest::Client`
    /// fails to build.
    pub fn new(config: &ApiConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("mmrag/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            query_url: config.query_url(),
            index_url: config.index_url(),
        })
    }

    #[must_use]
    pub fn query_url(&self) -> &str {
        &self.query_url
    }

    #[must_use]
    pub fn index_url(&self) -> &str {
        &self.index_url
    }
}

#[async_trait]
impl RagBackend for HttpBackend {
    async fn query(
        &self,
        credential: &Credential,
        query: &str,
    ) -> Result<QueryAnswer, ClientError> {
        tracing::debug!(url = %self.query_url, "POST query");
        let resp = self
            .http
            .post(&self.query_url)
            .bearer_auth(&credential.access_token)
            .json(&QueryRequest {
                query: query.to_string(),
            })
            .send()
            .await?;
        let answer: QueryAnswer = http::check_response(resp).await?.json().await?;
        tracing::debug!(
            images = answer.images.len(),
            has_document = answer.retrieved_document.is_some(),
            "query answered"
        );
        Ok(answer)
    }

    async fn index_new_documents(
        &self,
        credential: &Credential,
    ) -> Result<IndexSummary, ClientError> {
        tracing::debug!(url = %self.index_url, "POST index_new_documents");
        let resp = self
            .http
            .post(&self.index_url)
            .bearer_auth(&credential.access_token)
            .json(&IndexRequest::placeholder())
            .send()
            .await?;
        let summary: IndexSummary = http::check_response(resp).await?.json().await?;
        tracing::debug!(documents = summary.document_summary_dict.len(), "indexing finished");
        Ok(summary)
    }
}
