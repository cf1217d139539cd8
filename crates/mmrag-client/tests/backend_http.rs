//! `HttpBackend` against a `wiremock` RAG backend.

use chrono::Utc;
use mmrag_client::{ClientError, HttpBackend, RagBackend};
use mmrag_config::ApiConfig;
use mmrag_core::{Account, Credential};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn credential() -> Credential {
    Credential {
        access_token: "token-abc".into(),
        scopes: vec!["api://rag/access_as_user".into()],
        expires_at: Utc::now() + chrono::TimeDelta::hours(1),
        account: Account {
            home_account_id: "oid.tid".into(),
            username: "ada@contoso.com".into(),
            name: None,
            tenant_id: "tid".into(),
        },
    }
}

fn backend(server: &MockServer) -> HttpBackend {
    HttpBackend::new(&ApiConfig {
        base_url: server.uri(),
        ..Default::default()
    })
    .unwrap()
}

#[tokio::test]
async fn query_sends_bearer_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .and(header("authorization", "Bearer token-abc"))
        .and(body_json(json!({"query": "What is 2+2?"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "4",
            "images": ["https://img.example/1.png"],
            "retrieved_document": "https://docs.example/math.pdf",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let answer = backend(&server)
        .query(&credential(), "What is 2+2?")
        .await
        .unwrap();

    assert_eq!(answer.response, "4");
    assert_eq!(answer.images, vec!["https://img.example/1.png"]);
    assert_eq!(
        answer.retrieved_document.as_deref(),
        Some("https://docs.example/math.pdf")
    );
}

#[tokio::test]
async fn query_tolerates_null_images() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"response": "no pictures", "images": null})),
        )
        .mount(&server)
        .await;

    let answer = backend(&server).query(&credential(), "x").await.unwrap();
    assert!(answer.images.is_empty());
    assert!(answer.retrieved_document.is_none());
}

#[tokio::test]
async fn backend_detail_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "index unavailable"})))
        .mount(&server)
        .await;

    let err = backend(&server).query(&credential(), "x").await.unwrap_err();
    match err {
        ClientError::Backend { status, detail } => {
            assert_eq!(status, 500);
            assert_eq!(detail, "index unavailable");
        }
        other @ ClientError::Transport(_) => panic!("expected backend error, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_success_body_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy login</html>"))
        .mount(&server)
        .await;

    let err = backend(&server).query(&credential(), "x").await.unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)));
    assert_eq!(err.status(), None);
}

#[tokio::test]
async fn unreachable_backend_is_transport_error() {
    let backend = HttpBackend::new(&ApiConfig {
        base_url: "http://127.0.0.1:1".into(),
        timeout_secs: 5,
        ..Default::default()
    })
    .unwrap();

    let err = backend.query(&credential(), "x").await.unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)));
}

#[tokio::test]
async fn indexing_posts_placeholder_and_returns_summary() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/index_new_documents"))
        .and(header("authorization", "Bearer token-abc"))
        .and(body_json(json!({"query": "index new documents"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "document_summary_dict": {"a.pdf": {"chunks": 3}},
        })))
        .expect(1)
        .mount(&server)
        .await;

    let summary = backend(&server)
        .index_new_documents(&credential())
        .await
        .unwrap();
    assert_eq!(
        serde_json::Value::Object(summary.document_summary_dict),
        json!({"a.pdf": {"chunks": 3}})
    );
}

#[tokio::test]
async fn explicit_index_url_overrides_derived_one() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/admin/reindex"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"document_summary_dict": {}})))
        .expect(1)
        .mount(&server)
        .await;

    let backend = HttpBackend::new(&ApiConfig {
        base_url: "http://unused.invalid".into(),
        index_url: format!("{}/admin/reindex", server.uri()),
        ..Default::default()
    })
    .unwrap();
    assert_eq!(backend.query_url(), "http://unused.invalid/query");

    let summary = backend.index_new_documents(&credential()).await.unwrap();
    assert!(summary.document_summary_dict.is_empty());
}

#[tokio::test]
async fn indexing_error_without_json_uses_body_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden for this tenant"))
        .mount(&server)
        .await;

    let err = backend(&server)
        .index_new_documents(&credential())
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(403));
    assert!(err.to_string().contains("forbidden for this tenant"));
}
