//! Text rendering of a [`SessionView`]: the terminal counterpart of the
//! single-page client.

use std::fmt::Write as _;

use mmrag_core::{IndexingPhase, QueryPhase};
use mmrag_session::{SessionView, format_elapsed};
use serde_json::Value;

pub const TITLE: &str = "Multi Modal RAG";
pub const SIGN_IN_AFFORDANCE: &str = "Sign in with `mmrag auth login`.";

/// The whole page for `view`. Pure: the same view always renders the same text.
#[must_use]
pub fn render(view: &SessionView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{TITLE}");
    let _ = writeln!(out, "{}", "=".repeat(TITLE.len()));

    match &view.account {
        Some(account) => {
            let _ = writeln!(out, "Signed in as {} ({})", account.label(), account.username);
        }
        None => {
            let _ = writeln!(out, "{SIGN_IN_AFFORDANCE}");
        }
    }
    out.push('\n');

    let query = view.query.query.as_deref().unwrap_or_default();
    if view.signed_in() {
        let _ = writeln!(out, "Enter your query: {query}");
    } else {
        let _ = writeln!(out, "Enter your query: {query} [disabled: sign in first]");
    }

    render_query(&mut out, view);

    if view.signed_in() {
        out.push('\n');
        render_indexing(&mut out, view);
    }

    out
}

/// The single live line shown while a request is loading, if any.
#[must_use]
pub fn loading_line(view: &SessionView) -> Option<String> {
    match view.query.phase {
        QueryPhase::AwaitingAnswer => Some(format!(
            "Generating response{} ({}s)",
            view.dots,
            format_elapsed(view.elapsed)
        )),
        QueryPhase::AwaitingImages => Some(format!("Loading images{}", view.dots)),
        QueryPhase::Idle | QueryPhase::Complete | QueryPhase::Failed => None,
    }
}

fn render_query(out: &mut String, view: &SessionView) {
    let state = &view.query;
    match state.phase {
        QueryPhase::Idle => return,
        QueryPhase::AwaitingAnswer | QueryPhase::AwaitingImages => {
            if let Some(line) = loading_line(view) {
                let _ = writeln!(out, "\n{line}");
            }
            return;
        }
        QueryPhase::Failed => {
            let failure = state.failure.as_deref().unwrap_or_default();
            let _ = writeln!(out, "\nRequest failed: {failure}");
            return;
        }
        QueryPhase::Complete => {}
    }

    if let Some(total) = state.total_seconds {
        let _ = writeln!(out, "\nTotal time: {total:.3}s");
    }
    let _ = writeln!(out, "\nResponse:\n{}", state.answer_text.as_deref().unwrap_or_default());

    if !state.image_references.is_empty() {
        out.push('\n');
        for (n, url) in state.image_references.iter().enumerate() {
            let _ = writeln!(out, "Retrieved image {n}: {url}");
        }
    }
    if let Some(document) = &state.document_reference {
        let _ = writeln!(out, "\nRetrieved document: {document}");
    }
}

fn render_indexing(out: &mut String, view: &SessionView) {
    let indexing = &view.indexing;
    match indexing.phase {
        IndexingPhase::Idle => {
            let _ = writeln!(out, "Index new documents with `mmrag index`.");
        }
        IndexingPhase::Running => {
            let _ = writeln!(out, "Indexing new documents...");
        }
        IndexingPhase::Failed => {
            let failure = indexing.failure.as_deref().unwrap_or_default();
            let _ = writeln!(out, "Indexing failed: {failure}");
        }
        IndexingPhase::Succeeded => {
            let _ = writeln!(out, "Indexing summary:");
            let summary = indexing.summary.iter().flatten();
            let mut any = false;
            for (document, detail) in summary {
                any = true;
                let _ = writeln!(out, "  {document}: {}", summary_cell(detail));
            }
            if !any {
                let _ = writeln!(out, "  (no new documents)");
            }
        }
    }
}

fn summary_cell(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use mmrag_core::{Account, IndexingPhase, QueryPhase};
    use mmrag_session::{IndexingState, QueryRequestState, SessionView};
    use pretty_assertions::assert_eq;
    use serde_json::{Map, json};

    use super::{SIGN_IN_AFFORDANCE, loading_line, render};

    fn account() -> Account {
        Account {
            home_account_id: "oid.tid".into(),
            username: "ada@contoso.com".into(),
            name: Some("Ada Lovelace".into()),
            tenant_id: "tid".into(),
        }
    }

    fn view(account: Option<Account>, query: QueryRequestState) -> SessionView {
        SessionView {
            account,
            query,
            indexing: IndexingState::default(),
            dots: String::new(),
            elapsed: Duration::ZERO,
        }
    }

    fn loading(phase: QueryPhase, dots: &str, elapsed: Duration) -> SessionView {
        let mut view = view(
            Some(account()),
            QueryRequestState {
                phase,
                generation: 1,
                query: Some("what is in figure 3?".into()),
                ..QueryRequestState::default()
            },
        );
        view.dots = dots.into();
        view.elapsed = elapsed;
        view
    }

    #[test]
    fn signed_out_shows_affordance_and_disabled_form() {
        let page = render(&view(None, QueryRequestState::default()));

        assert!(page.starts_with("Multi Modal RAG\n"));
        assert!(page.contains(SIGN_IN_AFFORDANCE));
        assert!(page.contains("[disabled: sign in first]"));
        assert!(!page.contains("mmrag index"));
    }

    #[test]
    fn signed_in_shows_account_and_indexing_controls() {
        let page = render(&view(Some(account()), QueryRequestState::default()));

        assert!(page.contains("Signed in as Ada Lovelace (ada@contoso.com)"));
        assert!(!page.contains(SIGN_IN_AFFORDANCE));
        assert!(!page.contains("disabled"));
        assert!(page.contains("Index new documents with `mmrag index`."));
    }

    #[test]
    fn awaiting_answer_shows_only_the_generating_banner() {
        let page = render(&loading(
            QueryPhase::AwaitingAnswer,
            "..",
            Duration::from_millis(1_234),
        ));

        assert!(page.contains("Generating response.. (1.234s)"));
        assert!(!page.contains("Loading images"));
        assert!(!page.contains("Response:"));
        assert!(!page.contains("Total time"));
    }

    #[test]
    fn awaiting_images_shows_only_the_images_banner() {
        let page = render(&loading(QueryPhase::AwaitingImages, ".", Duration::ZERO));

        assert!(page.contains("Loading images."));
        assert!(!page.contains("Generating response"));
        assert!(!page.contains("Response:"));
    }

    #[test]
    fn loading_line_only_while_loading() {
        assert_eq!(
            loading_line(&loading(QueryPhase::AwaitingAnswer, "...", Duration::from_millis(50)))
                .as_deref(),
            Some("Generating response... (0.050s)")
        );
        assert_eq!(
            loading_line(&view(Some(account()), QueryRequestState::default())),
            None
        );
    }

    #[test]
    fn complete_shows_answer_images_document_and_total_time() {
        let page = render(&view(
            Some(account()),
            QueryRequestState {
                phase: QueryPhase::Complete,
                generation: 1,
                query: Some("q".into()),
                answer_text: Some("**Figure 3** shows a cat.".into()),
                image_references: vec!["https://x/a.png".into(), "https://x/b.png".into()],
                document_reference: Some("https://x/doc.pdf".into()),
                elapsed_millis: 2_000,
                total_seconds: Some(2.0),
                ..QueryRequestState::default()
            },
        ));

        assert!(page.contains("Total time: 2.000s"));
        assert!(page.contains("Response:\n**Figure 3** shows a cat.\n"));
        assert!(page.contains("Retrieved image 0: https://x/a.png"));
        assert!(page.contains("Retrieved image 1: https://x/b.png"));
        assert!(page.contains("Retrieved document: https://x/doc.pdf"));
        assert!(!page.contains("Generating response"));
    }

    #[test]
    fn failed_keeps_the_failure_inline_without_total_time() {
        let page = render(&view(
            Some(account()),
            QueryRequestState {
                phase: QueryPhase::Failed,
                generation: 1,
                query: Some("q".into()),
                failure: Some("Error: Index not ready".into()),
                ..QueryRequestState::default()
            },
        ));

        assert!(page.contains("Request failed: Error: Index not ready"));
        assert!(!page.contains("Total time"));
        assert!(!page.contains("Response:"));
    }

    #[test]
    fn indexing_summary_lists_documents() {
        let mut summary = Map::new();
        summary.insert("a.pdf".into(), json!("3 pages, 2 images"));
        summary.insert("b.pdf".into(), json!({"pages": 1}));
        let mut page_view = view(Some(account()), QueryRequestState::default());
        page_view.indexing = IndexingState {
            phase: IndexingPhase::Succeeded,
            summary: Some(summary),
            failure: None,
        };

        let page = render(&page_view);
        assert!(page.contains("Indexing summary:\n  a.pdf: 3 pages, 2 images\n  b.pdf: {\"pages\":1}\n"));
    }

    #[test]
    fn indexing_failure_is_shown() {
        let mut page_view = view(Some(account()), QueryRequestState::default());
        page_view.indexing = IndexingState {
            phase: IndexingPhase::Failed,
            summary: None,
            failure: Some("Error: Storage unavailable".into()),
        };

        assert!(render(&page_view).contains("Indexing failed: Error: Storage unavailable"));
    }

    #[test]
    fn render_is_idempotent() {
        let page_view = loading(QueryPhase::AwaitingAnswer, "..", Duration::from_millis(10));
        assert_eq!(render(&page_view), render(&page_view));
    }
}
