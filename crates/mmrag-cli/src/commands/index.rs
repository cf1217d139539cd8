use serde::Serialize;
use serde_json::{Map, Value};

use crate::cli::{GlobalFlags, OutputFormat};
use crate::context::AppContext;
use crate::output::{notification_line, output};
use crate::progress::Progress;
use crate::view;

#[derive(Serialize)]
struct IndexResponse {
    document_summary_dict: Map<String, Value>,
}

/// Handle `mmrag index`.
pub async fn handle(ctx: &mut AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    ctx.warm_up().await;

    let progress = Progress::spinner("Indexing new documents...");
    let result = ctx.session.trigger_indexing().await;
    match &result {
        Ok(_) => progress.finish_clear(),
        Err(_) => progress.finish_err("Indexing failed"),
    }
    for notification in ctx.drain_notifications() {
        eprintln!("{}", notification_line(&notification));
    }

    let summary = result?;
    match flags.format {
        OutputFormat::Text => print!("{}", view::render(&ctx.session.view())),
        format => output(
            &IndexResponse {
                document_summary_dict: summary,
            },
            format,
        )?,
    }
    Ok(())
}
