use mmrag_core::QueryPhase;
use mmrag_session::SessionError;

use crate::cli::{AskArgs, GlobalFlags, OutputFormat};
use crate::context::AppContext;
use crate::output::{notification_line, output};
use crate::progress::Progress;
use crate::view;

/// Handle `mmrag ask <QUERY>...`.
pub async fn handle(args: &AskArgs, ctx: &mut AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    ctx.warm_up().await;

    let mut watch = ctx.session.watch();
    if let Err(error) = ctx.session.submit(args.query()).await {
        report_notifications(ctx);
        return Err(match error {
            SessionError::Unauthenticated => anyhow::anyhow!("not signed in; run `mmrag auth login`"),
            other => other.into(),
        });
    }

    let progress = Progress::spinner("Generating response");
    loop {
        let view = ctx.session.view();
        if view.query.phase.is_settled() {
            break;
        }
        if let Some(line) = view::loading_line(&view) {
            progress.set_message(&line);
        }
        if !watch.changed().await {
            break;
        }
    }
    progress.finish_clear();
    report_notifications(ctx);

    let view = ctx.session.view();
    match flags.format {
        OutputFormat::Text => print!("{}", view::render(&view)),
        format => output(&view.query, format)?,
    }

    if view.query.phase == QueryPhase::Failed {
        anyhow::bail!("query did not complete");
    }
    Ok(())
}

fn report_notifications(ctx: &mut AppContext) {
    for notification in ctx.drain_notifications() {
        eprintln!("{}", notification_line(&notification));
    }
}
