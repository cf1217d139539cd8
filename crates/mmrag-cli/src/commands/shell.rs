use anyhow::Context;
use mmrag_core::{IndexingPhase, QueryPhase};
use mmrag_session::{IndexingState, Notification, QueryRequestState, Session, SessionView};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::cli::{GlobalFlags, OutputFormat};
use crate::context::AppContext;
use crate::output::{notification_line, output};
use crate::progress::Progress;
use crate::view;

const HELP: &str = "Type a query and press Enter. Commands: :login, :index, :quit.";

/// One line of shell input.
#[derive(Debug, PartialEq, Eq)]
enum ShellInput {
    Empty,
    Login,
    Index,
    Quit,
    Help,
    Query(String),
}

impl ShellInput {
    fn parse(line: &str) -> Self {
        match line.trim() {
            "" => Self::Empty,
            ":login" => Self::Login,
            ":index" => Self::Index,
            ":quit" | ":q" | ":exit" => Self::Quit,
            ":help" | ":h" => Self::Help,
            query => Self::Query(query.to_string()),
        }
    }
}

/// Handle `mmrag shell`.
pub async fn handle(ctx: &mut AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    ctx.warm_up().await;

    let session = ctx.session.clone();
    let mut watch = session.watch();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut screen = Screen::new(flags.format);

    eprintln!("{HELP}");
    screen.refresh(&session.view())?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read from stdin")? else {
                    break;
                };
                match ShellInput::parse(&line) {
                    ShellInput::Quit => break,
                    ShellInput::Empty => {}
                    ShellInput::Help => screen.message(HELP),
                    ShellInput::Login => spawn_sign_in(&session),
                    ShellInput::Index => spawn_indexing(&session),
                    ShellInput::Query(query) => {
                        // Rejections are already queued as notifications.
                        let _ = session.submit(query).await;
                    }
                }
            }
            changed = watch.changed() => {
                if !changed {
                    break;
                }
            }
            Some(notification) = ctx.notifications.recv() => screen.notify(&notification),
        }
        screen.refresh(&session.view())?;
    }

    screen.finish();
    Ok(())
}

fn spawn_sign_in(session: &Session) {
    let session = session.clone();
    tokio::spawn(async move {
        if let Err(error) = session.sign_in().await {
            tracing::debug!(%error, "shell sign-in failed");
        }
    });
}

fn spawn_indexing(session: &Session) {
    let session = session.clone();
    tokio::spawn(async move {
        if let Err(error) = session.trigger_indexing().await {
            tracing::debug!(%error, "shell indexing failed");
        }
    });
}

/// The parts of a view that warrant printing the page again. Dots and the
/// clock only move the spinner.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PageKey {
    signed_in: bool,
    phase: QueryPhase,
    generation: u64,
    indexing: IndexingPhase,
}

impl PageKey {
    const fn of(view: &SessionView) -> Self {
        Self {
            signed_in: view.signed_in(),
            phase: view.query.phase,
            generation: view.query.generation,
            indexing: view.indexing.phase,
        }
    }
}

#[derive(Serialize)]
struct ShellFrame<'a> {
    signed_in: bool,
    query: &'a QueryRequestState,
    indexing: &'a IndexingState,
}

struct Screen {
    format: OutputFormat,
    printed: Option<PageKey>,
    spinner: Option<Progress>,
}

impl Screen {
    const fn new(format: OutputFormat) -> Self {
        Self {
            format,
            printed: None,
            spinner: None,
        }
    }

    fn refresh(&mut self, view: &SessionView) -> anyhow::Result<()> {
        let key = PageKey::of(view);
        if self.printed.as_ref() != Some(&key) {
            self.printed = Some(key);
            self.print_page(view)?;
        }

        if let Some(line) = view::loading_line(view) {
            if let Some(spinner) = &self.spinner {
                spinner.set_message(&line);
            } else {
                self.spinner = Some(Progress::spinner(&line));
            }
        } else if let Some(spinner) = self.spinner.take() {
            spinner.finish_clear();
        }
        Ok(())
    }

    fn print_page(&self, view: &SessionView) -> anyhow::Result<()> {
        let print = || match self.format {
            OutputFormat::Text => {
                println!("{}", view::render(view));
                Ok(())
            }
            format => output(
                &ShellFrame {
                    signed_in: view.signed_in(),
                    query: &view.query,
                    indexing: &view.indexing,
                },
                format,
            ),
        };
        match &self.spinner {
            Some(spinner) => spinner.suspend(print),
            None => print(),
        }
    }

    fn notify(&self, notification: &Notification) {
        self.message(&notification_line(notification));
    }

    fn message(&self, line: &str) {
        match &self.spinner {
            Some(spinner) => spinner.suspend(|| eprintln!("{line}")),
            None => eprintln!("{line}"),
        }
    }

    fn finish(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_clear();
        }
    }
}
