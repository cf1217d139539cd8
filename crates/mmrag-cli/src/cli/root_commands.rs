use clap::{Args, Subcommand};

use crate::cli::subcommands::AuthCommands;

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Ask the backend a question and print the answer with its images.
    Ask(AskArgs),
    /// Index documents the backend has not seen yet.
    Index,
    /// Interactive session: each line is a query.
    Shell,
    /// Sign-in management.
    Auth {
        #[command(subcommand)]
        action: AuthCommands,
    },
}

#[derive(Clone, Debug, Args)]
pub struct AskArgs {
    /// The question. Multiple words are joined with spaces.
    #[arg(required = true, num_args = 1..)]
    pub query: Vec<String>,
}

impl AskArgs {
    #[must_use]
    pub fn query(&self) -> String {
        self.query.join(" ")
    }
}
