use clap::Subcommand;

/// Authentication commands.
#[derive(Clone, Debug, Subcommand)]
pub enum AuthCommands {
    /// Sign in through the browser.
    Login,
    /// Show the cached account and whether it still signs in silently.
    Status,
}
