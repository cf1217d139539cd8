use crate::cli::GlobalFlags;
use crate::cli::root_commands::Commands;
use crate::commands;
use crate::context::AppContext;

/// Dispatch a parsed command to the corresponding handler module.
pub async fn dispatch(
    command: Commands,
    ctx: &mut AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match command {
        Commands::Ask(args) => commands::ask::handle(&args, ctx, flags).await,
        Commands::Index => commands::index::handle(ctx, flags).await,
        Commands::Shell => commands::shell::handle(ctx, flags).await,
        Commands::Auth { action } => commands::auth::handle(&action, ctx, flags).await,
    }
}
