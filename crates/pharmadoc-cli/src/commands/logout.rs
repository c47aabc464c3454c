//! `pharmadoc logout`

use clap::Args;

use crate::output;
use pharmadoc_core::error::AppError;

use super::Context;

/// Arguments for logout
#[derive(Debug, Args)]
pub struct LogoutArgs {
    /// Skip confirmation
    #[arg(long)]
    pub force: bool,
}

pub async fn execute(args: &LogoutArgs, ctx: &Context) -> Result<(), AppError> {
    if !args.force {
        let confirm = dialoguer::Confirm::new()
            .with_prompt("Clear stored tokens and profile?")
            .default(false)
            .interact()
            .map_err(|e| AppError::internal(format!("Input error: {}", e)))?;

        if !confirm {
            println!("Cancelled.");
            return Ok(());
        }
    }

    ctx.storage.clear().await?;
    output::print_success("Logged out");
    Ok(())
}
