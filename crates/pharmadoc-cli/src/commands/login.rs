//! `pharmadoc login`

use clap::Args;

use crate::output::{self, OutputFormat};
use pharmadoc_core::error::AppError;
use pharmadoc_core::types::TokenPair;
use pharmadoc_session::AuthApi;

use super::Context;
use super::profile::ProfileRow;

/// Arguments for login
#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Username
    #[arg(short, long)]
    pub username: String,
    /// Password (prompted when omitted)
    #[arg(short, long)]
    pub password: Option<String>,
}

pub async fn execute(args: &LoginArgs, ctx: &Context, format: OutputFormat) -> Result<(), AppError> {
    let password = match &args.password {
        Some(password) => password.clone(),
        None => dialoguer::Password::new()
            .with_prompt(format!("Password for {}", args.username))
            .interact()
            .map_err(|e| AppError::internal(format!("Input error: {}", e)))?,
    };

    let pair = TokenPair::from(ctx.api.login(&args.username, &password).await?);
    ctx.storage.replace_tokens(&pair).await?;
    output::print_success(&format!("Logged in as '{}'", args.username));

    // The tokens are already stored; a missing profile only affects the cache.
    match ctx.api.profile(&pair.access_token).await {
        Ok(profile) => {
            ctx.storage.set_profile(&profile).await?;
            output::print_item(&ProfileRow::from(&profile), format);
        }
        Err(e) => {
            tracing::warn!(error = %e, "Profile fetch after login failed");
            output::print_warning(&format!("Could not fetch profile: {}", e));
        }
    }

    Ok(())
}
