//! `pharmadoc refresh`: one pass of the refresh protocol.

use std::sync::Arc;

use crate::output;
use pharmadoc_core::error::AppError;
use pharmadoc_session::{RefreshOutcome, SessionBus, SessionManager, SystemClock};

use super::Context;

pub async fn execute(ctx: &Context) -> Result<(), AppError> {
    let manager = SessionManager::new(
        ctx.config.session.clone(),
        ctx.storage.clone(),
        ctx.api.clone(),
        Arc::new(SystemClock),
        SessionBus::default(),
    );

    match manager.refresh().await {
        RefreshOutcome::Refreshed => {
            output::print_success("Tokens refreshed");
            Ok(())
        }
        RefreshOutcome::NoRefreshToken => {
            output::print_warning("No refresh token stored; nothing to do");
            Ok(())
        }
        RefreshOutcome::Failed => Err(AppError::session(
            "Refresh failed; stored tokens left unchanged",
        )),
    }
}
