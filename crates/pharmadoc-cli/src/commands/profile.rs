//! `pharmadoc profile`

use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use pharmadoc_core::error::AppError;
use pharmadoc_core::types::UserProfile;
use pharmadoc_session::AuthApi;

use super::Context;

/// Profile display row
#[derive(Debug, Serialize, Tabled)]
pub struct ProfileRow {
    /// User ID
    pub id: String,
    /// Username
    pub username: String,
    /// Role
    pub role: String,
    /// Email
    pub email: String,
    /// Active
    pub active: String,
}

impl From<&UserProfile> for ProfileRow {
    fn from(profile: &UserProfile) -> Self {
        Self {
            id: profile.id_display(),
            username: profile.username.clone(),
            role: profile.role.clone().unwrap_or_else(|| "-".to_string()),
            email: profile.email.clone().unwrap_or_else(|| "-".to_string()),
            active: if profile.is_active { "✓" } else { "✗" }.to_string(),
        }
    }
}

/// Fetch the profile with the stored access token and refresh the cache.
pub async fn execute(ctx: &Context, format: OutputFormat) -> Result<(), AppError> {
    let access_token = ctx
        .storage
        .access_token()
        .await?
        .ok_or_else(|| AppError::authentication("Not logged in; run `pharmadoc login` first"))?;

    let profile = ctx.api.profile(&access_token).await?;
    ctx.storage.set_profile(&profile).await?;

    output::print_item(&ProfileRow::from(&profile), format);
    Ok(())
}
