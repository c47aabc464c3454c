//! `pharmadoc status`

use chrono::{DateTime, Utc};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use pharmadoc_core::config::StorageBackend;
use pharmadoc_core::error::AppError;
use pharmadoc_core::types::StorageKey;
use pharmadoc_core::types::token::peek_expiry;

use super::Context;

/// One stored key
#[derive(Debug, Serialize, Tabled)]
struct StatusRow {
    /// Storage key
    key: String,
    /// Present
    stored: bool,
    /// Details
    detail: String,
}

pub async fn execute(ctx: &Context, format: OutputFormat) -> Result<(), AppError> {
    let now = Utc::now();
    let mut rows = Vec::with_capacity(StorageKey::ALL.len());

    for key in StorageKey::ALL {
        let detail = match key {
            StorageKey::AccessToken => ctx
                .storage
                .access_token()
                .await?
                .map(|token| describe_expiry(&token, now)),
            StorageKey::RefreshToken => ctx
                .storage
                .refresh_token()
                .await?
                .map(|token| describe_expiry(&token, now)),
            StorageKey::UserData => ctx.storage.profile().await?.map(|profile| {
                match profile.role {
                    Some(role) => format!("{} ({})", profile.username, role),
                    None => profile.username,
                }
            }),
        };

        rows.push(StatusRow {
            key: key.as_str().to_string(),
            stored: detail.is_some(),
            detail: detail.unwrap_or_else(|| "-".to_string()),
        });
    }

    if format == OutputFormat::Table {
        output::print_kv("API", &ctx.config.api.base_url);
        match ctx.config.storage.backend {
            StorageBackend::File => output::print_kv(
                "Storage",
                &ctx.config.storage.path.display().to_string(),
            ),
            StorageBackend::Memory => output::print_kv("Storage", "memory (not persisted)"),
        }
    }
    output::print_list(&rows, format);
    Ok(())
}

/// Human summary of a token's `exp` claim relative to `now`.
fn describe_expiry(token: &str, now: DateTime<Utc>) -> String {
    let Some(expires) = peek_expiry(token) else {
        return "opaque token".to_string();
    };

    let stamp = expires.format("%Y-%m-%d %H:%M UTC");
    let left = expires - now;
    if left <= chrono::Duration::zero() {
        return format!("expired {}", stamp);
    }
    format!(
        "expires {} (in {}h {:02}m)",
        stamp,
        left.num_hours(),
        left.num_minutes() % 60
    )
}
