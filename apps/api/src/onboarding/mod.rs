//! First-run tutorial completion flag, stored per user as
//! `onboarding_completed:<username>` = `"true"`.

pub mod handlers;

use crate::platform::{KvStore, PlatformError};

fn completion_key(username: &str) -> String {
    format!("onboarding_completed:{username}")
}

pub async fn is_completed(kv: &dyn KvStore, username: &str) -> Result<bool, PlatformError> {
    Ok(kv.get(&completion_key(username)).await?.as_deref() == Some("true"))
}

pub async fn mark_completed(kv: &dyn KvStore, username: &str) -> Result<(), PlatformError> {
    kv.set(&completion_key(username), "true").await
}

/// Clears the flag so the tutorial shows again.
pub async fn reset(kv: &dyn KvStore, username: &str) -> Result<(), PlatformError> {
    kv.delete(&completion_key(username)).await?;
    Ok(())
}
