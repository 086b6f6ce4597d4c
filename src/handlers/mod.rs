pub mod auth;
pub mod chat;
pub mod community;
pub mod insights;
pub mod journal;
pub mod pages;

use crate::errors::AppError;
use crate::models::Profile;
use crate::state::AppState;
use uuid::Uuid;

/// Name and anonymity flag stamped on posts and comments.
async fn author_of(state: &AppState, user_id: Uuid) -> Result<(String, bool), AppError> {
    let profile = state
        .backend
        .profile(user_id)
        .await?
        .unwrap_or(Profile {
            id: user_id,
            alias: None,
        });
    Ok((profile.display_name(), profile.is_anonymous()))
}

fn require_content(content: &str) -> Result<String, AppError> {
    if content.trim().is_empty() {
        return Err(AppError::bad_request("content must not be empty"));
    }
    Ok(content.to_string())
}
