use super::require_content;
use crate::backend::SortOrder;
use crate::errors::AppError;
use crate::models::{JournalEntry, Mood, NewEntryRequest, NewJournalEntry};
use crate::session::CurrentUser;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use uuid::Uuid;

pub async fn save_entry(
    state: &AppState,
    user_id: Uuid,
    req: NewEntryRequest,
) -> Result<JournalEntry, AppError> {
    let content = require_content(&req.content)?;
    let mood = Mood::new(req.mood)
        .ok_or_else(|| AppError::bad_request("mood must be between 1 and 5"))?;

    let entry = state
        .backend
        .insert_journal_entry(NewJournalEntry {
            user_id,
            mood,
            content,
        })
        .await?;
    Ok(entry)
}

pub async fn list_entries(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Vec<JournalEntry>>, AppError> {
    let entries = state
        .backend
        .journal_entries(current.user.id, SortOrder::Descending)
        .await?;
    Ok(Json(entries))
}

pub async fn create_entry(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(req): Json<NewEntryRequest>,
) -> Result<(StatusCode, Json<JournalEntry>), AppError> {
    let entry = save_entry(&state, current.user.id, req).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}
