use super::require_content;
use crate::backend::ChangeEvent;
use crate::errors::AppError;
use crate::models::{ChatUser, ContentRequest, Message, NewMessage, PresenceRequest, UserStatus};
use crate::session::CurrentUser;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use chrono::{DateTime, Utc};
use futures_util::Stream;
use std::{convert::Infallible, time::Duration};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, warn};
use uuid::Uuid;

/// Online flag, discounted when the last heartbeat is older than `window`.
pub fn is_online(status: &UserStatus, now: DateTime<Utc>, window: Duration) -> bool {
    if !status.online {
        return false;
    }
    match (now - status.last_active).to_std() {
        Ok(age) => age <= window,
        // Clock skew put the heartbeat in the future.
        Err(_) => true,
    }
}

pub async fn heartbeat(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(req): Json<PresenceRequest>,
) -> StatusCode {
    let status = UserStatus {
        user_id: current.user.id,
        online: req.online,
        last_active: Utc::now(),
    };
    // Fire-and-forget: a failed heartbeat is only logged.
    match state.backend.upsert_status(status).await {
        Ok(()) => debug!(user_id = %current.user.id, online = req.online, "presence updated"),
        Err(err) => error!(user_id = %current.user.id, "error updating user status: {err}"),
    }
    StatusCode::NO_CONTENT
}

pub async fn list_users(
    State(state): State<AppState>,
    _current: CurrentUser,
) -> Result<Json<Vec<ChatUser>>, AppError> {
    let statuses = state.backend.statuses().await?;
    let ids: Vec<Uuid> = statuses.iter().map(|status| status.user_id).collect();
    let profiles = state.backend.profiles(&ids).await.unwrap_or_else(|err| {
        error!("error fetching profiles: {err}");
        Vec::new()
    });

    let now = Utc::now();
    let window = state.config.presence_window();
    let users = statuses
        .iter()
        .map(|status| ChatUser {
            id: status.user_id,
            alias: profiles
                .iter()
                .find(|profile| profile.id == status.user_id)
                .and_then(|profile| profile.alias.clone())
                .unwrap_or_else(|| "anon".to_string()),
            online: is_online(status, now, window),
        })
        .collect();
    Ok(Json(users))
}

pub async fn list_messages(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(peer): Path<Uuid>,
) -> Result<Json<Vec<Message>>, AppError> {
    Ok(Json(state.backend.conversation(current.user.id, peer).await?))
}

pub async fn send_message(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(peer): Path<Uuid>,
    Json(req): Json<ContentRequest>,
) -> Result<(StatusCode, Json<Message>), AppError> {
    let content = require_content(&req.content)?;
    let me = current.user.id;
    if peer == me {
        return Err(AppError::bad_request("cannot message yourself"));
    }

    let statuses = state.backend.statuses().await?;
    let now = Utc::now();
    let window = state.config.presence_window();
    let online = |user_id: Uuid| {
        statuses
            .iter()
            .find(|status| status.user_id == user_id)
            .is_some_and(|status| is_online(status, now, window))
    };
    if !(online(me) && online(peer)) {
        return Err(AppError::conflict("chat unavailable: one user is offline"));
    }

    let message = state
        .backend
        .insert_message(NewMessage {
            sender_id: me,
            receiver_id: peer,
            content,
        })
        .await
        .inspect_err(|err| error!("error sending message: {err}"))?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// Pushes new messages of the conversation with `peer` as server-sent events.
pub async fn stream_messages(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(peer): Path<Uuid>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let me = current.user.id;
    let mut changes = state.backend.subscribe();

    let stream = async_stream::stream! {
        loop {
            match changes.recv().await {
                Ok(ChangeEvent::Messages(message)) if message.is_between(me, peer) => {
                    match Event::default().event("message").json_data(&message) {
                        Ok(event) => yield Ok::<Event, Infallible>(event),
                        Err(err) => warn!("could not encode message event: {err}"),
                    }
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "chat stream lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}
