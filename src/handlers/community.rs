use super::{author_of, require_content};
use crate::errors::AppError;
use crate::models::{
    Comment, CommunityPost, ContentRequest, LikeResponse, NewComment, NewCommunityPost,
    PostWithComments,
};
use crate::session::CurrentUser;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::error;

pub async fn list_posts(
    State(state): State<AppState>,
    _current: CurrentUser,
) -> Result<Json<Vec<PostWithComments>>, AppError> {
    Ok(Json(state.backend.posts_with_comments().await?))
}

pub async fn create_post(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(req): Json<ContentRequest>,
) -> Result<(StatusCode, Json<CommunityPost>), AppError> {
    let content = require_content(&req.content)?;
    let (author_name, is_anonymous) = author_of(&state, current.user.id).await?;

    let post = state
        .backend
        .insert_post(NewCommunityPost {
            user_id: current.user.id,
            content,
            author_name,
            is_anonymous,
        })
        .await
        .inspect_err(|err| error!("could not add post: {err}"))?;
    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn like_post(
    State(state): State<AppState>,
    _current: CurrentUser,
    Path(post_id): Path<u64>,
) -> Result<Json<LikeResponse>, AppError> {
    let new_likes = state
        .backend
        .like_post(post_id)
        .await
        .inspect_err(|err| error!(post_id, "could not update likes: {err}"))?;
    Ok(Json(LikeResponse {
        success: true,
        new_likes,
    }))
}

pub async fn add_comment(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(post_id): Path<u64>,
    Json(req): Json<ContentRequest>,
) -> Result<(StatusCode, Json<Comment>), AppError> {
    let content = require_content(&req.content)?;
    let (author_name, _) = author_of(&state, current.user.id).await?;

    let comment = state
        .backend
        .insert_comment(NewComment {
            post_id,
            user_id: current.user.id,
            content,
            author_name,
        })
        .await
        .inspect_err(|err| error!(post_id, "could not add comment: {err}"))?;
    Ok((StatusCode::CREATED, Json(comment)))
}
