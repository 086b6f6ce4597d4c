use crate::errors::AppError;
use crate::models::{MeResponse, MessageResponse, Session, SignInRequest, SignUpRequest};
use crate::session::CurrentUser;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Redirect,
    Json,
};
use tracing::info;

const MIN_PASSWORD_LEN: usize = 6;

pub fn validate_sign_up(req: &SignUpRequest) -> Result<(), AppError> {
    let email = req.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::bad_request("a valid email is required"));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::bad_request(format!(
            "password should be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if req.alias.trim().is_empty() {
        return Err(AppError::bad_request("alias must not be empty"));
    }
    Ok(())
}

pub async fn register(state: &AppState, req: &SignUpRequest) -> Result<MessageResponse, AppError> {
    validate_sign_up(req)?;
    let user = state
        .backend
        .sign_up(&req.email, &req.password, &req.alias)
        .await?;
    info!(user_id = %user.id, "account registered");
    Ok(MessageResponse {
        message: "Account created. You can sign in now.".to_string(),
    })
}

pub async fn sign_up(
    State(state): State<AppState>,
    Json(req): Json<SignUpRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    let response = register(&state, &req).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn sign_in(
    State(state): State<AppState>,
    Json(req): Json<SignInRequest>,
) -> Result<Json<Session>, AppError> {
    let session = state
        .backend
        .sign_in_with_password(&req.email, &req.password)
        .await?;
    Ok(Json(session))
}

pub async fn sign_in_anonymously(State(state): State<AppState>) -> Result<Json<Session>, AppError> {
    Ok(Json(state.backend.sign_in_anonymously().await?))
}

pub async fn sign_in_with_oauth(
    State(state): State<AppState>,
    Path(provider): Path<String>,
) -> Result<Redirect, AppError> {
    let redirect = state.backend.sign_in_with_oauth(&provider).await?;
    Ok(Redirect::to(&redirect.url))
}

pub async fn sign_out(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<StatusCode, AppError> {
    state.backend.sign_out(&current.access_token).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn me(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<MeResponse>, AppError> {
    let alias = state
        .backend
        .profile(current.user.id)
        .await?
        .and_then(|profile| profile.alias)
        .unwrap_or_else(|| "User".to_string());
    Ok(Json(MeResponse {
        user: current.user,
        alias,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(email: &str, password: &str, alias: &str) -> SignUpRequest {
        SignUpRequest {
            email: email.into(),
            password: password.into(),
            alias: alias.into(),
        }
    }

    #[test]
    fn sign_up_validation() {
        assert!(validate_sign_up(&request("a@b.c", "secret", "ann")).is_ok());
        assert!(validate_sign_up(&request("not-an-email", "secret", "ann")).is_err());
        assert!(validate_sign_up(&request("a@b.c", "short", "ann")).is_err());
        assert!(validate_sign_up(&request("a@b.c", "secret", "  ")).is_err());
    }
}
