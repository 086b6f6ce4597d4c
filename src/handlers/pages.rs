use super::journal::save_entry;
use crate::backend::{BackendError, SortOrder};
use crate::errors::AppError;
use crate::models::{NewEntryRequest, Session, SignInRequest, SignUpRequest};
use crate::session::{clear_session_cookie, session_cookie, CurrentUser};
use crate::state::AppState;
use crate::stats::build_dashboard;
use crate::ui::{render_dashboard, render_login};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use tracing::warn;

const RECENT_ENTRIES_SHOWN: usize = 5;

pub async fn index(
    State(state): State<AppState>,
    current: Option<CurrentUser>,
) -> Result<Response, AppError> {
    let Some(current) = current else {
        return Ok(Redirect::to("/login").into_response());
    };

    let entries = state
        .backend
        .journal_entries(current.user.id, SortOrder::Ascending)
        .await?;
    let alias = state
        .backend
        .profile(current.user.id)
        .await?
        .and_then(|profile| profile.alias)
        .unwrap_or_else(|| "User".to_string());

    let dashboard = build_dashboard(&entries);
    let recent: Vec<_> = entries.iter().rev().take(RECENT_ENTRIES_SHOWN).collect();
    Ok(Html(render_dashboard(&alias, &dashboard, &recent)).into_response())
}

pub async fn login_page() -> Html<String> {
    Html(render_login(None))
}

fn signed_in(session: &Session) -> Result<Response, AppError> {
    let cookie = session_cookie(&session.access_token)?;
    Ok(([(header::SET_COOKIE, cookie)], Redirect::to("/")).into_response())
}

fn login_with_message(status: StatusCode, message: &str) -> Response {
    (status, Html(render_login(Some(message)))).into_response()
}

pub async fn login(
    State(state): State<AppState>,
    Form(req): Form<SignInRequest>,
) -> Result<Response, AppError> {
    match state
        .backend
        .sign_in_with_password(&req.email, &req.password)
        .await
    {
        Ok(session) => signed_in(&session),
        Err(BackendError::InvalidCredentials) => Ok(login_with_message(
            StatusCode::UNAUTHORIZED,
            "Invalid login credentials.",
        )),
        Err(err) => Err(err.into()),
    }
}

pub async fn signup(
    State(state): State<AppState>,
    Form(req): Form<SignUpRequest>,
) -> Response {
    match super::auth::register(&state, &req).await {
        Ok(response) => login_with_message(StatusCode::OK, &response.message),
        Err(err) => {
            warn!("sign-up rejected: {}", err.message);
            login_with_message(err.status, &err.message)
        }
    }
}

pub async fn login_anonymously(State(state): State<AppState>) -> Result<Response, AppError> {
    let session = state.backend.sign_in_anonymously().await?;
    signed_in(&session)
}

pub async fn logout(
    State(state): State<AppState>,
    current: Option<CurrentUser>,
) -> Result<Response, AppError> {
    if let Some(current) = current {
        state.backend.sign_out(&current.access_token).await?;
    }
    Ok((
        [(header::SET_COOKIE, clear_session_cookie())],
        Redirect::to("/login"),
    )
        .into_response())
}

pub async fn journal_form(
    State(state): State<AppState>,
    current: Option<CurrentUser>,
    Form(req): Form<NewEntryRequest>,
) -> Result<Redirect, AppError> {
    let Some(current) = current else {
        return Ok(Redirect::to("/login"));
    };
    save_entry(&state, current.user.id, req).await?;
    Ok(Redirect::to("/"))
}
