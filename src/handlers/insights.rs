use crate::analysis::{analyze, AnalysisResult};
use crate::backend::SortOrder;
use crate::errors::AppError;
use crate::models::{PredictSentimentRequest, SentimentResponse};
use crate::session::CurrentUser;
use crate::state::AppState;
use crate::stats::{build_dashboard, DashboardResponse};
use axum::{extract::State, Json};
use serde_json::json;
use tracing::{error, info};

pub async fn dashboard(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<DashboardResponse>, AppError> {
    let entries = state
        .backend
        .journal_entries(current.user.id, SortOrder::Ascending)
        .await?;
    Ok(Json(build_dashboard(&entries)))
}

/// `null` when there is nothing to analyse yet.
pub async fn analysis(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Option<AnalysisResult>>, AppError> {
    let entries = state
        .backend
        .journal_entries(current.user.id, SortOrder::Ascending)
        .await?;
    if entries.is_empty() {
        return Ok(Json(None));
    }

    info!(user_id = %current.user.id, entries = entries.len(), "building analysis");
    let result = analyze(&entries, state.generator.as_deref()).await;
    Ok(Json(Some(result)))
}

pub async fn predict_sentiment(
    State(state): State<AppState>,
    Json(req): Json<PredictSentimentRequest>,
) -> Result<Json<SentimentResponse>, AppError> {
    let url = format!("{}/predict", state.config.sentiment_service_url);
    let response = state
        .http
        .post(&url)
        .json(&json!({ "text": req.text }))
        .send()
        .await
        .and_then(|response| response.error_for_status())
        .map_err(|err| {
            error!("sentiment service request failed: {err}");
            AppError::bad_gateway(err)
        })?;

    let upstream: SentimentResponse = response.json().await.map_err(|err| {
        error!("sentiment service returned an unexpected body: {err}");
        AppError::bad_gateway(err)
    })?;
    Ok(Json(SentimentResponse {
        sentiment: upstream.sentiment,
    }))
}
