use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{AppState, TrackListResponse, TrackResponse};
use crate::error::{AppError, Result};
use crate::models::NewTrackedItem;
use crate::orchestrator::ScanSummary;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct TrackRequest {
    pub url: String,
    #[validate(email(message = "Please provide a valid email address"))]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub email: Option<String>,
}

/// Scan trigger, guarded by a shared-secret header. Returns 200 with the
/// run summary even when individual items failed; 500 is reserved for
/// orchestrator-level faults and 409 for an overlapping run.
pub async fn run_scan(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ScanSummary>> {
    let secret = headers
        .get("x-secret")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if secret != state.config.security.scan_secret {
        return Err(AppError::Unauthorized);
    }

    let summary = state.orchestrator.run_scan().await?;
    Ok(Json(summary))
}

/// Creates a tracked item after one synchronous price extraction, so a
/// request for a page we cannot price is rejected up front.
pub async fn create_track(
    State(state): State<AppState>,
    Json(request): Json<TrackRequest>,
) -> Result<Json<TrackResponse>> {
    request.validate()?;

    if !request.url.starts_with("http://") && !request.url.starts_with("https://") {
        return Err(AppError::Validation(
            "Please provide a valid URL starting with http:// or https://".to_string(),
        ));
    }

    let content = state.fetcher.fetch(&request.url).await?;
    let price = state.extractor.extract(&content).ok_or(AppError::Extract)?;

    let item = state
        .store
        .create(NewTrackedItem {
            url: request.url,
            email: request.email,
            price,
        })
        .await?;

    tracing::info!(item = %item.id, url = %item.url, price, "Tracking started");

    Ok(Json(TrackResponse {
        success: true,
        message: format!("Price tracking started! Current price: {}", price),
        price,
        track: item,
    }))
}

/// All tracked items for a subscriber, newest-checked first.
pub async fn list_tracks(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<TrackListResponse>> {
    let email = params
        .email
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::Validation("Email parameter is required".to_string()))?;

    let tracks = state.store.find_by_email(&email).await?;
    Ok(Json(TrackListResponse { tracks }))
}
