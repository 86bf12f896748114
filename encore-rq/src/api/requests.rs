//! Request endpoints
//!
//! Submission and contributions are open to guests. Listing raw requests
//! and changing status or performer responses require [`Privileged`].

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use super::auth::Privileged;
use super::extract::ValidJson;
use crate::error::{Error, Result};
use crate::models::{PerformerResponse, Request, RequestStatus, SongInput};
use crate::queue::{Contribution, NewRequest, Submitted};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitBody {
    #[serde(default)]
    pub songs: Vec<SongInput>,
    #[serde(default)]
    pub dedication: String,
    /// Parsed wide so out-of-range values get a field-level error
    #[serde(default)]
    pub tip_amount: i64,
    #[serde(default)]
    pub requester_phone: Option<String>,
    #[serde(default)]
    pub requester_name: Option<String>,
    #[serde(default)]
    pub requester_user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusBody {
    pub status: String,
    #[serde(default)]
    pub song_key: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformerActionBody {
    #[serde(default)]
    pub performer_id: String,
    pub action: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionBody {
    #[serde(default)]
    pub tip_amount: i64,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub guest_name: Option<String>,
    #[serde(default)]
    pub dedication: Option<String>,
}

/// POST /shows/:show_id/requests
pub async fn submit_request(
    State(state): State<AppState>,
    Path(show_id): Path<Uuid>,
    ValidJson(body): ValidJson<SubmitBody>,
) -> Result<(StatusCode, Json<Submitted>)> {
    let new = NewRequest {
        songs: body.songs,
        dedication: body.dedication,
        tip_amount: body.tip_amount,
        requester_phone: body.requester_phone,
        requester_name: body.requester_name,
        requester_user_id: body.requester_user_id,
    };
    let submitted = state.queue.submit(show_id, new).await?;
    Ok((StatusCode::CREATED, Json(submitted)))
}

/// GET /shows/:show_id/requests
pub async fn list_requests(
    _auth: Privileged,
    State(state): State<AppState>,
    Path(show_id): Path<Uuid>,
) -> Result<Json<Vec<Request>>> {
    Ok(Json(state.queue.list_by_show(show_id).await?))
}

/// PATCH /requests/:request_id/status
pub async fn update_status(
    _auth: Privileged,
    State(state): State<AppState>,
    Path(request_id): Path<Uuid>,
    ValidJson(body): ValidJson<StatusBody>,
) -> Result<Json<Request>> {
    let target = body
        .status
        .parse::<RequestStatus>()
        .map_err(|e| Error::validation("status", e))?;
    let song_key = body.song_key.as_deref().filter(|k| !k.is_empty());

    let outcome = state.queue.transition(request_id, target, song_key).await?;
    Ok(Json(outcome.request))
}

/// PATCH /requests/:request_id/performer-action
pub async fn record_performer_action(
    _auth: Privileged,
    State(state): State<AppState>,
    Path(request_id): Path<Uuid>,
    ValidJson(body): ValidJson<PerformerActionBody>,
) -> Result<Json<Request>> {
    let response = match body.action.as_str() {
        "accept" => PerformerResponse::Accept,
        "pass" => PerformerResponse::Pass,
        other => {
            return Err(Error::validation(
                "action",
                format!("unknown action '{}', expected accept or pass", other),
            ))
        }
    };

    let request = state
        .queue
        .record_performer_response(request_id, &body.performer_id, response)
        .await?;
    Ok(Json(request))
}

/// POST /shows/:show_id/requests/:request_id/contributions
pub async fn add_contribution(
    State(state): State<AppState>,
    Path((show_id, request_id)): Path<(Uuid, Uuid)>,
    ValidJson(body): ValidJson<ContributionBody>,
) -> Result<(StatusCode, Json<Submitted>)> {
    let contribution = Contribution {
        tip_amount: body.tip_amount,
        phone_number: body.phone_number,
        guest_name: body.guest_name,
        dedication: body.dedication,
    };
    let submitted = state
        .queue
        .contribute(show_id, request_id, contribution)
        .await?;
    Ok((StatusCode::CREATED, Json(submitted)))
}
