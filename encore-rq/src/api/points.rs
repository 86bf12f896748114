//! Guest ledger endpoint

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::extract::ValidJson;
use crate::error::Result;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinBody {
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub guest_name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointsResponse {
    pub points: u32,
    pub guest_name: Option<String>,
}

/// POST /shows/:show_id/points
///
/// Idempotent per (show, phone): repeat calls return the same balance.
pub async fn join_show(
    State(state): State<AppState>,
    Path(show_id): Path<Uuid>,
    ValidJson(body): ValidJson<JoinBody>,
) -> Result<Json<PointsResponse>> {
    let outcome = state
        .queue
        .join_show(show_id, &body.phone_number, body.guest_name.as_deref())
        .await?;

    Ok(Json(PointsResponse {
        points: outcome.entry.points,
        guest_name: outcome.entry.guest_name,
    }))
}
