use axum::Json;
use axum::extract::State;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::activation;
use crate::db::AppState;
use crate::error::{AppError, Result};

#[derive(Debug, Deserialize)]
pub struct ActivateRequest {
    pub device_id: String,
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct ActivateResponse {
    pub plan: String,
    pub activated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

pub async fn activate(
    State(state): State<AppState>,
    Json(req): Json<ActivateRequest>,
) -> Result<Json<ActivateResponse>> {
    if req.device_id.is_empty() || req.code.is_empty() {
        return Err(AppError::BadRequest("device_id and code are required".into()));
    }

    let mut conn = state.db.get()?;
    let binding = activation::activate(&mut conn, &state.plans, &req.device_id, &req.code)?;

    Ok(Json(ActivateResponse {
        plan: binding.plan,
        activated_at: binding.activated_at,
        expires_at: binding.expires_at,
    }))
}
