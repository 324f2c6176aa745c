use axum::Json;
use axum::extract::State;
use serde::Deserialize;

use crate::activation::{self, DeviceStatus};
use crate::db::AppState;
use crate::error::{AppError, Result};

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub device_id: String,
}

pub async fn check_status(
    State(state): State<AppState>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<DeviceStatus>> {
    if req.device_id.is_empty() {
        return Err(AppError::BadRequest("device_id is required".into()));
    }

    let conn = state.db.get()?;
    let status = activation::check_status(&conn, &req.device_id)?;
    Ok(Json(status))
}
