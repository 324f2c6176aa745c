use axum::Json;
use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};

use crate::activation;
use crate::db::{AppState, queries};
use crate::error::{AppError, Result};
use crate::models::DeviceBinding;

use super::{Paged, default_page, default_per_page, limit_offset};

#[derive(Debug, Deserialize)]
pub struct ListDevicesQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_per_page")]
    pub per_page: i64,
    #[serde(default)]
    pub search: Option<String>,
}

pub async fn list_devices(
    State(state): State<AppState>,
    Query(query): Query<ListDevicesQuery>,
) -> Result<Json<Paged<DeviceBinding>>> {
    let conn = state.db.get()?;
    let filter = queries::BindingFilter {
        search: query.search.clone().filter(|s| !s.is_empty()),
    };
    let (limit, offset) = limit_offset(query.page, query.per_page);
    let (items, total) = queries::list_bindings_paginated(&conn, &filter, limit, offset)?;

    Ok(Json(Paged {
        items,
        total,
        page: query.page.max(1),
        per_page: limit,
    }))
}

#[derive(Debug, Deserialize)]
pub struct RevokeRequest {
    pub device_id: String,
}

#[derive(Debug, Serialize)]
pub struct RevokeResponse {
    pub revoked: bool,
}

pub async fn revoke_device(
    State(state): State<AppState>,
    Json(req): Json<RevokeRequest>,
) -> Result<Json<RevokeResponse>> {
    if req.device_id.is_empty() {
        return Err(AppError::BadRequest("device_id is required".into()));
    }

    let mut conn = state.db.get()?;
    activation::revoke_access(&mut conn, &req.device_id)?;
    Ok(Json(RevokeResponse { revoked: true }))
}
