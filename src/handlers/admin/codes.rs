use axum::Json;
use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};

use crate::db::{AppState, queries};
use crate::error::{AppError, Result};
use crate::models::ActivationCode;

use super::{Paged, default_page, default_per_page, limit_offset};

#[derive(Debug, Deserialize)]
pub struct GenerateCodesRequest {
    pub quantity: i64,
    pub plan: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateCodesResponse {
    pub plan: String,
    pub codes: Vec<String>,
}

pub async fn generate_codes(
    State(state): State<AppState>,
    Json(req): Json<GenerateCodesRequest>,
) -> Result<Json<GenerateCodesResponse>> {
    if req.quantity < 1 || req.quantity > state.generate_code_limit {
        return Err(AppError::BadRequest(format!(
            "quantity must be between 1 and {}",
            state.generate_code_limit
        )));
    }
    if !state.plans.contains(&req.plan) {
        return Err(AppError::BadRequest(format!(
            "unknown plan '{}', expected one of: {}",
            req.plan,
            state.plans.names().join(", ")
        )));
    }

    let mut conn = state.db.get()?;
    let codes = queries::insert_codes(&mut conn, req.quantity, &req.plan)?;
    tracing::info!(count = codes.len(), plan = %req.plan, "generated activation codes");

    Ok(Json(GenerateCodesResponse {
        plan: req.plan,
        codes,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ListCodesQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_per_page")]
    pub per_page: i64,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub unused_only: bool,
}

pub async fn list_codes(
    State(state): State<AppState>,
    Query(query): Query<ListCodesQuery>,
) -> Result<Json<Paged<ActivationCode>>> {
    let conn = state.db.get()?;
    let filter = queries::CodeFilter {
        search: query.search.clone().filter(|s| !s.is_empty()),
        unused_only: query.unused_only,
    };
    let (limit, offset) = limit_offset(query.page, query.per_page);
    let (items, total) = queries::list_codes_paginated(&conn, &filter, limit, offset)?;

    Ok(Json(Paged {
        items,
        total,
        page: query.page.max(1),
        per_page: limit,
    }))
}
