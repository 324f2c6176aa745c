//! Gated dictionary endpoints. Every handler applies the activation guard
//! before touching the index.

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::activation;
use crate::db::AppState;
use crate::error::{AppError, Result};
use crate::models::GlyphEntry;

#[derive(Debug, Deserialize)]
pub struct GlyphRequest {
    pub device_id: String,
    pub glyph: String,
}

pub async fn lookup_entry(
    State(state): State<AppState>,
    Json(req): Json<GlyphRequest>,
) -> Result<Json<GlyphEntry>> {
    let conn = state.db.get()?;
    activation::guard(&conn, &req.device_id)?;

    let entry = state
        .dict
        .lookup(&req.glyph)
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("no entry for '{}'", req.glyph)))?;
    Ok(Json(entry))
}

/// One lookup mode applicable to a glyph, for client menus.
#[derive(Debug, Serialize)]
pub struct GlyphIdentity {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub query: String,
    pub label: String,
}

pub async fn list_identities(
    State(state): State<AppState>,
    Json(req): Json<GlyphRequest>,
) -> Result<Json<Vec<GlyphIdentity>>> {
    let conn = state.db.get()?;
    activation::guard(&conn, &req.device_id)?;

    let entry = state
        .dict
        .lookup(&req.glyph)
        .ok_or_else(|| AppError::NotFound(format!("no entry for '{}'", req.glyph)))?;

    let mut identities = vec![GlyphIdentity {
        kind: "definition",
        query: entry.glyph.clone(),
        label: format!("Definition of '{}'", entry.glyph),
    }];
    if entry.group_leader().is_some() {
        identities.push(GlyphIdentity {
            kind: "phonetic_group",
            query: entry.glyph.clone(),
            label: format!("Phonetic series of '{}'", entry.glyph),
        });
    }
    Ok(Json(identities))
}

#[derive(Debug, Deserialize)]
pub struct PinyinRequest {
    pub device_id: String,
    pub pinyin: String,
}

pub async fn search_by_pinyin(
    State(state): State<AppState>,
    Json(req): Json<PinyinRequest>,
) -> Result<Json<Vec<GlyphEntry>>> {
    let conn = state.db.get()?;
    activation::guard(&conn, &req.device_id)?;

    let results = state.dict.by_pinyin(&req.pinyin);
    Ok(Json(results.into_iter().cloned().collect()))
}

#[derive(Debug, Deserialize)]
pub struct CharTypeRequest {
    pub device_id: String,
    pub char_type: String,
}

pub async fn search_by_char_type(
    State(state): State<AppState>,
    Json(req): Json<CharTypeRequest>,
) -> Result<Json<Vec<GlyphEntry>>> {
    let conn = state.db.get()?;
    activation::guard(&conn, &req.device_id)?;

    let results = state.dict.by_char_type(&req.char_type);
    Ok(Json(results.into_iter().cloned().collect()))
}

pub async fn search_phonetic_group(
    State(state): State<AppState>,
    Json(req): Json<GlyphRequest>,
) -> Result<Json<Vec<GlyphEntry>>> {
    let conn = state.db.get()?;
    activation::guard(&conn, &req.device_id)?;

    let results = state.dict.phonetic_group(&req.glyph);
    Ok(Json(results.into_iter().cloned().collect()))
}
