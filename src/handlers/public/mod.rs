mod activate;
mod dict;
mod status;

pub use activate::*;
pub use dict::*;
pub use status::*;

use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use crate::db::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/activate", post(activate))
        .route("/status", post(check_status))
        .route("/dict/entry", post(lookup_entry))
        .route("/dict/identities", post(list_identities))
        .route("/dict/search/pinyin", post(search_by_pinyin))
        .route("/dict/search/char-type", post(search_by_char_type))
        .route("/dict/search/group", post(search_phonetic_group))
}
