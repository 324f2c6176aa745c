mod codes;
mod devices;
mod metrics;

pub use codes::*;
pub use devices::*;
pub use metrics::*;

use axum::Router;
use axum::routing::{get, post};
use serde::Serialize;

use crate::db::AppState;

pub(crate) const DEFAULT_PER_PAGE: i64 = 10;
pub(crate) const MAX_PER_PAGE: i64 = 100;

pub(crate) fn default_page() -> i64 {
    1
}

pub(crate) fn default_per_page() -> i64 {
    DEFAULT_PER_PAGE
}

pub(crate) fn limit_offset(page: i64, per_page: i64) -> (i64, i64) {
    let limit = per_page.clamp(1, MAX_PER_PAGE);
    let offset = (page.max(1) - 1) * limit;
    (limit, offset)
}

#[derive(Debug, Serialize)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/codes", post(generate_codes).get(list_codes))
        .route("/devices", get(list_devices))
        .route("/revoke", post(revoke_device))
        .route("/metrics", get(metrics_snapshot))
}
