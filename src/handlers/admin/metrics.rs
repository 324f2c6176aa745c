use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::db::{AppState, queries};
use crate::error::Result;
use crate::metrics::MetricsSnapshot;

const TOP_ENDPOINTS: usize = 5;

#[derive(Debug, Serialize)]
pub struct MetricsReport {
    pub requests: MetricsSnapshot,
    pub store: queries::StoreSummary,
    pub dictionary_entries: usize,
}

pub async fn metrics_snapshot(State(state): State<AppState>) -> Result<Json<MetricsReport>> {
    let conn = state.db.get()?;
    let store = queries::store_summary(&conn)?;

    Ok(Json(MetricsReport {
        requests: state.metrics.snapshot(TOP_ENDPOINTS),
        store,
        dictionary_entries: state.dict.len(),
    }))
}
