use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::db::AppState;
use crate::util::extract_bearer_token;

/// SHA-256 hex digest of an admin token, the form it takes in configuration.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

fn token_matches(stored_hash: &str, presented: &str) -> bool {
    let presented_hash = hash_token(presented);
    presented_hash.as_bytes().ct_eq(stored_hash.as_bytes()).into()
}

/// Authenticate the admin surface from a bearer token.
///
/// With no hash configured the surface stays locked rather than open.
pub async fn admin_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(ref stored_hash) = state.admin_token_hash else {
        return Err(StatusCode::UNAUTHORIZED);
    };
    let token = extract_bearer_token(request.headers()).ok_or(StatusCode::UNAUTHORIZED)?;
    if !token_matches(stored_hash, token) {
        tracing::warn!("rejected admin request with invalid token");
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(next.run(request).await)
}
