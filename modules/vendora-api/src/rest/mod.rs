pub mod notifications;

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Json, Response},
};

use vendora_common::Identity;
use vendora_realtime::extract_token;

use crate::state::AppState;

/// Authenticated caller. Extract this in handlers that require auth; the
/// REST layer and the realtime channel accept the same bearer token.
pub struct AuthedUser(pub Identity);

impl FromRequestParts<Arc<AppState>> for AuthedUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(&parts.headers, None).ok_or_else(unauthorized)?;
        let identity = state
            .jwt
            .verify_token(&token)
            .map_err(|_| unauthorized())?;
        Ok(AuthedUser(identity))
    }
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({"error": "authentication required"})),
    )
        .into_response()
}
