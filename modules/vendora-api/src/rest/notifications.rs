use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use vendora_common::{Identity, NotificationRequest, NotifyError};
use vendora_store::{NotificationFilter, NotificationStore, Page};

use crate::rest::AuthedUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Super-admins may list another user's notifications.
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub unread_only: bool,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// GET /api/notifications
pub async fn list(
    State(state): State<Arc<AppState>>,
    AuthedUser(identity): AuthedUser,
    Query(query): Query<ListQuery>,
) -> Response {
    if let Err(denied) = check_general_limit(&state, &identity).await {
        return denied;
    }

    let recipient_id = match query.user_id {
        Some(requested) if requested != identity.user_id => {
            if !identity.role.is_super_admin() {
                return forbidden();
            }
            requested
        }
        _ => identity.user_id,
    };

    let filter = NotificationFilter {
        recipient_id: Some(recipient_id),
        unread_only: query.unread_only,
        ..Default::default()
    };
    let page = Page {
        limit: query.limit.unwrap_or(50).min(200),
        offset: query.offset.unwrap_or(0),
    };

    match state.store.find(&filter, page).await {
        Ok(notifications) => Json(serde_json::json!({ "notifications": notifications })).into_response(),
        Err(e) => {
            warn!(error = %e, "failed to list notifications");
            internal_error()
        }
    }
}

/// POST /api/notifications/{id}/read
pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    AuthedUser(identity): AuthedUser,
    Path(id): Path<Uuid>,
) -> Response {
    with_owned_notification(&state, &identity, id, |state, id| async move {
        state.store.mark_read(id).await
    })
    .await
}

/// POST /api/notifications/{id}/unread
pub async fn mark_unread(
    State(state): State<Arc<AppState>>,
    AuthedUser(identity): AuthedUser,
    Path(id): Path<Uuid>,
) -> Response {
    with_owned_notification(&state, &identity, id, |state, id| async move {
        state.store.mark_unread(id).await
    })
    .await
}

/// DELETE /api/notifications/{id}
pub async fn delete(
    State(state): State<Arc<AppState>>,
    AuthedUser(identity): AuthedUser,
    Path(id): Path<Uuid>,
) -> Response {
    with_owned_notification(&state, &identity, id, |state, id| async move {
        state.store.delete(id).await
    })
    .await
}

#[derive(Debug, Deserialize)]
pub struct EmitBody {
    pub request: NotificationRequest,
}

/// POST /internal/notifications — drive the pipeline directly. Reserved for
/// platform services and super-admin tooling; ordinary clients never create
/// notifications themselves.
pub async fn emit(
    State(state): State<Arc<AppState>>,
    AuthedUser(identity): AuthedUser,
    Json(body): Json<EmitBody>,
) -> Response {
    if !identity.role.is_super_admin() {
        return forbidden();
    }

    match state.dispatcher.dispatch(body.request).await {
        Ok(Some(notification)) => (
            StatusCode::CREATED,
            Json(serde_json::json!({ "notification": notification })),
        )
            .into_response(),
        Ok(None) => (
            StatusCode::OK,
            Json(serde_json::json!({ "skipped": "recipient has notifications disabled" })),
        )
            .into_response(),
        Err(e) => notify_error_response(e),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn check_general_limit(state: &AppState, identity: &Identity) -> Result<(), Response> {
    state
        .general_limiter
        .allow(identity)
        .await
        .map_err(notify_error_response)
}

/// Load, check ownership, then run `op`. Super-admins may act on any
/// notification; everyone else only on their own.
async fn with_owned_notification<F, Fut>(
    state: &Arc<AppState>,
    identity: &Identity,
    id: Uuid,
    op: F,
) -> Response
where
    F: FnOnce(Arc<AppState>, Uuid) -> Fut,
    Fut: std::future::Future<Output = anyhow::Result<bool>>,
{
    if let Err(denied) = check_general_limit(state, identity).await {
        return denied;
    }

    let notification = match state.store.get(id).await {
        Ok(Some(notification)) => notification,
        Ok(None) => return not_found(),
        Err(e) => {
            warn!(error = %e, notification_id = %id, "failed to load notification");
            return internal_error();
        }
    };
    if !notification.accessible_by(identity) {
        return forbidden();
    }

    match op(state.clone(), id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => not_found(),
        Err(e) => {
            warn!(error = %e, notification_id = %id, "notification operation failed");
            internal_error()
        }
    }
}

fn notify_error_response(error: NotifyError) -> Response {
    let retry_after = error.retry_after_secs();
    let (status, message) = match &error {
        NotifyError::ValidationRejected { reason } => {
            (StatusCode::BAD_REQUEST, reason.clone())
        }
        NotifyError::Throttled { .. } | NotifyError::Suppressed { .. } => {
            (StatusCode::TOO_MANY_REQUESTS, error.to_string())
        }
        NotifyError::IdentityUnauthorized => (StatusCode::UNAUTHORIZED, error.to_string()),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string()),
    };

    let mut response =
        (status, Json(serde_json::json!({ "error": message }))).into_response();
    if let Some(secs) = retry_after {
        if let Ok(value) = secs.to_string().parse() {
            response.headers_mut().insert("Retry-After", value);
        }
    }
    response
}

fn forbidden() -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(serde_json::json!({"error": "not allowed"})),
    )
        .into_response()
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({"error": "notification not found"})),
    )
        .into_response()
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({"error": "internal error"})),
    )
        .into_response()
}
