use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Form, Json};
use serde_json::json;
use tracing::warn;

use authd_core::definitions::FORM_TOKEN;

use crate::localhost::{is_localhost, PeerAddr};
use crate::state::AppState;

/// Introspects an access token. RFC 7662-shaped, restricted to localhost
/// callers since the document echoes back the token's username and scopes.
pub async fn verify(
    State(state): State<Arc<AppState>>,
    PeerAddr(peer_addr): PeerAddr,
    Form(params): Form<HashMap<String, String>>,
) -> Response {
    let localhost = is_localhost(
        state.trust_all_as_localhost,
        peer_addr,
    );
    if !localhost {
        warn!(event = "verify_rejected", "token introspection attempted from a non-localhost client");
        return StatusCode::FORBIDDEN.into_response();
    }

    let Some(token) = params.get(FORM_TOKEN) else {
        return (StatusCode::OK, Json(json!({ "active": false }))).into_response();
    };

    let result = state.token_handler.validate_access_token(token);
    if !result.valid || result.expired {
        warn!(event = "verify_inactive", "introspected token is invalid or expired");
        return (StatusCode::OK, Json(json!({ "active": false }))).into_response();
    }

    (
        StatusCode::OK,
        Json(json!({
            "active": true,
            "username": result.user_name,
            "scope": result.scopes,
            "exp": result.remaining_time_s,
        })),
    )
        .into_response()
}
