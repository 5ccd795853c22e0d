use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use authd_core::definitions::{PATH_AUTHORIZE, PATH_PASSWORD_CHANGE, PATH_TOKEN, PATH_VERIFY};

use crate::state::AppState;

pub mod authorize;
pub mod password_change;
pub mod token;
pub mod verify;

/// Builds the four-endpoint router under the state's configured base path.
/// Method mismatches fall through to axum's default 405; content-type
/// mismatches on the `Form` extractors fall through to its default 415 —
/// neither needs handling here.
pub fn router(state: Arc<AppState>) -> Router {
    let base = state.base_path.clone();
    Router::new()
        .route(
            &format!("{base}/{PATH_AUTHORIZE}"),
            get(authorize::authorize_get).post(authorize::authorize_post),
        )
        .route(&format!("{base}/{PATH_TOKEN}"), post(token::token))
        .route(&format!("{base}/{PATH_VERIFY}"), post(verify::verify))
        .route(
            &format!("{base}/{PATH_PASSWORD_CHANGE}"),
            get(password_change::password_change_get).post(password_change::password_change_post),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
