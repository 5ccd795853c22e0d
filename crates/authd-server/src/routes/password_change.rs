use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Form;
use tracing::{info, warn};

use authd_core::definitions::FORM_USERNAME;
use authd_templates::{ErrorType, CLOSE_TAB};

use crate::state::AppState;
use crate::support::{accepts_json, rendered_response};

pub async fn password_change_get(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let json_wanted = accepts_json(&headers);
    let Some(username) = params.get(FORM_USERNAME).cloned() else {
        warn!(event = "password_change_missing_username", "password change GET missing username");
        let rendered = state.response_helper.send_error_confirmation(
            json_wanted,
            CLOSE_TAB,
            ErrorType::InvalidRequest,
            "Missing query parameter 'username'",
        );
        return rendered_response(StatusCode::BAD_REQUEST, rendered);
    };

    let rendered = state.response_helper.send_password_change_page(
        json_wanted,
        CLOSE_TAB,
        &username,
        ErrorType::NoError,
        "",
        "",
    );
    rendered_response(StatusCode::OK, rendered)
}

pub async fn password_change_post(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(params): Form<HashMap<String, String>>,
) -> Response {
    let json_wanted = accepts_json(&headers);
    let username = params.get(FORM_USERNAME).cloned().unwrap_or_default();

    if !state.authenticator.has_form_password_change_data(&params) {
        warn!(event = "password_change_malformed", "password change POST missing required fields");
        let rendered = state.response_helper.send_password_change_page(
            json_wanted,
            CLOSE_TAB,
            &username,
            ErrorType::InvalidRequest,
            "",
            "",
        );
        return rendered_response(StatusCode::BAD_REQUEST, rendered);
    }

    let auth_result = state.authenticator.authenticate(&params, &[]).await;
    if !auth_result.success {
        warn!(event = "password_change_auth_failed", "authentication failed for password change");
        let rendered = state.response_helper.send_password_change_page(
            json_wanted,
            CLOSE_TAB,
            &username,
            ErrorType::InvalidUsernameOrPassword,
            "",
            "",
        );
        return rendered_response(StatusCode::BAD_REQUEST, rendered);
    }

    match state.authenticator.password_change(&params).await {
        Ok(()) => {
            info!(event = "password_changed", user = %auth_result.user_name, "password changed successfully");
            let rendered = state.response_helper.send_success_confirmation(
                json_wanted,
                CLOSE_TAB,
                "Password changed successfully.",
            );
            rendered_response(StatusCode::OK, rendered)
        }
        Err(err) => {
            warn!(event = "password_change_failed", user = %auth_result.user_name, error = %err.0, "password change failed");
            let rendered = state.response_helper.send_password_change_page(
                json_wanted,
                CLOSE_TAB,
                &auth_result.user_name,
                ErrorType::InternalError,
                &err.0,
                "",
            );
            rendered_response(StatusCode::BAD_REQUEST, rendered)
        }
    }
}
