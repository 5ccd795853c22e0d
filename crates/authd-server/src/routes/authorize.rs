use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use tracing::{info, warn};

use authd_core::definitions::{
    CODE_CHALLENGE_METHOD_S256, FORM_CLIENT_ID, FORM_CODE_CHALLENGE, FORM_CODE_CHALLENGE_METHOD,
    FORM_RESPONSE_TYPE, FORM_SCOPE, FORM_STATE, GRANT_TYPE_AUTHORIZATION_CODE, RESPONSE_TYPE_CODE,
};
use authd_core::{GlobalSettingKey, OAuthError};
use authd_templates::ErrorType;

use crate::state::AppState;
use crate::support::{
    accepts_json, cancel_uri, oauth_bad_request, redirect_with_error, rendered_response,
    split_scopes, success_redirect,
};

pub async fn authorize_get(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    handle_authorize(state, params, true, &headers).await
}

pub async fn authorize_post(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(params): Form<HashMap<String, String>>,
) -> Response {
    handle_authorize(state, params, false, &headers).await
}

async fn handle_authorize(
    state: Arc<AppState>,
    params: HashMap<String, String>,
    is_get: bool,
    headers: &HeaderMap,
) -> Response {
    let json_wanted = accepts_json(headers);
    let state_param = params.get(FORM_STATE).cloned();

    let Some(client_id) = params.get(FORM_CLIENT_ID).cloned() else {
        return oauth_bad_request(OAuthError::InvalidRequest("Missing client_id".into()));
    };

    let client = match state.settings.get_client(&client_id) {
        Ok(client) => client,
        Err(_) => return oauth_bad_request(OAuthError::InvalidClient("Unknown client".into())),
    };

    if !client.supports_grant(GRANT_TYPE_AUTHORIZATION_CODE) {
        return redirect_with_error(
            &client.redirect_uri,
            &OAuthError::UnauthorizedClient(
                "Client is not authorized for the authorization_code grant".into(),
            ),
            state_param.as_deref(),
        );
    }

    if params.get(FORM_RESPONSE_TYPE).map(String::as_str) != Some(RESPONSE_TYPE_CODE) {
        return redirect_with_error(
            &client.redirect_uri,
            &OAuthError::UnsupportedResponseType("Only response_type=code is supported".into()),
            state_param.as_deref(),
        );
    }

    if params.get(FORM_CODE_CHALLENGE_METHOD).map(String::as_str) != Some(CODE_CHALLENGE_METHOD_S256) {
        return redirect_with_error(
            &client.redirect_uri,
            &OAuthError::InvalidRequest("code_challenge_method must be S256".into()),
            state_param.as_deref(),
        );
    }

    let Some(code_challenge) = params.get(FORM_CODE_CHALLENGE).cloned() else {
        return redirect_with_error(
            &client.redirect_uri,
            &OAuthError::InvalidRequest("Missing code_challenge".into()),
            state_param.as_deref(),
        );
    };

    let raw_scope = params.get(FORM_SCOPE).cloned().unwrap_or_default();
    let scopes = split_scopes(&raw_scope);
    if scopes.is_empty() {
        return redirect_with_error(
            &client.redirect_uri,
            &OAuthError::InvalidScope("Missing scope".into()),
            state_param.as_deref(),
        );
    }
    let universe = state.settings.get_all_scopes();
    if scopes.iter().any(|scope| !universe.contains(scope)) {
        return redirect_with_error(
            &client.redirect_uri,
            &OAuthError::InvalidScope("Unknown scope requested".into()),
            state_param.as_deref(),
        );
    }

    let cancel = cancel_uri(&client.redirect_uri, state_param.as_deref());
    let admin_setup = state.authenticator.admin_has_no_password().await;
    let is_password_change_submission =
        !is_get && state.authenticator.has_form_password_change_data(&params);

    if admin_setup && is_get {
        let rendered = state.response_helper.send_password_setup_page(
            json_wanted,
            &cancel,
            ErrorType::NoError,
            "",
        );
        return rendered_response(StatusCode::OK, rendered);
    }

    if is_password_change_submission {
        return handle_password_change_submission(&state, &params, admin_setup, &client.label, &cancel, json_wanted)
            .await;
    }

    if is_get {
        let rendered = state.response_helper.send_login_page(
            json_wanted,
            &cancel,
            &client.label,
            ErrorType::NoError,
            "",
            "",
        );
        return rendered_response(StatusCode::OK, rendered);
    }

    let auth_result = state.authenticator.authenticate(&params, &scopes).await;

    if auth_result.expired {
        warn!(
            event = "auth_password_expired",
            client_id = %client.id,
            scope = %raw_scope,
            grant_type = "authorization_code",
            "password expired for authorization_code grant"
        );
        let rendered = state.response_helper.send_password_change_page(
            json_wanted,
            &cancel,
            &auth_result.user_name,
            ErrorType::NoError,
            "",
            "Your password has expired and must be changed.",
        );
        return rendered_response(StatusCode::OK, rendered);
    }

    if auth_result.unauthorized {
        warn!(
            event = "auth_scope_denied",
            client_id = %client.id,
            scope = %raw_scope,
            grant_type = "authorization_code",
            "scope denied for authorization_code grant"
        );
        return redirect_with_error(
            &client.redirect_uri,
            &OAuthError::AccessDenied("Not authorized for the requested scope".into()),
            state_param.as_deref(),
        );
    }

    if !auth_result.success {
        warn!(
            event = "auth_failed",
            client_id = %client.id,
            scope = %raw_scope,
            grant_type = "authorization_code",
            "authentication failed for authorization_code grant"
        );
        let rendered = state.response_helper.send_login_page(
            json_wanted,
            &cancel,
            &client.label,
            ErrorType::InvalidUsernameOrPassword,
            "",
            "",
        );
        return rendered_response(StatusCode::BAD_REQUEST, rendered);
    }

    let lifetime = state.lifetime_setting(GlobalSettingKey::AuthCodeLifetime, 60);
    match state.token_handler.generate_auth_code(
        lifetime,
        &client.id,
        &raw_scope,
        &auth_result.user_name,
        &code_challenge,
    ) {
        Ok(code) => {
            info!(
                event = "auth_success",
                user = %auth_result.user_name,
                client_id = %client.id,
                scope = %raw_scope,
                grant_type = "authorization_code",
                "authorization code issued"
            );
            Redirect::to(&success_redirect(&client.redirect_uri, &code, state_param.as_deref()))
                .into_response()
        }
        Err(_) => oauth_bad_request(OAuthError::server_error("Failed to mint authorization code")),
    }
}

async fn handle_password_change_submission(
    state: &AppState,
    params: &HashMap<String, String>,
    admin_setup: bool,
    client_label: &str,
    cancel: &str,
    json_wanted: bool,
) -> Response {
    if admin_setup {
        return match state.authenticator.password_change(params).await {
            Ok(()) => {
                info!(event = "admin_password_set", "administrator password set during bootstrap");
                let rendered = state.response_helper.send_login_page(
                    json_wanted,
                    cancel,
                    client_label,
                    ErrorType::NoError,
                    "",
                    "Successfully updated password",
                );
                rendered_response(StatusCode::OK, rendered)
            }
            Err(err) => {
                warn!(event = "admin_password_set_failed", error = %err.0, "failed to set administrator password");
                let rendered = state.response_helper.send_password_setup_page(
                    json_wanted,
                    cancel,
                    ErrorType::InternalError,
                    &err.0,
                );
                rendered_response(StatusCode::BAD_REQUEST, rendered)
            }
        };
    }

    let auth_result = state.authenticator.authenticate(params, &[]).await;
    if !auth_result.success {
        warn!(event = "password_change_auth_failed", "authentication failed for password change");
        let rendered = state.response_helper.send_login_page(
            json_wanted,
            cancel,
            client_label,
            ErrorType::InvalidUsernameOrPassword,
            "",
            "",
        );
        return rendered_response(StatusCode::BAD_REQUEST, rendered);
    }

    match state.authenticator.password_change(params).await {
        Ok(()) => {
            info!(event = "password_changed", user = %auth_result.user_name, "password changed successfully");
            let rendered = state.response_helper.send_login_page(
                json_wanted,
                cancel,
                client_label,
                ErrorType::NoError,
                "",
                "Successfully updated password",
            );
            rendered_response(StatusCode::OK, rendered)
        }
        Err(err) => {
            warn!(event = "password_change_failed", user = %auth_result.user_name, error = %err.0, "password change failed");
            let rendered = state.response_helper.send_password_change_page(
                json_wanted,
                cancel,
                &auth_result.user_name,
                ErrorType::InternalError,
                &err.0,
                "",
            );
            rendered_response(StatusCode::BAD_REQUEST, rendered)
        }
    }
}
