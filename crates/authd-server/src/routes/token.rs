use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Form, Json};
use serde_json::json;
use tracing::{info, warn};

use authd_core::definitions::{
    FORM_CLIENT_ID, FORM_CODE, FORM_CODE_VERIFIER, FORM_GRANT_TYPE, FORM_PASSWORD,
    FORM_REFRESH_TOKEN, FORM_SCOPE, FORM_USERNAME, GRANT_TYPE_AUTHORIZATION_CODE,
    GRANT_TYPE_PASSWORD, GRANT_TYPE_REFRESH_TOKEN, TOKEN_TYPE_BEARER,
};
use authd_core::{GlobalSettingKey, OAuthError};

use crate::localhost::{is_localhost, PeerAddr};
use crate::state::AppState;
use crate::support::{oauth_bad_request, split_scopes};

pub async fn token(
    State(state): State<Arc<AppState>>,
    PeerAddr(peer_addr): PeerAddr,
    Form(params): Form<HashMap<String, String>>,
) -> Response {
    let localhost = is_localhost(
        state.trust_all_as_localhost,
        peer_addr,
    );

    match params.get(FORM_GRANT_TYPE).map(String::as_str) {
        Some(GRANT_TYPE_AUTHORIZATION_CODE) => authorization_code_grant(&state, &params, localhost).await,
        Some(GRANT_TYPE_REFRESH_TOKEN) => refresh_token_grant(&state, &params, localhost).await,
        Some(GRANT_TYPE_PASSWORD) => password_grant(&state, &params, localhost).await,
        _ => oauth_bad_request(OAuthError::UnsupportedGrantType(
            "grant_type must be authorization_code, refresh_token, or password".into(),
        )),
    }
}

async fn authorization_code_grant(
    state: &AppState,
    params: &HashMap<String, String>,
    localhost: bool,
) -> Response {
    let Some(code) = params.get(FORM_CODE) else {
        return oauth_bad_request(OAuthError::InvalidRequest("Missing code".into()));
    };
    let Some(client_id) = params.get(FORM_CLIENT_ID) else {
        return oauth_bad_request(OAuthError::InvalidRequest("Missing client_id".into()));
    };
    let client = match state.settings.get_client(client_id) {
        Ok(client) => client,
        Err(_) => return oauth_bad_request(OAuthError::InvalidClient("Unknown client".into())),
    };
    if !client.supports_grant(GRANT_TYPE_AUTHORIZATION_CODE) {
        return oauth_bad_request(OAuthError::UnauthorizedClient(
            "Client is not authorized for the authorization_code grant".into(),
        ));
    }

    let code_verifier = params.get(FORM_CODE_VERIFIER).cloned().unwrap_or_default();
    let result = state.token_handler.validate_auth_code(code, &code_verifier);
    if !result.valid || result.expired || &result.client_id != client_id {
        warn!(
            event = "token_grant_rejected",
            client_id = %client_id,
            grant_type = "authorization_code",
            "invalid or expired authorization code"
        );
        return oauth_bad_request(OAuthError::InvalidGrant(
            "Invalid or expired authorization code".into(),
        ));
    }

    let access_lifetime = state.lifetime_setting(GlobalSettingKey::AccessTokenLifetime, 300);
    let access_token = match state.token_handler.generate_access_token(
        access_lifetime,
        client_id,
        &result.scopes,
        &result.user_name,
    ) {
        Ok(token) => token,
        Err(_) => return oauth_bad_request(OAuthError::server_error("Failed to mint access token")),
    };

    info!(
        event = "token_issued",
        user = %result.user_name,
        client_id = %client_id,
        scope = %result.scopes,
        grant_type = "authorization_code",
        "access token issued"
    );

    let mut document = json!({
        "access_token": access_token,
        "token_type": TOKEN_TYPE_BEARER,
        "expires_in": access_lifetime,
    });

    if localhost {
        let refresh_lifetime = state.lifetime_setting(GlobalSettingKey::RefreshTokenLifetime, 3600);
        match state.token_handler.generate_refresh_token(
            refresh_lifetime,
            client_id,
            &result.scopes,
            &result.user_name,
        ) {
            Ok(refresh_token) => document["refresh_token"] = json!(refresh_token),
            Err(_) => {
                return oauth_bad_request(OAuthError::server_error("Failed to mint refresh token"))
            }
        }
    }

    (StatusCode::OK, Json(document)).into_response()
}

async fn refresh_token_grant(
    state: &AppState,
    params: &HashMap<String, String>,
    localhost: bool,
) -> Response {
    if !localhost {
        warn!(
            event = "token_grant_rejected",
            grant_type = "refresh_token",
            "refresh_token grant attempted from a non-localhost client"
        );
        return oauth_bad_request(OAuthError::InvalidGrant(
            "refresh_token grant requires a localhost client".into(),
        ));
    }
    let Some(refresh_token) = params.get(FORM_REFRESH_TOKEN) else {
        return oauth_bad_request(OAuthError::InvalidRequest("Missing refresh_token".into()));
    };
    let result = state.token_handler.validate_refresh_token(refresh_token);
    if !result.valid || result.expired {
        warn!(
            event = "token_grant_rejected",
            grant_type = "refresh_token",
            "invalid or expired refresh token"
        );
        return oauth_bad_request(OAuthError::InvalidGrant(
            "Invalid or expired refresh token".into(),
        ));
    }
    if let Some(requested_scope) = params.get(FORM_SCOPE) {
        if requested_scope != &result.scopes {
            warn!(
                event = "token_scope_mismatch",
                client_id = %result.client_id,
                scope = %requested_scope,
                grant_type = "refresh_token",
                "requested scope does not match the original grant"
            );
            return oauth_bad_request(OAuthError::InvalidScope(
                "scope must match the original grant exactly".into(),
            ));
        }
    }

    let access_lifetime = state.lifetime_setting(GlobalSettingKey::AccessTokenLifetime, 300);
    match state.token_handler.generate_access_token(
        access_lifetime,
        &result.client_id,
        &result.scopes,
        &result.user_name,
    ) {
        Ok(access_token) => {
            info!(
                event = "token_issued",
                user = %result.user_name,
                client_id = %result.client_id,
                scope = %result.scopes,
                grant_type = "refresh_token",
                "access token issued"
            );
            (
                StatusCode::OK,
                Json(json!({
                    "access_token": access_token,
                    "token_type": TOKEN_TYPE_BEARER,
                    "expires_in": access_lifetime,
                })),
            )
                .into_response()
        }
        Err(_) => oauth_bad_request(OAuthError::server_error("Failed to mint access token")),
    }
}

async fn password_grant(state: &AppState, params: &HashMap<String, String>, localhost: bool) -> Response {
    if !localhost {
        return oauth_bad_request(OAuthError::InvalidGrant(
            "password grant requires a localhost client".into(),
        ));
    }
    let Some(client_id) = params.get(FORM_CLIENT_ID) else {
        return oauth_bad_request(OAuthError::InvalidRequest("Missing client_id".into()));
    };
    let client = match state.settings.get_client(client_id) {
        Ok(client) => client,
        Err(_) => return oauth_bad_request(OAuthError::InvalidClient("Unknown client".into())),
    };
    if !client.supports_grant(GRANT_TYPE_PASSWORD) {
        return oauth_bad_request(OAuthError::UnauthorizedClient(
            "Client is not authorized for the password grant".into(),
        ));
    }

    let raw_scope = params.get(FORM_SCOPE).cloned().unwrap_or_default();
    let scopes = split_scopes(&raw_scope);
    let universe = state.settings.get_all_scopes();
    if scopes.is_empty() || scopes.iter().any(|scope| !universe.contains(scope)) {
        return oauth_bad_request(OAuthError::InvalidScope("Unknown scope requested".into()));
    }

    if !params.contains_key(FORM_USERNAME) || !params.contains_key(FORM_PASSWORD) {
        return oauth_bad_request(OAuthError::InvalidRequest(
            "Missing username or password".into(),
        ));
    }

    let auth_result = state.authenticator.authenticate(params, &scopes).await;
    if auth_result.unauthorized {
        warn!(
            event = "token_scope_denied",
            client_id = %client_id,
            scope = %raw_scope,
            grant_type = "password",
            "scope denied for password grant"
        );
        return oauth_bad_request(OAuthError::InvalidScope(
            "Not authorized for the requested scope".into(),
        ));
    }
    if !auth_result.success || state.authenticator.admin_has_no_password().await {
        warn!(
            event = "token_grant_rejected",
            client_id = %client_id,
            grant_type = "password",
            "authentication failed for password grant"
        );
        return oauth_bad_request(OAuthError::InvalidGrant("Authentication failed".into()));
    }
    if auth_result.expired {
        warn!(
            event = "token_password_expired",
            user = %auth_result.user_name,
            client_id = %client_id,
            grant_type = "password",
            "password expired for password grant"
        );
        return oauth_bad_request(OAuthError::InvalidGrant("Password expired".into()));
    }

    let access_lifetime = state.lifetime_setting(GlobalSettingKey::AccessTokenLifetime, 300);
    let refresh_lifetime = state.lifetime_setting(GlobalSettingKey::RefreshTokenLifetime, 3600);
    let access_token = match state.token_handler.generate_access_token(
        access_lifetime,
        client_id,
        &raw_scope,
        &auth_result.user_name,
    ) {
        Ok(token) => token,
        Err(_) => return oauth_bad_request(OAuthError::server_error("Failed to mint access token")),
    };
    let refresh_token = match state.token_handler.generate_refresh_token(
        refresh_lifetime,
        client_id,
        &raw_scope,
        &auth_result.user_name,
    ) {
        Ok(token) => token,
        Err(_) => return oauth_bad_request(OAuthError::server_error("Failed to mint refresh token")),
    };

    info!(
        event = "token_issued",
        user = %auth_result.user_name,
        client_id = %client_id,
        scope = %raw_scope,
        grant_type = "password",
        "access token issued"
    );

    (
        StatusCode::OK,
        Json(json!({
            "access_token": access_token,
            "token_type": TOKEN_TYPE_BEARER,
            "expires_in": access_lifetime,
            "refresh_token": refresh_token,
        })),
    )
        .into_response()
}
