//! Wire-level string constants shared by every component: HTTP paths, form field
//! names, grant/response type literals. Kept in one place so handlers and tests
//! never hardcode a literal that could drift.

pub const DEFAULT_BASE_PATH: &str = "/auth";

pub const PATH_AUTHORIZE: &str = "authorize";
pub const PATH_TOKEN: &str = "token";
pub const PATH_VERIFY: &str = "verify";
pub const PATH_PASSWORD_CHANGE: &str = "password_change";

pub const FORM_CLIENT_ID: &str = "client_id";
pub const FORM_RESPONSE_TYPE: &str = "response_type";
pub const FORM_CODE_CHALLENGE: &str = "code_challenge";
pub const FORM_CODE_CHALLENGE_METHOD: &str = "code_challenge_method";
pub const FORM_CODE_VERIFIER: &str = "code_verifier";
pub const FORM_SCOPE: &str = "scope";
pub const FORM_STATE: &str = "state";
pub const FORM_CODE: &str = "code";
pub const FORM_GRANT_TYPE: &str = "grant_type";
pub const FORM_REFRESH_TOKEN: &str = "refresh_token";
pub const FORM_TOKEN: &str = "token";
pub const FORM_USERNAME: &str = "username";
pub const FORM_PASSWORD: &str = "password";
pub const FORM_NEW_PASSWORD: &str = "new_password";
pub const FORM_NEW_PASSWORD_LEGACY: &str = "new-password";

pub const RESPONSE_TYPE_CODE: &str = "code";
pub const CODE_CHALLENGE_METHOD_S256: &str = "S256";

pub const GRANT_TYPE_AUTHORIZATION_CODE: &str = "authorization_code";
pub const GRANT_TYPE_REFRESH_TOKEN: &str = "refresh_token";
pub const GRANT_TYPE_PASSWORD: &str = "password";

pub const TOKEN_TYPE_BEARER: &str = "Bearer";

pub const CONTENT_TYPE_FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Client ids are attacker-influenced; truncate before they hit a log line.
pub const MAX_CLIENT_ID_LOG_LENGTH: usize = 32;

pub fn truncate_for_log(value: &str) -> String {
    if value.chars().count() <= MAX_CLIENT_ID_LOG_LENGTH {
        value.to_string()
    } else {
        let truncated: String = value.chars().take(MAX_CLIENT_ID_LOG_LENGTH).collect();
        format!("{truncated}[...]")
    }
}
