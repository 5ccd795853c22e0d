use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Json, Redirect, Response};

use authd_core::oauth_error::urlencoding_minimal;
use authd_core::OAuthError;
use authd_templates::Rendered;

pub fn accepts_json(headers: &HeaderMap) -> bool {
    headers
        .get(axum::http::header::ACCEPT)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.contains("application/json"))
        .unwrap_or(false)
}

pub fn rendered_response(status: StatusCode, rendered: Rendered) -> Response {
    match rendered {
        Rendered::Html(html) => (status, Html(html)).into_response(),
        Rendered::Json(document) => (status, Json(document)).into_response(),
    }
}

pub fn oauth_bad_request(err: OAuthError) -> Response {
    (StatusCode::BAD_REQUEST, Json(err.as_document())).into_response()
}

pub fn redirect_with_error(redirect_uri: &str, err: &OAuthError, state_param: Option<&str>) -> Response {
    let location = format!("{redirect_uri}?{}", err.as_query(state_param));
    Redirect::to(&location).into_response()
}

pub fn success_redirect(redirect_uri: &str, code: &str, state_param: Option<&str>) -> String {
    let mut uri = format!("{redirect_uri}?code={code}");
    if let Some(state) = state_param {
        uri.push_str("&state=");
        uri.push_str(&urlencoding_minimal(state));
    }
    uri
}

pub fn cancel_uri(redirect_uri: &str, state_param: Option<&str>) -> String {
    let mut uri = format!("{redirect_uri}?error=access_denied&error_description=Cancel%20requested");
    if let Some(state) = state_param {
        uri.push_str("&state=");
        uri.push_str(&urlencoding_minimal(state));
    }
    uri
}

pub fn split_scopes(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_uri_includes_state_when_present() {
        let uri = cancel_uri("https://client.example/cb", Some("xyz"));
        assert_eq!(
            uri,
            "https://client.example/cb?error=access_denied&error_description=Cancel%20requested&state=xyz"
        );
    }

    #[test]
    fn success_redirect_omits_state_when_absent() {
        let uri = success_redirect("https://client.example/cb", "abc123", None);
        assert_eq!(uri, "https://client.example/cb?code=abc123");
    }

    #[test]
    fn split_scopes_ignores_extra_whitespace() {
        assert_eq!(split_scopes("  rs:s   rs:t "), vec!["rs:s", "rs:t"]);
    }
}
