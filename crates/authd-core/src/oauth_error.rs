use thiserror::Error;

/// The nine standard OAuth 2.0 error codes this service can emit, rendered
/// either as a redirect query string (authorize flow) or a JSON body (token
/// flow). Carrying the human-readable message alongside the code lets both
/// renderings share one type.
#[derive(Debug, Clone, Error)]
pub enum OAuthError {
    #[error("{0}")]
    InvalidRequest(String),
    #[error("{0}")]
    InvalidClient(String),
    #[error("{0}")]
    InvalidGrant(String),
    #[error("{0}")]
    UnauthorizedClient(String),
    #[error("{0}")]
    UnsupportedGrantType(String),
    #[error("{0}")]
    UnsupportedResponseType(String),
    #[error("{0}")]
    InvalidScope(String),
    #[error("{0}")]
    AccessDenied(String),
    #[error("{0}")]
    ServerError(String),
}

impl OAuthError {
    pub fn code(&self) -> &'static str {
        match self {
            OAuthError::InvalidRequest(_) => "invalid_request",
            OAuthError::InvalidClient(_) => "invalid_client",
            OAuthError::InvalidGrant(_) => "invalid_grant",
            OAuthError::UnauthorizedClient(_) => "unauthorized_client",
            OAuthError::UnsupportedGrantType(_) => "unsupported_grant_type",
            OAuthError::UnsupportedResponseType(_) => "unsupported_response_type",
            OAuthError::InvalidScope(_) => "invalid_scope",
            OAuthError::AccessDenied(_) => "access_denied",
            OAuthError::ServerError(_) => "server_error",
        }
    }

    pub fn description(&self) -> &str {
        match self {
            OAuthError::InvalidRequest(msg)
            | OAuthError::InvalidClient(msg)
            | OAuthError::InvalidGrant(msg)
            | OAuthError::UnauthorizedClient(msg)
            | OAuthError::UnsupportedGrantType(msg)
            | OAuthError::UnsupportedResponseType(msg)
            | OAuthError::InvalidScope(msg)
            | OAuthError::AccessDenied(msg)
            | OAuthError::ServerError(msg) => msg,
        }
    }

    pub fn server_error(msg: impl Into<String>) -> Self {
        OAuthError::ServerError(msg.into())
    }

    /// Query-string fragment for the authorize flow's redirect, e.g.
    /// `error=invalid_scope&error_description=...&state=...`.
    pub fn as_query(&self, state: Option<&str>) -> String {
        let mut query = format!(
            "error={}&error_description={}",
            self.code(),
            urlencoding_minimal(self.description())
        );
        if let Some(state) = state {
            query.push_str("&state=");
            query.push_str(&urlencoding_minimal(state));
        }
        query
    }

    /// JSON body for the token flow's 400 response.
    pub fn as_document(&self) -> serde_json::Value {
        serde_json::json!({
            "error": self.code(),
            "error_description": self.description(),
        })
    }
}

/// `percent-encoding`-free escaping sufficient for the small alphabet of
/// messages and state strings this service ever redirects with. Spaces and
/// the handful of reserved characters that show up in error text are covered;
/// anything else passes through unescaped.
pub fn urlencoding_minimal(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            b' ' => out.push_str("%20"),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
