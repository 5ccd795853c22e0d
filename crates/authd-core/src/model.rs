use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// A registered OAuth client, loaded from one file in the clients directory.
///
/// Invariant: if `authorization_code` is in `grant_types`, `redirect_uri` must
/// be non-empty. Enforced at construction time in `authd-config`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthClient {
    pub id: String,
    pub label: String,
    pub redirect_uri: String,
    pub grant_types: HashSet<String>,
}

impl OAuthClient {
    pub fn supports_grant(&self, grant_type: &str) -> bool {
        self.grant_types.contains(grant_type)
    }
}

/// A resource server, loaded from one file in the resource-servers directory.
/// A resource server with no scopes exposes its bare id as a scope; otherwise
/// every scope is namespaced `"{id}:{scope}"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceServer {
    pub id: String,
    pub label: String,
    pub scopes: Vec<String>,
}

impl ResourceServer {
    pub fn scope_names(&self) -> Vec<String> {
        if self.scopes.is_empty() {
            vec![self.id.clone()]
        } else {
            self.scopes
                .iter()
                .map(|scope| format!("{}:{}", self.id, scope))
                .collect()
        }
    }
}

/// The token kinds multiplexed over the same encrypted payload format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    AuthCode,
    AccessToken,
    RefreshToken,
}

impl TokenType {
    pub const fn as_str(self) -> &'static str {
        match self {
            TokenType::AuthCode => "act",
            TokenType::AccessToken => "at",
            TokenType::RefreshToken => "rt",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "act" => Some(TokenType::AuthCode),
            "at" => Some(TokenType::AccessToken),
            "rt" => Some(TokenType::RefreshToken),
            _ => None,
        }
    }
}

/// Outcome of a credential check. `user_name` must be empty on any failure so
/// callers never log a value the caller typed into the password box.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthResult {
    pub success: bool,
    pub expired: bool,
    pub unauthorized: bool,
    pub user_name: String,
}

impl AuthResult {
    pub fn failure() -> Self {
        Self::default()
    }
}

/// Outcome of validating a token against the token handler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    pub valid: bool,
    pub expired: bool,
    pub remaining_time_s: u32,
    pub client_id: String,
    pub scopes: String,
    pub user_name: String,
}

impl ValidationResult {
    pub fn invalid() -> Self {
        Self::default()
    }
}
