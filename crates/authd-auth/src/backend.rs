use async_trait::async_trait;
use authd_core::AuthResult;
use thiserror::Error;

pub type FormData = std::collections::HashMap<String, String>;

/// The external, PAM-equivalent credential check. Implementations never need
/// to know about scopes or groups — `Authenticator` layers that on top.
#[async_trait]
pub trait PasswordBackend: Send + Sync {
    async fn authenticate(&self, user: &str, password: &str) -> AuthResult;
}

#[derive(Debug, Error)]
#[error("{0}")]
pub struct PasswordChangeError(pub String);

/// The external, RPC-equivalent password-change collaborator (the
/// parameter-service bus in production).
#[async_trait]
pub trait PasswordChangeBackend: Send + Sync {
    async fn change_password(
        &self,
        user: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), PasswordChangeError>;
}

/// Looks up the groups a user belongs to. Degrades to an empty list on any
/// backend failure rather than propagating an error — a user with no groups
/// simply fails every scope check.
#[async_trait]
pub trait GroupProvider: Send + Sync {
    async fn get_groups(&self, user: &str) -> Vec<String>;
}
