//! Stand-ins for the external collaborators the core intentionally doesn't
//! own: the PAM-equivalent password check and the parameter-service
//! password-change RPC. Both are out of scope for this crate; this module
//! exists only so the binary has something to wire up and run against.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use authd_auth::{GroupProvider, PasswordBackend, PasswordChangeBackend, PasswordChangeError};
use authd_core::AuthResult;

const ADMIN_USERNAME: &str = "admin";

/// A single in-memory credential table, seeded with `admin` holding an empty
/// password so a fresh install starts in the "admin has no password yet"
/// state the authorize flow's admin-setup branch expects.
pub struct InMemoryCredentials {
    passwords: RwLock<HashMap<String, String>>,
}

impl InMemoryCredentials {
    pub fn new() -> Self {
        let mut passwords = HashMap::new();
        passwords.insert(ADMIN_USERNAME.to_string(), String::new());
        Self {
            passwords: RwLock::new(passwords),
        }
    }
}

impl Default for InMemoryCredentials {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PasswordBackend for InMemoryCredentials {
    async fn authenticate(&self, user: &str, password: &str) -> AuthResult {
        let passwords = self.passwords.read().unwrap();
        match passwords.get(user) {
            Some(stored) => AuthResult {
                success: stored == password,
                expired: false,
                unauthorized: false,
                user_name: user.to_string(),
            },
            None => AuthResult {
                success: false,
                expired: false,
                unauthorized: false,
                user_name: String::new(),
            },
        }
    }
}

#[async_trait]
impl PasswordChangeBackend for InMemoryCredentials {
    async fn change_password(
        &self,
        user: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), PasswordChangeError> {
        let mut passwords = self.passwords.write().unwrap();
        match passwords.get(user) {
            Some(stored) if stored == old_password => {
                passwords.insert(user.to_string(), new_password.to_string());
                Ok(())
            }
            Some(_) => Err(PasswordChangeError("old password does not match".to_string())),
            None => Err(PasswordChangeError(format!("unknown user: {user}"))),
        }
    }
}

/// Every user belongs to every configured scope's group. A real deployment
/// asks the device's group/role service; with none wired up here, granting
/// everything the store knows about is the only choice that doesn't
/// silently lock every scope out.
pub struct AllowAllGroups {
    groups: Vec<String>,
}

impl AllowAllGroups {
    pub fn from_scopes(scopes: &[String]) -> Self {
        Self {
            groups: scopes.iter().map(|s| s.replace(':', "_")).collect(),
        }
    }
}

#[async_trait]
impl GroupProvider for AllowAllGroups {
    async fn get_groups(&self, _user: &str) -> Vec<String> {
        self.groups.clone()
    }
}
