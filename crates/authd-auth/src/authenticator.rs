use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use authd_core::definitions::{
    FORM_NEW_PASSWORD, FORM_NEW_PASSWORD_LEGACY, FORM_PASSWORD, FORM_USERNAME,
};
use authd_core::AuthResult;

use crate::backend::{FormData, GroupProvider, PasswordBackend, PasswordChangeBackend, PasswordChangeError};
use crate::group::is_authorized_for_scope;

const ADMIN_USERNAME: &str = "admin";

/// Composes a password backend and a password-change backend behind one
/// narrow surface, and layers scope-to-group authorization on top of a
/// successful login.
pub struct Authenticator {
    password_backend: Arc<dyn PasswordBackend>,
    password_change_backend: Arc<dyn PasswordChangeBackend>,
    groups: Arc<dyn GroupProvider>,
    /// Optimistically `true` at boot; once the backend reports that `admin`
    /// with an empty password fails, this is pinned to `false` forever —
    /// passwords cannot be unset, so there is no need to keep asking.
    admin_login_without_password: AtomicBool,
}

impl Authenticator {
    pub fn new(
        password_backend: Arc<dyn PasswordBackend>,
        password_change_backend: Arc<dyn PasswordChangeBackend>,
        groups: Arc<dyn GroupProvider>,
    ) -> Self {
        Self {
            password_backend,
            password_change_backend,
            groups,
            admin_login_without_password: AtomicBool::new(true),
        }
    }

    pub async fn admin_has_no_password(&self) -> bool {
        if !self.admin_login_without_password.load(Ordering::SeqCst) {
            return false;
        }
        let result = self.password_backend.authenticate(ADMIN_USERNAME, "").await;
        self.admin_login_without_password
            .store(result.success, Ordering::SeqCst);
        result.success
    }

    pub fn has_form_auth_data(&self, form: &FormData) -> bool {
        form.contains_key(FORM_USERNAME) && form.contains_key(FORM_PASSWORD)
    }

    pub fn has_form_password_change_data(&self, form: &FormData) -> bool {
        self.has_form_auth_data(form)
            && (form.contains_key(FORM_NEW_PASSWORD) || form.contains_key(FORM_NEW_PASSWORD_LEGACY))
            && !form.get(FORM_USERNAME).map(String::is_empty).unwrap_or(true)
    }

    /// Extracts username/password, asks the password backend, and — only on
    /// success — checks scope authorization. On any failure `user_name` is
    /// cleared so callers never log a value the caller typed into the
    /// password box.
    pub async fn authenticate(&self, form: &FormData, requested_scopes: &[String]) -> AuthResult {
        let user = form.get(FORM_USERNAME).cloned().unwrap_or_default();
        let password = form.get(FORM_PASSWORD).cloned().unwrap_or_default();

        if user.is_empty() {
            return AuthResult::failure();
        }

        let mut result = self.password_backend.authenticate(&user, &password).await;
        if result.success {
            result.user_name = user.clone();
            if !is_authorized_for_scope(self.groups.as_ref(), &user, requested_scopes).await {
                result.unauthorized = true;
            }
        } else {
            result.user_name = String::new();
        }
        result
    }

    pub async fn password_change(&self, form: &FormData) -> Result<(), PasswordChangeError> {
        let user = form.get(FORM_USERNAME).cloned().unwrap_or_default();
        let old_password = form.get(FORM_PASSWORD).cloned().unwrap_or_default();
        let new_password = form
            .get(FORM_NEW_PASSWORD)
            .or_else(|| form.get(FORM_NEW_PASSWORD_LEGACY))
            .cloned()
            .unwrap_or_default();

        self.password_change_backend
            .change_password(&user, &old_password, &new_password)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FakePasswordBackend {
        admin_has_password: bool,
        valid_user: &'static str,
        valid_password: &'static str,
        expired: bool,
    }

    #[async_trait]
    impl PasswordBackend for FakePasswordBackend {
        async fn authenticate(&self, user: &str, password: &str) -> AuthResult {
            if user == ADMIN_USERNAME && password.is_empty() {
                return AuthResult {
                    success: !self.admin_has_password,
                    ..Default::default()
                };
            }
            AuthResult {
                success: user == self.valid_user && password == self.valid_password,
                expired: self.expired,
                unauthorized: false,
                user_name: String::new(),
            }
        }
    }

    struct FakeChangeBackend;
    #[async_trait]
    impl PasswordChangeBackend for FakeChangeBackend {
        async fn change_password(
            &self,
            _user: &str,
            _old: &str,
            _new: &str,
        ) -> Result<(), PasswordChangeError> {
            Ok(())
        }
    }

    struct FakeGroups(Vec<&'static str>);
    #[async_trait]
    impl GroupProvider for FakeGroups {
        async fn get_groups(&self, _user: &str) -> Vec<String> {
            self.0.iter().map(|s| s.to_string()).collect()
        }
    }

    fn authenticator(admin_has_password: bool, expired: bool) -> Authenticator {
        Authenticator::new(
            Arc::new(FakePasswordBackend {
                admin_has_password,
                valid_user: "alice",
                valid_password: "pw",
                expired,
            }),
            Arc::new(FakeChangeBackend),
            Arc::new(FakeGroups(vec!["rs_s"])),
        )
    }

    fn form(pairs: &[(&str, &str)]) -> FormData {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn admin_has_no_password_is_sticky_false() {
        let auth = authenticator(true, false);
        assert!(!auth.admin_has_no_password().await);
        assert!(!auth.admin_has_no_password().await);
    }

    #[tokio::test]
    async fn admin_has_no_password_true_when_backend_agrees() {
        let auth = authenticator(false, false);
        assert!(auth.admin_has_no_password().await);
    }

    #[tokio::test]
    async fn successful_auth_populates_user_name() {
        let auth = authenticator(true, false);
        let result = auth
            .authenticate(&form(&[("username", "alice"), ("password", "pw")]), &["rs:s".to_string()])
            .await;
        assert!(result.success);
        assert!(!result.unauthorized);
        assert_eq!(result.user_name, "alice");
    }

    #[tokio::test]
    async fn unauthorized_scope_keeps_success_but_flags_unauthorized() {
        let auth = authenticator(true, false);
        let result = auth
            .authenticate(
                &form(&[("username", "alice"), ("password", "pw")]),
                &["rs:t".to_string()],
            )
            .await;
        assert!(result.success);
        assert!(result.unauthorized);
    }

    #[tokio::test]
    async fn failed_auth_clears_user_name() {
        let auth = authenticator(true, false);
        let result = auth
            .authenticate(&form(&[("username", "alice"), ("password", "wrong")]), &[])
            .await;
        assert!(!result.success);
        assert_eq!(result.user_name, "");
    }

    #[tokio::test]
    async fn empty_username_short_circuits_without_calling_backend() {
        let auth = authenticator(true, false);
        let result = auth
            .authenticate(&form(&[("username", ""), ("password", "pw")]), &[])
            .await;
        assert!(!result.success);
    }

    #[test]
    fn password_change_data_requires_nonempty_username() {
        let auth = authenticator(true, false);
        let f = form(&[("username", ""), ("password", "pw"), ("new_password", "new")]);
        assert!(!auth.has_form_password_change_data(&f));
    }

    #[test]
    fn password_change_data_accepts_legacy_field_name() {
        let auth = authenticator(true, false);
        let f = form(&[("username", "alice"), ("password", "pw"), ("new-password", "new")]);
        assert!(auth.has_form_password_change_data(&f));
    }
}
