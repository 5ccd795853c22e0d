//! The parameter provider (C9): exposes the four lifetime/silent-mode
//! settings and the two revocation methods to an external parameter-service
//! bus. The bus loop itself is out of scope; this crate only implements the
//! per-call contract it drives.

use std::collections::HashMap;
use std::sync::Arc;

use authd_config::SettingsStore;
use authd_core::GlobalSettingKey;
use authd_token::TokenHandler;

pub const PARAM_AUTH_CODE_LIFETIME: u32 = 6000;
pub const PARAM_ACCESS_TOKEN_LIFETIME: u32 = 6001;
pub const PARAM_REFRESH_TOKEN_LIFETIME: u32 = 6002;
pub const PARAM_SILENT_MODE_ENABLED: u32 = 6005;

pub const METHOD_REVOKE_ALL_TOKENS: u32 = 6003;
pub const METHOD_REVOKE_TOKEN: u32 = 6004;

#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    U64(u64),
    Bool(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParameterReadStatus {
    Ok(ParameterValue),
    InternalError,
    NotFound,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParameterWriteStatus {
    Ok,
    InvalidValue(String),
    OtherInvalidValueInSet,
    InternalError,
    Untouched,
}

fn key_for_parameter(id: u32) -> Option<GlobalSettingKey> {
    match id {
        PARAM_AUTH_CODE_LIFETIME => Some(GlobalSettingKey::AuthCodeLifetime),
        PARAM_ACCESS_TOKEN_LIFETIME => Some(GlobalSettingKey::AccessTokenLifetime),
        PARAM_REFRESH_TOKEN_LIFETIME => Some(GlobalSettingKey::RefreshTokenLifetime),
        PARAM_SILENT_MODE_ENABLED => Some(GlobalSettingKey::SilentModeEnabled),
        _ => None,
    }
}

/// Bridges the parameter bus to the settings store (C1) and token handler
/// (C2). Every method here must not block the bus loop, so nothing here
/// performs I/O beyond what `SettingsStore`/`TokenHandler` already do
/// under their own short critical sections.
pub struct AuthServiceProvider {
    settings: Arc<SettingsStore>,
    token_handler: Arc<TokenHandler>,
}

impl AuthServiceProvider {
    pub fn new(settings: Arc<SettingsStore>, token_handler: Arc<TokenHandler>) -> Self {
        Self {
            settings,
            token_handler,
        }
    }

    /// Reads are isolated per parameter id: a parse failure on one id
    /// produces `InternalError` for that slot only, the rest of the batch is
    /// unaffected.
    pub fn get_parameter_values(&self, ids: &[u32]) -> Vec<(u32, ParameterReadStatus)> {
        ids.iter()
            .map(|&id| {
                let status = match key_for_parameter(id) {
                    None => ParameterReadStatus::NotFound,
                    Some(key @ GlobalSettingKey::SilentModeEnabled) => {
                        match self.settings.get_global_setting(key).parse::<bool>() {
                            Ok(value) => ParameterReadStatus::Ok(ParameterValue::Bool(value)),
                            Err(_) => ParameterReadStatus::InternalError,
                        }
                    }
                    Some(key) => match self.settings.get_global_setting(key).parse::<u64>() {
                        Ok(value) => ParameterReadStatus::Ok(ParameterValue::U64(value)),
                        Err(_) => ParameterReadStatus::InternalError,
                    },
                };
                (id, status)
            })
            .collect()
    }

    /// Writes the whole batch through one `set_global_config` call, then
    /// classifies each requested id's outcome individually: a key the store
    /// flagged gets its message; every other key in a failed batch gets
    /// `OtherInvalidValueInSet`; ids not recognized as settings are
    /// `Untouched`.
    pub fn set_parameter_values(&self, values: &[(u32, String)]) -> Vec<(u32, ParameterWriteStatus)> {
        let mut requested: HashMap<u32, GlobalSettingKey> = HashMap::new();
        let mut new_values = HashMap::new();
        for (id, value) in values {
            if let Some(key) = key_for_parameter(*id) {
                requested.insert(*id, key);
                new_values.insert(key, value.clone());
            }
        }

        if new_values.is_empty() {
            return values
                .iter()
                .map(|(id, _)| (*id, ParameterWriteStatus::Untouched))
                .collect();
        }

        match self.settings.set_global_config(new_values) {
            Ok(()) => values
                .iter()
                .map(|(id, _)| {
                    let status = if requested.contains_key(id) {
                        ParameterWriteStatus::Ok
                    } else {
                        ParameterWriteStatus::Untouched
                    };
                    (*id, status)
                })
                .collect(),
            Err(errors) if errors.is_empty() => values
                .iter()
                .map(|(id, _)| {
                    let status = if requested.contains_key(id) {
                        ParameterWriteStatus::InternalError
                    } else {
                        ParameterWriteStatus::Untouched
                    };
                    (*id, status)
                })
                .collect(),
            Err(errors) => values
                .iter()
                .map(|(id, _)| {
                    let status = match requested.get(id) {
                        None => ParameterWriteStatus::Untouched,
                        Some(key) => match errors.get(key) {
                            Some(message) => ParameterWriteStatus::InvalidValue(message.clone()),
                            None => ParameterWriteStatus::OtherInvalidValueInSet,
                        },
                    };
                    (*id, status)
                })
                .collect(),
        }
    }

    pub fn invoke_method(&self, method_id: u32, string_arg: Option<&str>) {
        match method_id {
            METHOD_REVOKE_ALL_TOKENS => self.token_handler.revoke_all_tokens(),
            METHOD_REVOKE_TOKEN => {
                if let Some(token) = string_arg {
                    self.token_handler.revoke_token(token);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use authd_config::StorePaths;
    use authd_token::KeyRotationPolicy;

    struct FixedPolicy;
    impl KeyRotationPolicy for FixedPolicy {
        fn refresh_token_lifetime_s(&self) -> u32 {
            3600
        }
    }

    fn provider() -> (tempfile::TempDir, AuthServiceProvider) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("clients")).unwrap();
        std::fs::create_dir_all(dir.path().join("resource_servers")).unwrap();
        std::fs::write(
            dir.path().join("authd.conf"),
            "auth_code_lifetime = 60\naccess_token_lifetime = 300\nrefresh_token_lifetime = 3600\nsilent_mode_enabled = false\n",
        )
        .unwrap();
        let settings = Arc::new(SettingsStore::load(StorePaths::new(dir.path())).unwrap());
        let token_handler = Arc::new(TokenHandler::new(Box::new(FixedPolicy)));
        (dir, AuthServiceProvider::new(settings, token_handler))
    }

    #[test]
    fn reads_known_parameters() {
        let (_dir, provider) = provider();
        let results = provider.get_parameter_values(&[PARAM_AUTH_CODE_LIFETIME, PARAM_SILENT_MODE_ENABLED]);
        assert_eq!(results[0], (PARAM_AUTH_CODE_LIFETIME, ParameterReadStatus::Ok(ParameterValue::U64(60))));
        assert_eq!(
            results[1],
            (PARAM_SILENT_MODE_ENABLED, ParameterReadStatus::Ok(ParameterValue::Bool(false)))
        );
    }

    #[test]
    fn write_failure_isolates_errors_per_parameter() {
        let (_dir, provider) = provider();
        let results = provider.set_parameter_values(&[
            (PARAM_AUTH_CODE_LIFETIME, "200".to_string()),
            (PARAM_REFRESH_TOKEN_LIFETIME, "3600".to_string()),
        ]);
        let auth_status = results
            .iter()
            .find(|(id, _)| *id == PARAM_AUTH_CODE_LIFETIME)
            .unwrap();
        assert!(matches!(auth_status.1, ParameterWriteStatus::InvalidValue(_)));
    }

    #[test]
    fn invoke_revoke_all_tokens_clears_blacklist() {
        let (_dir, provider) = provider();
        let token = provider
            .token_handler
            .generate_access_token(300, "c1", "rs:s", "alice")
            .unwrap();
        provider.invoke_method(METHOD_REVOKE_ALL_TOKENS, None);
        assert!(!provider.token_handler.validate_access_token(&token).valid);
    }
}
